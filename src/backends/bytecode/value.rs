//! Runtime values seen by host functions and the interpreter.
//!
//! Scalars are plain copies. Arrays sit behind a shared reference, which is
//! why the lowering engine clones them whenever the language copies a value.

use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};
use crate::return_runtime_error;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn magnitude(&self) -> f64 {
        self.re.hypot(self.im)
    }
}

// ============================================================
// Scalars
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Logical(bool),
    Char(char),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Complex32(Complex),
    Complex64(Complex),
}

impl Scalar {
    pub fn kind(&self) -> ElementKind {
        match self {
            Scalar::Logical(_) => ElementKind::Logical,
            Scalar::Char(_) => ElementKind::Char,
            Scalar::Int8(_) => ElementKind::Int8,
            Scalar::Int16(_) => ElementKind::Int16,
            Scalar::Int32(_) => ElementKind::Int32,
            Scalar::Int64(_) => ElementKind::Int64,
            Scalar::UInt8(_) => ElementKind::UInt8,
            Scalar::UInt16(_) => ElementKind::UInt16,
            Scalar::UInt32(_) => ElementKind::UInt32,
            Scalar::UInt64(_) => ElementKind::UInt64,
            Scalar::Float32(_) => ElementKind::Float32,
            Scalar::Float64(_) => ElementKind::Float64,
            Scalar::Complex32(_) => ElementKind::Complex32,
            Scalar::Complex64(_) => ElementKind::Complex64,
        }
    }

    /// Real part as a double. Characters map to their code point.
    pub fn to_f64(&self) -> f64 {
        match *self {
            Scalar::Logical(value) => f64::from(u8::from(value)),
            Scalar::Char(value) => f64::from(u32::from(value)),
            Scalar::Int8(value) => f64::from(value),
            Scalar::Int16(value) => f64::from(value),
            Scalar::Int32(value) => f64::from(value),
            Scalar::Int64(value) => value as f64,
            Scalar::UInt8(value) => f64::from(value),
            Scalar::UInt16(value) => f64::from(value),
            Scalar::UInt32(value) => f64::from(value),
            Scalar::UInt64(value) => value as f64,
            Scalar::Float32(value) => f64::from(value),
            Scalar::Float64(value) => value,
            Scalar::Complex32(value) | Scalar::Complex64(value) => value.re,
        }
    }

    pub fn to_complex(&self) -> Complex {
        match *self {
            Scalar::Complex32(value) | Scalar::Complex64(value) => value,
            _ => Complex::new(self.to_f64(), 0.0),
        }
    }

    /// Integer kinds round to nearest and saturate, like the source language does.
    pub fn from_f64(kind: ElementKind, value: f64) -> Scalar {
        match kind {
            ElementKind::Logical => Scalar::Logical(value != 0.0),
            ElementKind::Char => {
                Scalar::Char(char::from_u32(value.round() as u32).unwrap_or('\0'))
            }
            ElementKind::Int8 => Scalar::Int8(value.round() as i8),
            ElementKind::Int16 => Scalar::Int16(value.round() as i16),
            ElementKind::Int32 => Scalar::Int32(value.round() as i32),
            ElementKind::Int64 => Scalar::Int64(value.round() as i64),
            ElementKind::UInt8 => Scalar::UInt8(value.round() as u8),
            ElementKind::UInt16 => Scalar::UInt16(value.round() as u16),
            ElementKind::UInt32 => Scalar::UInt32(value.round() as u32),
            ElementKind::UInt64 => Scalar::UInt64(value.round() as u64),
            ElementKind::Float32 => Scalar::Float32(value as f32),
            ElementKind::Float64 => Scalar::Float64(value),
            ElementKind::Complex32 => Scalar::from_complex(kind, Complex::new(value, 0.0)),
            ElementKind::Complex64 => Scalar::Complex64(Complex::new(value, 0.0)),
        }
    }

    pub fn from_complex(kind: ElementKind, value: Complex) -> Scalar {
        match kind {
            ElementKind::Complex32 => Scalar::Complex32(Complex::new(
                f64::from(value.re as f32),
                f64::from(value.im as f32),
            )),
            ElementKind::Complex64 => Scalar::Complex64(value),
            real_kind => Scalar::from_f64(real_kind, value.re),
        }
    }

    pub fn zero(kind: ElementKind) -> Scalar {
        Scalar::from_f64(kind, 0.0)
    }

    pub fn is_nonzero(&self) -> bool {
        match self {
            Scalar::Complex32(value) | Scalar::Complex64(value) => {
                value.re != 0.0 || value.im != 0.0
            }
            _ => self.to_f64() != 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Logical(value) => write!(f, "{}", u8::from(*value)),
            Scalar::Char(value) => write!(f, "{}", value),
            Scalar::Complex32(value) | Scalar::Complex64(value) => {
                write!(f, "{}{:+}i", value.re, value.im)
            }
            _ => write!(f, "{}", self.to_f64()),
        }
    }
}

// ============================================================
// Arrays
// ============================================================

/// A column-major array whose elements all share one element kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NumArray {
    kind: ElementKind,
    shape: Vec<usize>,
    data: Vec<Scalar>,
}

impl NumArray {
    pub fn new(
        kind: ElementKind,
        shape: Vec<usize>,
        data: Vec<Scalar>,
    ) -> Result<Self, CompilerError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return_runtime_error!(
                "Array of shape {:?} cannot hold {} element(s)",
                shape,
                data.len()
            );
        }

        if let Some(stray) = data.iter().find(|element| element.kind() != kind) {
            return_runtime_error!(
                "Element of kind {} stored in an array of kind {}",
                stray.kind(),
                kind
            );
        }

        Ok(Self { kind, shape, data })
    }

    pub fn from_scalar(value: Scalar) -> Self {
        Self {
            kind: value.kind(),
            shape: vec![1, 1],
            data: vec![value],
        }
    }

    /// A 1xN row vector. Every element is converted to `kind`.
    pub fn row(kind: ElementKind, values: &[f64]) -> Self {
        Self {
            kind,
            shape: vec![1, values.len()],
            data: values
                .iter()
                .map(|value| Scalar::from_f64(kind, *value))
                .collect(),
        }
    }

    pub fn zeros(kind: ElementKind, rows: usize, cols: usize) -> Self {
        Self {
            kind,
            shape: vec![rows, cols],
            data: vec![Scalar::zero(kind); rows * cols],
        }
    }

    pub fn from_text(text: &str) -> Self {
        let data: Vec<Scalar> = text.chars().map(Scalar::Char).collect();
        Self {
            kind: ElementKind::Char,
            shape: vec![1, data.len()],
            data,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn elements(&self) -> &[Scalar] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_text(&self) -> String {
        self.data
            .iter()
            .map(|element| match element {
                Scalar::Char(value) => *value,
                other => char::from_u32(other.to_f64() as u32).unwrap_or('\0'),
            })
            .collect()
    }

    /// True when the array is non-empty and no element is zero.
    pub fn is_truthy(&self) -> bool {
        !self.data.is_empty() && self.data.iter().all(Scalar::is_nonzero)
    }

    /// Reads the elements addressed by zero-based subscripts.
    /// A single subscript list indexes linearly, otherwise one list per dimension.
    pub fn select(&self, subscripts: &[Vec<usize>]) -> Result<NumArray, CompilerError> {
        match subscripts {
            [] => Ok(self.clone()),

            [linear] => {
                let mut data = Vec::with_capacity(linear.len());
                for position in linear {
                    match self.data.get(*position) {
                        Some(element) => data.push(*element),
                        None => return_runtime_error!(
                            "Index {} exceeds the {} element(s) of the array",
                            position + 1,
                            self.data.len()
                        ),
                    }
                }

                // Row vectors stay rows, everything else reads out as a column
                let shape = if self.shape.first() == Some(&1) {
                    vec![1, data.len()]
                } else {
                    vec![data.len(), 1]
                };

                NumArray::new(self.kind, shape, data)
            }

            _ => {
                let extents = self.folded_extents(subscripts.len());
                for (dimension, (list, extent)) in subscripts.iter().zip(&extents).enumerate() {
                    if let Some(position) = list.iter().find(|position| **position >= *extent) {
                        return_runtime_error!(
                            "Index {} exceeds dimension {} of size {}",
                            position + 1,
                            dimension + 1,
                            extent
                        );
                    }
                }

                let shape: Vec<usize> = subscripts.iter().map(Vec::len).collect();
                let total: usize = shape.iter().product();
                let mut data = Vec::with_capacity(total);
                let mut counters = vec![0usize; subscripts.len()];

                for _ in 0..total {
                    let mut offset = 0;
                    let mut stride = 1;
                    for (dimension, counter) in counters.iter().enumerate() {
                        offset += subscripts[dimension][*counter] * stride;
                        stride *= extents[dimension];
                    }
                    data.push(self.data[offset]);

                    // Column-major: the first subscript moves fastest
                    for (dimension, counter) in counters.iter_mut().enumerate() {
                        *counter += 1;
                        if *counter < shape[dimension] {
                            break;
                        }
                        *counter = 0;
                    }
                }

                NumArray::new(self.kind, shape, data)
            }
        }
    }

    /// The shape seen through `count` subscripts.
    /// Trailing dimensions fold into the last subscript, missing ones are 1.
    fn folded_extents(&self, count: usize) -> Vec<usize> {
        let mut extents: Vec<usize> = self.shape.iter().copied().take(count).collect();
        if self.shape.len() > count {
            let folded: usize = self.shape[count - 1..].iter().product();
            extents[count - 1] = folded;
        }
        extents.resize(count, 1);
        extents
    }
}

// ============================================================
// Values
// ============================================================
pub type ArrayRef = Rc<RefCell<NumArray>>;

#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    Array(ArrayRef),
}

impl Value {
    pub fn array(array: NumArray) -> Self {
        Value::Array(Rc::new(RefCell::new(array)))
    }

    pub fn text(text: &str) -> Self {
        Value::array(NumArray::from_text(text))
    }

    /// An independent copy. Arrays get fresh storage.
    pub fn deep_clone(&self) -> Self {
        match self {
            Value::Scalar(scalar) => Value::Scalar(*scalar),
            Value::Array(array) => Value::array(array.borrow().clone()),
        }
    }

    pub fn matches_repr(&self, repr: &Repr) -> bool {
        match (self, repr) {
            (Value::Scalar(scalar), Repr::Scalar(kind)) => scalar.kind() == *kind,
            (Value::Array(array), Repr::Array(kind)) => array.borrow().kind() == *kind,
            (Value::Array(_), Repr::Any) => true,
            _ => false,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Scalar(scalar) => Some(*scalar),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(array) => Some(array),
            Value::Scalar(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().map(|scalar| scalar.to_f64())
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Scalar(scalar) => scalar.is_nonzero(),
            Value::Array(array) => array.borrow().is_truthy(),
        }
    }

    pub fn shares_storage_with(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(left), Value::Array(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Value::Scalar(scalar) => format!("{} scalar", scalar.kind()),
            Value::Array(array) => {
                let array = array.borrow();
                format!("{} array of shape {:?}", array.kind(), array.shape())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Scalar(left), Value::Scalar(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => *left.borrow() == *right.borrow(),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(Scalar::Float64(value))
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<NumArray> for Value {
    fn from(value: NumArray) -> Self {
        Value::array(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(scalar) => write!(f, "{}", scalar),
            Value::Array(array) => {
                let array = array.borrow();
                if array.kind() == ElementKind::Char {
                    return write!(f, "'{}'", array.to_text());
                }

                write!(f, "[")?;
                for (i, element) in array.elements().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
        }
    }
}
