//! Value representations.
//!
//! A `Repr` describes how a language level value is physically realised:
//! as an unboxed scalar, as a boxed array of one element kind,
//! or as a dynamically typed value that can hold any array.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================
// Element kinds
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Logical,
    Char,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex32,
    Complex64,
}

impl ElementKind {
    /// Every kind a generic numeric builtin is instantiated for, in registration order.
    /// Float64 is last so it is also the default instantiation.
    pub const NUMERIC: [ElementKind; 10] = [
        ElementKind::Int8,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::Int64,
        ElementKind::UInt8,
        ElementKind::UInt16,
        ElementKind::UInt32,
        ElementKind::UInt64,
        ElementKind::Float32,
        ElementKind::Float64,
    ];

    pub const ALL: [ElementKind; 14] = [
        ElementKind::Logical,
        ElementKind::Char,
        ElementKind::Int8,
        ElementKind::Int16,
        ElementKind::Int32,
        ElementKind::Int64,
        ElementKind::UInt8,
        ElementKind::UInt16,
        ElementKind::UInt32,
        ElementKind::UInt64,
        ElementKind::Float32,
        ElementKind::Float64,
        ElementKind::Complex32,
        ElementKind::Complex64,
    ];

    pub fn is_numeric(&self) -> bool {
        ElementKind::NUMERIC.contains(self)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ElementKind::Int8
                | ElementKind::Int16
                | ElementKind::Int32
                | ElementKind::Int64
                | ElementKind::UInt8
                | ElementKind::UInt16
                | ElementKind::UInt32
                | ElementKind::UInt64
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ElementKind::Complex32 | ElementKind::Complex64)
    }

    pub fn complex_counterpart(&self) -> Option<ElementKind> {
        match self {
            ElementKind::Float32 => Some(ElementKind::Complex32),
            ElementKind::Float64 => Some(ElementKind::Complex64),
            _ => None,
        }
    }

    /// The real kind underneath a complex kind.
    pub fn real_counterpart(&self) -> Option<ElementKind> {
        match self {
            ElementKind::Complex32 => Some(ElementKind::Float32),
            ElementKind::Complex64 => Some(ElementKind::Float64),
            _ => None,
        }
    }

    /// Short lowercase name, used to qualify generic builtin instantiations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Logical => "logical",
            ElementKind::Char => "char",
            ElementKind::Int8 => "int8",
            ElementKind::Int16 => "int16",
            ElementKind::Int32 => "int32",
            ElementKind::Int64 => "int64",
            ElementKind::UInt8 => "uint8",
            ElementKind::UInt16 => "uint16",
            ElementKind::UInt32 => "uint32",
            ElementKind::UInt64 => "uint64",
            ElementKind::Float32 => "single",
            ElementKind::Float64 => "double",
            ElementKind::Complex32 => "complex_single",
            ElementKind::Complex64 => "complex_double",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Representations
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Repr {
    Scalar(ElementKind),
    Array(ElementKind),
    Any,
}

impl Repr {
    /// Arrays and dynamic values live behind a reference at runtime,
    /// so copying one must clone it to keep value semantics.
    pub fn is_reference_carrying(&self) -> bool {
        !matches!(self, Repr::Scalar(_))
    }

    pub fn is_array_or_any(&self) -> bool {
        matches!(self, Repr::Array(_) | Repr::Any)
    }

    pub fn element_kind(&self) -> Option<ElementKind> {
        match self {
            Repr::Scalar(kind) | Repr::Array(kind) => Some(*kind),
            Repr::Any => None,
        }
    }

    /// The boxed array form for the same element kind.
    /// Dynamic values have no element kind and therefore no array form.
    pub fn array_form(&self) -> Option<Repr> {
        self.element_kind().map(Repr::Array)
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repr::Scalar(kind) => write!(f, "{}", kind),
            Repr::Array(kind) => write!(f, "{}[]", kind),
            Repr::Any => f.write_str("any"),
        }
    }
}
