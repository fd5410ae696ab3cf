use crate::backends::builtins::{F64, f64_argument, scalar_argument};
use crate::backends::bytecode::value::{Scalar, Value};
use crate::backends::registry::{BuiltinDef, BuiltinProvider, FunctionDescriptor};
use crate::ir::repr::{ElementKind, Repr};

/// Scalar double arithmetic and comparisons.
pub struct ArithmeticBuiltins;

fn binary(name: &'static str, op: fn(f64, f64) -> f64) -> BuiltinDef {
    BuiltinDef::Concrete(FunctionDescriptor::new(
        name,
        vec![Repr::Scalar(F64); 2],
        Repr::Scalar(F64),
        move |args| {
            let left = f64_argument(args, 0, name)?;
            let right = f64_argument(args, 1, name)?;
            Ok(Value::from(op(left, right)))
        },
    ))
}

fn comparison(name: &'static str, op: fn(f64, f64) -> bool) -> BuiltinDef {
    BuiltinDef::Concrete(FunctionDescriptor::new(
        name,
        vec![Repr::Scalar(F64); 2],
        Repr::Scalar(ElementKind::Logical),
        move |args| {
            let left = f64_argument(args, 0, name)?;
            let right = f64_argument(args, 1, name)?;
            Ok(Value::Scalar(Scalar::Logical(op(left, right))))
        },
    ))
}

impl BuiltinProvider for ArithmeticBuiltins {
    fn provider_name(&self) -> &'static str {
        "arithmetic"
    }

    fn builtins(&self) -> Vec<BuiltinDef> {
        vec![
            binary("plus", |a, b| a + b),
            binary("minus", |a, b| a - b),
            binary("times", |a, b| a * b),
            binary("rdivide", |a, b| a / b),
            BuiltinDef::Concrete(FunctionDescriptor::new(
                "uminus",
                vec![Repr::Scalar(F64)],
                Repr::Scalar(F64),
                |args| Ok(Value::from(-f64_argument(args, 0, "uminus")?)),
            )),
            comparison("lt", |a, b| a < b),
            comparison("gt", |a, b| a > b),
            comparison("le", |a, b| a <= b),
            comparison("ge", |a, b| a >= b),
            comparison("eq", |a, b| a == b),
            comparison("ne", |a, b| a != b),
            BuiltinDef::Concrete(FunctionDescriptor::new(
                "not",
                vec![Repr::Scalar(ElementKind::Logical)],
                Repr::Scalar(ElementKind::Logical),
                |args| {
                    let operand = scalar_argument(args, 0, "not")?;
                    Ok(Value::Scalar(Scalar::Logical(!operand.is_nonzero())))
                },
            )),
        ]
    }
}
