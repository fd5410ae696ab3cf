use crate::backends::builtins::{array_argument, scalar_argument};
use crate::backends::bytecode::value::{Complex, Scalar, Value};
use crate::backends::registry::{BuiltinDef, BuiltinProvider, GenericBuiltin, Instantiation};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};
use std::sync::Arc;

/// Builtins written once over every numeric element kind.
pub struct GenericBuiltins;

impl BuiltinProvider for GenericBuiltins {
    fn provider_name(&self) -> &'static str {
        "generic"
    }

    fn builtins(&self) -> Vec<BuiltinDef> {
        vec![
            BuiltinDef::Generic(GenericBuiltin {
                name: "abs",
                supports_complex: true,
                instantiate: abs,
            }),
            BuiltinDef::Generic(GenericBuiltin {
                name: "sum",
                supports_complex: true,
                instantiate: sum,
            }),
        ]
    }
}

// Complex magnitudes come back as the matching real kind
fn abs(kind: ElementKind) -> Instantiation {
    let output = kind.real_counterpart().unwrap_or(kind);
    Instantiation {
        inputs: vec![Repr::Scalar(kind)],
        output: Repr::Scalar(output),
        host: Arc::new(move |args: &[Value]| -> Result<Value, CompilerError> {
            let operand = scalar_argument(args, 0, "abs")?;
            let result = if kind.is_complex() {
                Scalar::from_f64(output, operand.to_complex().magnitude())
            } else {
                Scalar::from_f64(kind, operand.to_f64().abs())
            };
            Ok(Value::Scalar(result))
        }),
    }
}

fn sum(kind: ElementKind) -> Instantiation {
    Instantiation {
        inputs: vec![Repr::Array(kind)],
        output: Repr::Scalar(kind),
        host: Arc::new(move |args: &[Value]| -> Result<Value, CompilerError> {
            let array = array_argument(args, 0, "sum")?.borrow();
            let total = array
                .elements()
                .iter()
                .map(Scalar::to_complex)
                .fold(Complex::default(), |total, element| {
                    Complex::new(total.re + element.re, total.im + element.im)
                });
            Ok(Value::Scalar(Scalar::from_complex(kind, total)))
        }),
    }
}
