use crate::backends::builtins::{F64, array_argument, f64_argument, size_argument};
use crate::backends::bytecode::value::{NumArray, Value};
use crate::backends::registry::{BuiltinDef, BuiltinProvider, FunctionDescriptor};
use crate::ir::repr::Repr;
use crate::return_runtime_error;

/// Array construction and inspection.
pub struct ArrayBuiltins;

// Upper bound on elements a constructed array may hold
const MAX_ELEMENTS: usize = 100_000_000;

impl BuiltinProvider for ArrayBuiltins {
    fn provider_name(&self) -> &'static str {
        "arrays"
    }

    fn builtins(&self) -> Vec<BuiltinDef> {
        vec![
            BuiltinDef::Concrete(FunctionDescriptor::new(
                "zeros",
                vec![Repr::Scalar(F64); 2],
                Repr::Array(F64),
                |args| {
                    let rows = size_argument(args, 0, "zeros")?;
                    let cols = size_argument(args, 1, "zeros")?;
                    match rows.checked_mul(cols) {
                        Some(count) if count <= MAX_ELEMENTS => {}
                        _ => return_runtime_error!(
                            "zeros({}, {}) exceeds the limit of {} elements",
                            rows,
                            cols,
                            MAX_ELEMENTS
                        ),
                    }
                    Ok(Value::array(NumArray::zeros(F64, rows, cols)))
                },
            )),
            // a:b as a row vector, empty when b < a
            BuiltinDef::Concrete(FunctionDescriptor::new(
                "colon",
                vec![Repr::Scalar(F64); 2],
                Repr::Array(F64),
                |args| {
                    let start = f64_argument(args, 0, "colon")?;
                    let stop = f64_argument(args, 1, "colon")?;
                    let count = (stop - start).floor() + 1.0;
                    let count = if count.is_finite() && count > 0.0 {
                        count.min(MAX_ELEMENTS as f64) as usize
                    } else {
                        0
                    };
                    let values: Vec<f64> = (0..count).map(|step| start + step as f64).collect();
                    Ok(Value::array(NumArray::row(F64, &values)))
                },
            )),
            BuiltinDef::Concrete(FunctionDescriptor::new(
                "numel",
                vec![Repr::Any],
                Repr::Scalar(F64),
                |args| {
                    let array = array_argument(args, 0, "numel")?;
                    Ok(Value::from(array.borrow().len() as f64))
                },
            )),
        ]
    }
}
