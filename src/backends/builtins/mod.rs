//! Bundled builtin providers.
//!
//! Each provider is a unit struct implementing `BuiltinProvider`, scanned into
//! a `FunctionTable` with `register_provider`.

mod arithmetic;
mod arrays;
mod generic;

pub use arithmetic::ArithmeticBuiltins;
pub use arrays::ArrayBuiltins;
pub use generic::GenericBuiltins;

use crate::backends::bytecode::value::{ArrayRef, Scalar, Value};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::ElementKind;
use crate::return_runtime_error;

pub(crate) const F64: ElementKind = ElementKind::Float64;

pub(crate) fn argument<'a>(
    args: &'a [Value],
    position: usize,
    function: &str,
) -> Result<&'a Value, CompilerError> {
    match args.get(position) {
        Some(value) => Ok(value),
        None => return_runtime_error!(
            "'{}' expects at least {} argument(s), got {}",
            function,
            position + 1,
            args.len()
        ),
    }
}

pub(crate) fn scalar_argument(
    args: &[Value],
    position: usize,
    function: &str,
) -> Result<Scalar, CompilerError> {
    let value = argument(args, position, function)?;
    match value.as_scalar() {
        Some(scalar) => Ok(scalar),
        None => return_runtime_error!(
            "Argument {} of '{}' must be a scalar, got {}",
            position + 1,
            function,
            value.describe()
        ),
    }
}

pub(crate) fn f64_argument(args: &[Value], position: usize, function: &str) -> Result<f64, CompilerError> {
    scalar_argument(args, position, function).map(|scalar| scalar.to_f64())
}

pub(crate) fn array_argument<'a>(
    args: &'a [Value],
    position: usize,
    function: &str,
) -> Result<&'a ArrayRef, CompilerError> {
    let value = argument(args, position, function)?;
    match value.as_array() {
        Some(array) => Ok(array),
        None => return_runtime_error!(
            "Argument {} of '{}' must be an array, got {}",
            position + 1,
            function,
            value.describe()
        ),
    }
}

/// Sizes and counts must be non-negative whole numbers.
pub(crate) fn size_argument(args: &[Value], position: usize, function: &str) -> Result<usize, CompilerError> {
    let raw = f64_argument(args, position, function)?;
    if raw < 0.0 || raw.fract() != 0.0 || !raw.is_finite() {
        return_runtime_error!(
            "Argument {} of '{}' must be a non-negative integer, got {}",
            position + 1,
            function,
            raw
        );
    }
    Ok(raw as usize)
}
