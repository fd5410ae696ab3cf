//! Bridging between value representations.
//!
//! The only conversion that costs an instruction is boxing a scalar into a
//! one element array. Every other legal conversion is a no-op at runtime,
//! because array forms are already acceptable wherever `any` is expected.

use crate::backends::bytecode::Instruction;
use crate::backends::emit::InstructionSink;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,

    // Reference carrying values are accepted by `any` as they are
    AcceptAsAny,

    BoxScalar(ElementKind),
}

pub fn plan_conversion(source: Repr, target: Repr) -> Result<Conversion, CompilerError> {
    if source == target {
        return Ok(Conversion::Identity);
    }

    match (source, target) {
        (_, Repr::Any) if source.is_reference_carrying() => Ok(Conversion::AcceptAsAny),
        (Repr::Scalar(kind), Repr::Any) => Ok(Conversion::BoxScalar(kind)),
        (Repr::Scalar(kind), Repr::Array(target_kind)) if kind == target_kind => {
            Ok(Conversion::BoxScalar(kind))
        }
        _ => Err(CompilerError::unsupported_conversion(source, target)),
    }
}

pub fn emit_conversion<S: InstructionSink>(
    sink: &mut S,
    source: Repr,
    target: Repr,
) -> Result<(), CompilerError> {
    if let Conversion::BoxScalar(kind) = plan_conversion(source, target)? {
        sink.emit(Instruction::BoxScalar(kind));
    }
    Ok(())
}

/// Converts a loaded value that is being copied into a new variable.
///
/// Reference carrying values are deep cloned first. The clone is typed as
/// `any`, so unless the source already was `any` it is cast back to the
/// source repr before the conversion.
pub fn emit_value_copy<S: InstructionSink>(
    sink: &mut S,
    source: Repr,
    target: Repr,
) -> Result<(), CompilerError> {
    if source.is_reference_carrying() {
        sink.emit(Instruction::CloneValue);
        if source != Repr::Any {
            sink.emit(Instruction::CheckedCast(source));
        }
    }

    emit_conversion(sink, source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::bytecode::FunctionSignature;
    use crate::backends::emit::FunctionBuilder;
    use crate::compiler_messages::compiler_errors::ErrorType;
    use proptest::prelude::*;

    fn sink() -> FunctionBuilder {
        FunctionBuilder::new(
            FunctionSignature {
                name: "conversion".to_owned(),
                inputs: Vec::new(),
                output: Repr::Any,
            },
            false,
        )
    }

    fn any_kind() -> impl Strategy<Value = ElementKind> {
        prop::sample::select(ElementKind::ALL.to_vec())
    }

    fn any_repr() -> impl Strategy<Value = Repr> {
        prop_oneof![
            any_kind().prop_map(Repr::Scalar),
            any_kind().prop_map(Repr::Array),
            Just(Repr::Any),
        ]
    }

    proptest! {
        #[test]
        fn converting_to_itself_emits_nothing(repr in any_repr()) {
            let mut sink = sink();
            emit_conversion(&mut sink, repr, repr).unwrap();
            prop_assert!(sink.instructions().is_empty());
            prop_assert_eq!(plan_conversion(repr, repr).unwrap(), Conversion::Identity);
        }

        #[test]
        fn boxed_scalars_need_no_further_conversion(kind in any_kind()) {
            let mut sink = sink();
            emit_conversion(&mut sink, Repr::Scalar(kind), Repr::Array(kind)).unwrap();
            prop_assert_eq!(sink.instructions(), &[Instruction::BoxScalar(kind)][..]);

            // The boxed value is already acceptable as an array or as `any`
            emit_conversion(&mut sink, Repr::Array(kind), Repr::Array(kind)).unwrap();
            emit_conversion(&mut sink, Repr::Array(kind), Repr::Any).unwrap();
            prop_assert_eq!(sink.instructions().len(), 1);
        }

        #[test]
        fn conversions_only_ever_box(source in any_repr(), target in any_repr()) {
            let mut sink = sink();
            match emit_conversion(&mut sink, source, target) {
                Ok(()) => prop_assert!(sink.instructions().len() <= 1),
                Err(error) => prop_assert_eq!(
                    error.error_type,
                    ErrorType::UnsupportedConversion { source, target }
                ),
            }
        }

        #[test]
        fn scalar_copies_never_clone(kind in any_kind(), target in any_repr()) {
            let mut sink = sink();
            if emit_value_copy(&mut sink, Repr::Scalar(kind), target).is_ok() {
                prop_assert!(!sink.instructions().contains(&Instruction::CloneValue));
            }
        }
    }

    #[test]
    fn unsupported_pairs() {
        let double = ElementKind::Float64;
        let int = ElementKind::Int32;
        for (source, target) in [
            (Repr::Any, Repr::Array(double)),
            (Repr::Any, Repr::Scalar(double)),
            (Repr::Array(double), Repr::Scalar(double)),
            (Repr::Scalar(int), Repr::Scalar(double)),
            (Repr::Scalar(int), Repr::Array(double)),
            (Repr::Array(int), Repr::Array(double)),
        ] {
            let error = plan_conversion(source, target).unwrap_err();
            assert_eq!(
                error.error_type,
                ErrorType::UnsupportedConversion { source, target }
            );
        }
    }

    #[test]
    fn array_copies_clone_then_cast() {
        let array = Repr::Array(ElementKind::Float64);

        let mut typed = sink();
        emit_value_copy(&mut typed, array, array).unwrap();
        assert_eq!(
            typed.instructions(),
            &[Instruction::CloneValue, Instruction::CheckedCast(array)]
        );

        // A clone of `any` is already `any`
        let mut dynamic = sink();
        emit_value_copy(&mut dynamic, Repr::Any, Repr::Any).unwrap();
        assert_eq!(dynamic.instructions(), &[Instruction::CloneValue]);
    }
}
