use crate::backends::bytecode::Instruction;
use crate::backends::emit::InstructionSink;
use crate::backends::lowering::FunctionLowerer;
use crate::backends::lowering::conversion::{emit_conversion, emit_value_copy};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::ir_nodes::{Literal, VarId};
use crate::ir::repr::Repr;
use crate::{lowering_log, return_contract_violation, return_emission_error, return_unimplemented};

impl<S: InstructionSink> FunctionLowerer<'_, S> {
    pub(crate) fn lower_literal(&mut self, target: VarId, value: &Literal) -> Result<(), CompilerError> {
        let instruction = match value {
            Literal::Float64(value) => Instruction::LoadConstF64(*value),
            Literal::Float32(value) => Instruction::LoadConstF32(*value),
            Literal::Int32(value) => match i8::try_from(*value) {
                Ok(narrow) if self.config.narrow_constants => Instruction::LoadConstI8(narrow),
                _ => Instruction::LoadConstI32(*value),
            },
            Literal::Logical(value) => Instruction::LoadConstBool(*value),
            Literal::Text(value) => Instruction::LoadConstStr(value.clone()),
        };
        self.sink.emit(instruction);

        let target_repr = self.storage.repr_of(target)?;
        emit_conversion(self.sink, value.natural_repr(), target_repr)?;
        self.storage.emit_store(self.sink, target)
    }

    pub(crate) fn lower_copy(&mut self, target: VarId, source: VarId) -> Result<(), CompilerError> {
        let source_repr = self.storage.repr_of(source)?;
        let target_variable = self.storage.variable(target)?;

        if source_repr != target_variable.repr {
            return_contract_violation!(
                format!(
                    "Copy into '{}' from a value of a different representation",
                    target_variable.name
                ),
                {
                    VariableName => target_variable.name.as_str(),
                    ExpectedRepr => target_variable.repr.to_string(),
                    FoundRepr => source_repr.to_string(),
                }
            );
        }

        self.storage.emit_load(self.sink, source)?;
        emit_value_copy(self.sink, source_repr, target_variable.repr)?;
        self.storage.emit_store(self.sink, target)
    }

    pub(crate) fn lower_static_call(
        &mut self,
        targets: &[VarId],
        function: &str,
        arguments: &[VarId],
    ) -> Result<(), CompilerError> {
        let [target] = targets else {
            return_unimplemented!(MultiTargetCall);
        };

        let argument_reprs = arguments
            .iter()
            .map(|argument| self.storage.repr_of(*argument))
            .collect::<Result<Vec<Repr>, CompilerError>>()?;

        let table = self.table;
        let callee = table.lookup(function, &argument_reprs)?;

        lowering_log!("  call ", function, " -> ", Green callee.symbol.as_str());

        // Left to right, each converted to the parameter it lands in
        for ((argument, repr), parameter) in arguments.iter().zip(&argument_reprs).zip(&callee.inputs) {
            self.storage.emit_load(self.sink, *argument)?;
            emit_conversion(self.sink, *repr, *parameter)?;
        }

        let Ok(arity) = u16::try_from(arguments.len()) else {
            return_emission_error!("Call to '{}' has too many arguments", function);
        };
        let import = self.sink.import_function(callee)?;
        self.sink.emit(Instruction::Call { import, arity });

        let target_repr = self.storage.repr_of(*target)?;
        emit_conversion(self.sink, callee.output, target_repr)?;
        self.storage.emit_store(self.sink, *target)
    }

    /// `target = subject(indices...)`. With no indices this is a plain copy,
    /// so `y = x()` lowers exactly like `y = x`.
    pub(crate) fn lower_indexed_load(
        &mut self,
        target: VarId,
        subject: VarId,
        indices: &[VarId],
    ) -> Result<(), CompilerError> {
        let subject_repr = self.storage.repr_of(subject)?;
        let target_repr = self.storage.repr_of(target)?;

        if indices.is_empty() {
            self.storage.emit_load(self.sink, subject)?;
            emit_value_copy(self.sink, subject_repr, target_repr)?;
            return self.storage.emit_store(self.sink, target);
        }

        let Some(kind) = subject_repr.element_kind() else {
            return_unimplemented!(DynamicIndexedLoad);
        };
        let array_form = Repr::Array(kind);

        self.storage.emit_load(self.sink, subject)?;
        emit_conversion(self.sink, subject_repr, array_form)?;

        for index in indices {
            let index_repr = self.storage.emit_load(self.sink, *index)?;

            // An `any` index is already an array at runtime
            let index_form = index_repr.array_form().unwrap_or(Repr::Any);
            emit_conversion(self.sink, index_repr, index_form)?;
        }

        let Ok(index_count) = u16::try_from(indices.len()) else {
            return_emission_error!("Indexed load with {} subscripts", indices.len());
        };
        self.sink.emit(Instruction::LoadElement { kind, index_count });

        emit_conversion(self.sink, array_form, target_repr)?;
        self.storage.emit_store(self.sink, target)
    }
}
