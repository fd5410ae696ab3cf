//! Conditionals, loops and jumps.
//!
//! Conditions are loaded, converted to `any`, and reduced with `Truthy`
//! so arrays follow the language rule: true only when non-empty and free of zeros.
//!
//! ```text
//! if c { A }           if c { A } else { B }        while c { A }
//!
//!   <c> istrue           <c> istrue                 Lcont:
//!   brfalse Lend         brfalse Lelse                <header>
//!   A                    A                            <c> istrue
//! Lend:                  br Lend                      brfalse Lbreak
//!                      Lelse:                         A
//!                        B                            br Lcont
//!                      Lend:                        Lbreak:
//! ```

use crate::backends::bytecode::Instruction;
use crate::backends::emit::InstructionSink;
use crate::backends::lowering::conversion::emit_conversion;
use crate::backends::lowering::{FunctionLowerer, LoopLabels};
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::ir_nodes::{JumpKind, Statement, VarId};
use crate::ir::repr::Repr;
use crate::{return_contract_violation, return_unimplemented};

impl<S: InstructionSink> FunctionLowerer<'_, S> {
    fn emit_condition(&mut self, condition: VarId) -> Result<(), CompilerError> {
        let repr = self.storage.emit_load(self.sink, condition)?;
        emit_conversion(self.sink, repr, Repr::Any)?;
        self.sink.emit(Instruction::Truthy);
        Ok(())
    }

    pub(crate) fn lower_conditional(
        &mut self,
        condition: VarId,
        then_branch: &[Statement],
        else_branch: &[Statement],
    ) -> Result<(), CompilerError> {
        match (then_branch.is_empty(), else_branch.is_empty()) {
            // Conditions are side effect free, so there is nothing to evaluate
            (true, true) => Ok(()),

            (false, true) => {
                let end = self.sink.define_label();
                self.emit_condition(condition)?;
                self.sink.emit(Instruction::BranchIfFalse(end));
                self.lower_block(then_branch)?;
                self.sink.mark_label(end)
            }

            (true, false) => {
                let end = self.sink.define_label();
                self.emit_condition(condition)?;
                self.sink.emit(Instruction::BranchIfTrue(end));
                self.lower_block(else_branch)?;
                self.sink.mark_label(end)
            }

            (false, false) => {
                let else_label = self.sink.define_label();
                let end = self.sink.define_label();
                self.emit_condition(condition)?;
                self.sink.emit(Instruction::BranchIfFalse(else_label));
                self.lower_block(then_branch)?;
                self.sink.emit(Instruction::Branch(end));
                self.sink.mark_label(else_label)?;
                self.lower_block(else_branch)?;
                self.sink.mark_label(end)
            }
        }
    }

    pub(crate) fn lower_while_loop(
        &mut self,
        header: &[Statement],
        condition: VarId,
        body: &[Statement],
    ) -> Result<(), CompilerError> {
        let labels = LoopLabels {
            continue_label: self.sink.define_label(),
            break_label: self.sink.define_label(),
        };

        self.loop_stack.push(labels);
        let result = self.lower_loop_parts(labels, header, condition, body);
        self.loop_stack.pop();
        result?;

        self.sink.mark_label(labels.break_label)
    }

    fn lower_loop_parts(
        &mut self,
        labels: LoopLabels,
        header: &[Statement],
        condition: VarId,
        body: &[Statement],
    ) -> Result<(), CompilerError> {
        self.sink.mark_label(labels.continue_label)?;
        self.lower_block(header)?;
        self.emit_condition(condition)?;
        self.sink.emit(Instruction::BranchIfFalse(labels.break_label));
        self.lower_block(body)?;
        self.sink.emit(Instruction::Branch(labels.continue_label));
        Ok(())
    }

    pub(crate) fn lower_jump(&mut self, kind: JumpKind) -> Result<(), CompilerError> {
        let innermost = self.loop_stack.last().copied();

        let target = match (kind, innermost) {
            (JumpKind::Return, _) => return_unimplemented!(ReturnJump),
            (JumpKind::Break, Some(labels)) => labels.break_label,
            (JumpKind::Continue, Some(labels)) => labels.continue_label,
            (_, None) => return_contract_violation!(
                "{:?} outside of a loop in '{}'",
                kind,
                self.function.name
            ),
        };

        self.sink.emit(Instruction::Branch(target));
        Ok(())
    }
}
