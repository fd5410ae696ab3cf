//! Variable to storage location mapping for one lowering pass.
//!
//! Inputs are parameters and the output gets its local straight away.
//! Every other variable receives a local the first time it is loaded or
//! stored. The table is indexed by `VarId` and thrown away with the pass.

use crate::backends::bytecode::{Instruction, LocalSlot};
use crate::backends::emit::InstructionSink;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::ir_nodes::{IrFunction, VarId, Variable};
use crate::ir::repr::Repr;
use crate::{lowering_log, return_contract_violation, return_emission_error, return_unimplemented};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLocation {
    Parameter(u16),
    Local(LocalSlot),
}

pub struct StorageAllocator<'f> {
    function: &'f IrFunction,

    // Indexed by VarId
    locations: Vec<Option<StorageLocation>>,

    output: VarId,
}

impl<'f> StorageAllocator<'f> {
    /// Binds every input to its parameter and gives the single output a local.
    pub fn new<S: InstructionSink>(function: &'f IrFunction, sink: &mut S) -> Result<Self, CompilerError> {
        let [output] = function.outputs.as_slice() else {
            return_unimplemented!(MultiOutputFunction);
        };

        let mut allocator = Self {
            function,
            locations: vec![None; function.variables.len()],
            output: *output,
        };

        for (position, input) in function.inputs.iter().enumerate() {
            let Ok(index) = u16::try_from(position) else {
                return_emission_error!("'{}' has more than {} inputs", function.name, u16::MAX);
            };
            allocator.bind(*input, StorageLocation::Parameter(index))?;
        }

        allocator.location(*output, sink)?;
        Ok(allocator)
    }

    pub fn output(&self) -> VarId {
        self.output
    }

    pub fn variable(&self, id: VarId) -> Result<&'f Variable, CompilerError> {
        match self.function.variable(id) {
            Some(variable) => Ok(variable),
            None => return_contract_violation!(
                "Variable #{} is not declared in '{}'",
                id.0,
                self.function.name
            ),
        }
    }

    pub fn repr_of(&self, id: VarId) -> Result<Repr, CompilerError> {
        self.variable(id).map(|variable| variable.repr)
    }

    /// The location of a variable, allocating a local on first use.
    pub fn location<S: InstructionSink>(
        &mut self,
        id: VarId,
        sink: &mut S,
    ) -> Result<StorageLocation, CompilerError> {
        let variable = self.variable(id)?;
        if let Some(Some(location)) = self.locations.get(id.index()) {
            return Ok(*location);
        }

        let slot = sink.declare_local(variable.repr)?;
        if sink.supports_debug_names() {
            sink.name_local(slot, &variable.name);
        }

        lowering_log!("Local ", slot.0, " holds ", Green variable.name.as_str());

        let location = StorageLocation::Local(slot);
        self.bind(id, location)?;
        Ok(location)
    }

    /// Loads a variable onto the stack and returns its declared repr.
    pub fn emit_load<S: InstructionSink>(&mut self, sink: &mut S, id: VarId) -> Result<Repr, CompilerError> {
        let instruction = match self.location(id, sink)? {
            StorageLocation::Parameter(index) => Instruction::LoadArg(index),
            StorageLocation::Local(slot) => Instruction::LoadLocal(slot),
        };
        sink.emit(instruction);
        self.repr_of(id)
    }

    pub fn emit_store<S: InstructionSink>(&mut self, sink: &mut S, id: VarId) -> Result<(), CompilerError> {
        let instruction = match self.location(id, sink)? {
            StorageLocation::Parameter(index) => Instruction::StoreArg(index),
            StorageLocation::Local(slot) => Instruction::StoreLocal(slot),
        };
        sink.emit(instruction);
        Ok(())
    }

    fn bind(&mut self, id: VarId, location: StorageLocation) -> Result<(), CompilerError> {
        match self.locations.get_mut(id.index()) {
            Some(slot) => {
                *slot = Some(location);
                Ok(())
            }
            None => return_contract_violation!(
                "Variable #{} is not declared in '{}'",
                id.0,
                self.function.name
            ),
        }
    }
}
