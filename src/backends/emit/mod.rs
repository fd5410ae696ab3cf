//! # Emission Targets
//!
//! The lowering engine writes every function into an `InstructionSink` and
//! never needs to know what happens to the finished body. Two targets exist:
//!
//! - `EphemeralTarget` turns each body straight into an invocable
//!   `CompiledFunction`. Local names are not kept.
//! - `AssemblyBuilder` collects named members for a persisted `Assembly`,
//!   keeps local debug names, and must be sealed once every member is in.
//!
//! A target hands out a sink with `begin_function` and only produces a handle
//! in `complete_function`. A pass that fails drops its sink, so nothing is
//! kept for a function that did not lower completely.

pub mod assembly;
pub mod ephemeral;

#[cfg(test)]
mod tests;

use crate::backends::bytecode::{
    FunctionBody, FunctionSignature, ImportIndex, ImportRef, Instruction, Label, LocalDecl,
    LocalSlot, verify_stack_discipline,
};
use crate::backends::registry::{FunctionDescriptor, HostFn};
use crate::codegen_log;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::Repr;
use crate::return_contract_violation;
use rustc_hash::FxHashMap;

/// Everything the lowering engine needs from a function under construction.
pub trait InstructionSink {
    fn emit(&mut self, instruction: Instruction);

    /// A new label, not yet bound to a position.
    fn define_label(&mut self) -> Label;

    /// Binds the label to the next emitted instruction. Each label is marked exactly once.
    fn mark_label(&mut self, label: Label) -> Result<(), CompilerError>;

    fn declare_local(&mut self, repr: Repr) -> Result<LocalSlot, CompilerError>;
    fn name_local(&mut self, slot: LocalSlot, name: &str);
    fn supports_debug_names(&self) -> bool;

    /// The import slot for a callee, shared by every call to the same symbol.
    fn import_function(&mut self, callee: &FunctionDescriptor) -> Result<ImportIndex, CompilerError>;
}

pub trait EmissionTarget {
    type Sink: InstructionSink;
    type Handle;

    fn begin_function(&mut self, signature: FunctionSignature) -> Result<Self::Sink, CompilerError>;
    fn complete_function(&mut self, sink: Self::Sink) -> Result<Self::Handle, CompilerError>;
}

/// The sink both targets hand out.
pub struct FunctionBuilder {
    signature: FunctionSignature,
    keep_debug_names: bool,

    instructions: Vec<Instruction>,
    locals: Vec<LocalDecl>,

    imports: Vec<ImportRef>,
    hosts: Vec<HostFn>,
    import_slots: FxHashMap<String, ImportIndex>,

    // Instruction offset per label once it is marked
    labels: Vec<Option<usize>>,
}

impl FunctionBuilder {
    pub fn new(signature: FunctionSignature, keep_debug_names: bool) -> Self {
        Self {
            signature,
            keep_debug_names,
            instructions: Vec::new(),
            locals: Vec::new(),
            imports: Vec::new(),
            hosts: Vec::new(),
            import_slots: FxHashMap::default(),
            labels: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Resolves labels and checks the stack discipline of the finished body.
    /// The host functions are returned in import order.
    pub fn finish(self) -> Result<(FunctionBody, Vec<HostFn>), CompilerError> {
        let mut label_offsets = Vec::with_capacity(self.labels.len());
        for (label, offset) in self.labels.iter().enumerate() {
            match offset {
                Some(offset) => label_offsets.push(*offset),
                None => return_contract_violation!(
                    "Label L{} was defined but never marked in '{}'",
                    label,
                    self.signature.name
                ),
            }
        }

        let body = FunctionBody {
            signature: self.signature,
            locals: self.locals,
            imports: self.imports,
            instructions: self.instructions,
            label_offsets,
        };

        verify_stack_discipline(&body)?;

        codegen_log!("Finished ", Green body.signature.name.as_str());
        codegen_log!(body.disassemble());

        Ok((body, self.hosts))
    }
}

impl InstructionSink for FunctionBuilder {
    fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn define_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    fn mark_label(&mut self, label: Label) -> Result<(), CompilerError> {
        let offset = self.instructions.len();
        let Some(slot) = self.labels.get_mut(label.0 as usize) else {
            return_contract_violation!(
                "Label L{} was never defined in '{}'",
                label.0,
                self.signature.name
            );
        };

        if let Some(previous) = slot {
            return_contract_violation!(
                "Label L{} marked twice in '{}' (offsets {} and {})",
                label.0,
                self.signature.name,
                previous,
                offset
            );
        }

        *slot = Some(offset);
        Ok(())
    }

    fn declare_local(&mut self, repr: Repr) -> Result<LocalSlot, CompilerError> {
        let Ok(index) = u16::try_from(self.locals.len()) else {
            return Err(CompilerError::emission_error(format!(
                "'{}' needs more than {} locals",
                self.signature.name,
                u16::MAX
            )));
        };
        self.locals.push(LocalDecl { repr, name: None });
        Ok(LocalSlot(index))
    }

    fn name_local(&mut self, slot: LocalSlot, name: &str) {
        if !self.keep_debug_names {
            return;
        }
        if let Some(local) = self.locals.get_mut(slot.0 as usize) {
            local.name = Some(name.to_owned());
        }
    }

    fn supports_debug_names(&self) -> bool {
        self.keep_debug_names
    }

    fn import_function(&mut self, callee: &FunctionDescriptor) -> Result<ImportIndex, CompilerError> {
        if let Some(index) = self.import_slots.get(&callee.symbol) {
            return Ok(*index);
        }

        let Ok(index) = u16::try_from(self.imports.len()) else {
            return Err(CompilerError::emission_error(format!(
                "'{}' calls more than {} distinct functions",
                self.signature.name,
                u16::MAX
            )));
        };

        let index = ImportIndex(index);
        self.imports.push(callee.import_ref());
        self.hosts.push(callee.host.clone());
        self.import_slots.insert(callee.symbol.clone(), index);
        Ok(index)
    }
}
