//! # Bytecode
//!
//! The instruction vocabulary the lowering engine emits into, the finished
//! function body format shared by both emission targets, and the small
//! operand-stack interpreter that runs finished bodies.
//!
//! Every instruction operates on an implicit operand stack:
//!
//! ```text
//! LoadArg(0)          [] -> [x]
//! LoadConstF64(1.0)   [x] -> [x, 1.0]
//! Call { plus, 2 }    [x, 1.0] -> [x + 1.0]
//! StoreLocal(0)       [t] -> []
//! ```
//!
//! Labels are symbolic while a body is being built. The builder resolves them
//! to instruction offsets when the body is completed.

pub mod value;
pub mod vm;


use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::repr::{ElementKind, Repr};
use crate::return_contract_violation;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================
// Operands
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalSlot(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportIndex(pub u16);

// ============================================================
// Instructions
// ============================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // Constants
    LoadConstF64(f64),
    LoadConstF32(f32),
    LoadConstI32(i32),
    /// Short form, still pushes an int32
    LoadConstI8(i8),
    LoadConstBool(bool),
    /// Pushes a fresh char row array
    LoadConstStr(String),

    // Storage
    LoadArg(u16),
    StoreArg(u16),
    LoadLocal(LocalSlot),
    StoreLocal(LocalSlot),

    // Calls into host functions
    Call { import: ImportIndex, arity: u16 },

    // Value model
    /// Wraps a scalar of the given kind into a 1x1 array
    BoxScalar(ElementKind),
    /// Deep clone of the value on top of the stack, statically typed as `any`
    CloneValue,
    /// Fails at runtime unless the value on top of the stack has this repr
    CheckedCast(Repr),
    /// Generic element read: pops the subject and `index_count` index arrays
    LoadElement { kind: ElementKind, index_count: u16 },

    // Control flow
    /// Pops any value, pushes a logical scalar
    Truthy,
    Branch(Label),
    BranchIfTrue(Label),
    BranchIfFalse(Label),
    Return,

    // Arithmetic and comparison on scalars
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    CompareEq,
    CompareLt,
    CompareGt,

    // Stack
    Dup,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEffect {
    pub pops: usize,
    pub pushes: usize,
}

impl StackEffect {
    const fn new(pops: usize, pushes: usize) -> Self {
        Self { pops, pushes }
    }
}

impl Instruction {
    pub fn stack_effect(&self) -> StackEffect {
        match self {
            Instruction::LoadConstF64(_)
            | Instruction::LoadConstF32(_)
            | Instruction::LoadConstI32(_)
            | Instruction::LoadConstI8(_)
            | Instruction::LoadConstBool(_)
            | Instruction::LoadConstStr(_)
            | Instruction::LoadArg(_)
            | Instruction::LoadLocal(_) => StackEffect::new(0, 1),

            Instruction::StoreArg(_) | Instruction::StoreLocal(_) => StackEffect::new(1, 0),

            Instruction::Call { arity, .. } => StackEffect::new(*arity as usize, 1),

            Instruction::BoxScalar(_)
            | Instruction::CloneValue
            | Instruction::CheckedCast(_)
            | Instruction::Truthy
            | Instruction::Neg => StackEffect::new(1, 1),

            Instruction::LoadElement { index_count, .. } => {
                StackEffect::new(*index_count as usize + 1, 1)
            }

            Instruction::Branch(_) => StackEffect::new(0, 0),
            Instruction::BranchIfTrue(_) | Instruction::BranchIfFalse(_) => {
                StackEffect::new(1, 0)
            }
            Instruction::Return => StackEffect::new(1, 0),

            Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::CompareEq
            | Instruction::CompareLt
            | Instruction::CompareGt => StackEffect::new(2, 1),

            Instruction::Dup => StackEffect::new(1, 2),
            Instruction::Pop => StackEffect::new(1, 0),
        }
    }

    pub fn branch_target(&self) -> Option<Label> {
        match self {
            Instruction::Branch(label)
            | Instruction::BranchIfTrue(label)
            | Instruction::BranchIfFalse(label) => Some(*label),
            _ => None,
        }
    }

    /// Control never falls through to the next instruction.
    pub fn ends_block(&self) -> bool {
        matches!(self, Instruction::Branch(_) | Instruction::Return)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConstF64(value) => write!(f, "ldc.f64 {}", value),
            Instruction::LoadConstF32(value) => write!(f, "ldc.f32 {}", value),
            Instruction::LoadConstI32(value) => write!(f, "ldc.i32 {}", value),
            Instruction::LoadConstI8(value) => write!(f, "ldc.i32.s {}", value),
            Instruction::LoadConstBool(value) => write!(f, "ldc.bool {}", value),
            Instruction::LoadConstStr(value) => write!(f, "ldstr {:?}", value),
            Instruction::LoadArg(index) => write!(f, "ldarg {}", index),
            Instruction::StoreArg(index) => write!(f, "starg {}", index),
            Instruction::LoadLocal(slot) => write!(f, "ldloc {}", slot.0),
            Instruction::StoreLocal(slot) => write!(f, "stloc {}", slot.0),
            Instruction::Call { import, arity } => write!(f, "call #{}/{}", import.0, arity),
            Instruction::BoxScalar(kind) => write!(f, "box {}", kind),
            Instruction::CloneValue => f.write_str("clone"),
            Instruction::CheckedCast(repr) => write!(f, "castclass {}", repr),
            Instruction::LoadElement { kind, index_count } => {
                write!(f, "ldelem {} /{}", kind, index_count)
            }
            Instruction::Truthy => f.write_str("istrue"),
            Instruction::Branch(label) => write!(f, "br L{}", label.0),
            Instruction::BranchIfTrue(label) => write!(f, "brtrue L{}", label.0),
            Instruction::BranchIfFalse(label) => write!(f, "brfalse L{}", label.0),
            Instruction::Return => f.write_str("ret"),
            Instruction::Add => f.write_str("add"),
            Instruction::Sub => f.write_str("sub"),
            Instruction::Mul => f.write_str("mul"),
            Instruction::Div => f.write_str("div"),
            Instruction::Neg => f.write_str("neg"),
            Instruction::CompareEq => f.write_str("ceq"),
            Instruction::CompareLt => f.write_str("clt"),
            Instruction::CompareGt => f.write_str("cgt"),
            Instruction::Dup => f.write_str("dup"),
            Instruction::Pop => f.write_str("pop"),
        }
    }
}

// ============================================================
// Finished bodies
// ============================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<Repr>,
    pub output: Repr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDecl {
    pub repr: Repr,

    // Only kept by targets with symbolic debug metadata
    pub name: Option<String>,
}

/// A host function the body calls, by the symbol it was registered under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRef {
    pub symbol: String,
    pub inputs: Vec<Repr>,
    pub output: Repr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub signature: FunctionSignature,
    pub locals: Vec<LocalDecl>,
    pub imports: Vec<ImportRef>,
    pub instructions: Vec<Instruction>,

    // Instruction offset for each label, indexed by Label
    pub label_offsets: Vec<usize>,
}

impl FunctionBody {
    pub fn label_offset(&self, label: Label) -> Option<usize> {
        self.label_offsets.get(label.0 as usize).copied()
    }

    pub fn local_name(&self, slot: LocalSlot) -> Option<&str> {
        self.locals
            .get(slot.0 as usize)
            .and_then(|local| local.name.as_deref())
    }

    /// Human readable listing, one instruction per line with label markers.
    pub fn disassemble(&self) -> String {
        let mut out = format!("function {}\n", self.signature.name);
        for (offset, instruction) in self.instructions.iter().enumerate() {
            for (label, _) in self
                .label_offsets
                .iter()
                .enumerate()
                .filter(|(_, target)| **target == offset)
            {
                out.push_str(&format!("L{}:\n", label));
            }
            out.push_str(&format!("  {:04} {}\n", offset, instruction));
        }
        out
    }
}

/// Walks every control flow path and checks that the operand stack never
/// underflows, that paths merging at an instruction agree on its depth,
/// and that `Return` leaves exactly the returned value.
pub fn verify_stack_discipline(body: &FunctionBody) -> Result<(), CompilerError> {
    let count = body.instructions.len();
    let mut depth_at: Vec<Option<usize>> = vec![None; count + 1];
    let mut worklist = vec![(0usize, 0usize)];

    while let Some((offset, depth)) = worklist.pop() {
        if offset > count {
            return_contract_violation!("Branch to offset {} outside of the body", offset);
        }

        match depth_at[offset] {
            Some(seen) if seen == depth => continue,
            Some(seen) => return_contract_violation!(
                "Stack depth mismatch at offset {} ({} vs {}) in '{}'",
                offset,
                seen,
                depth,
                body.signature.name
            ),
            None => depth_at[offset] = Some(depth),
        }

        // Falling off the end is caught at runtime; it is not a stack error
        let Some(instruction) = body.instructions.get(offset) else {
            continue;
        };

        let effect = instruction.stack_effect();
        if effect.pops > depth {
            return_contract_violation!(
                "Stack underflow at offset {} ({}) in '{}'",
                offset,
                instruction,
                body.signature.name
            );
        }

        let after = depth - effect.pops + effect.pushes;

        if let Instruction::Return = instruction {
            if depth != 1 {
                return_contract_violation!(
                    "Return with {} value(s) on the stack in '{}'",
                    depth,
                    body.signature.name
                );
            }
            continue;
        }

        if let Some(label) = instruction.branch_target() {
            let Some(target) = body.label_offset(label) else {
                return_contract_violation!("Branch to unknown label L{}", label.0);
            };
            worklist.push((target, after));
        }

        if !instruction.ends_block() {
            worklist.push((offset + 1, after));
        }
    }

    Ok(())
}
