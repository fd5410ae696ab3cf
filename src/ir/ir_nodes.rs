//! ============================================================
//!                         IR Nodes
//! ============================================================
//! The statically typed IR handed to the backend by the front-end.
//!  - Every variable has a stable `VarId` and a declared `Repr`
//!  - Statements only reference variables, never nested expressions
//!  - Compound statements own their nested statement lists
//!
//! Nothing in here is mutated while a function is being lowered.

use crate::ir::repr::{ElementKind, Repr};

// ============================================================
// Stable IDs
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================
// Variables
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Input,
    Output,
    Local,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VarId,
    pub kind: VarKind,
    pub repr: Repr,
    pub name: String,
}

// ============================================================
// Statements
// ============================================================
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Float64(f64),
    Float32(f32),
    Int32(i32),
    Logical(bool),
    Text(String),
}

impl Literal {
    /// The representation the constant has straight after being loaded.
    pub fn natural_repr(&self) -> Repr {
        match self {
            Literal::Float64(_) => Repr::Scalar(ElementKind::Float64),
            Literal::Float32(_) => Repr::Scalar(ElementKind::Float32),
            Literal::Int32(_) => Repr::Scalar(ElementKind::Int32),
            Literal::Logical(_) => Repr::Scalar(ElementKind::Logical),
            Literal::Text(_) => Repr::Array(ElementKind::Char),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Break,
    Continue,
    Return,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `target = <constant>`
    Literal { target: VarId, value: Literal },

    /// `target = source`
    /// Both sides are declared with the same Repr.
    Copy { target: VarId, source: VarId },

    /// `[targets...] = function(arguments...)`
    StaticCall {
        targets: Vec<VarId>,
        function: String,
        arguments: Vec<VarId>,
    },

    /// `target = subject(indices...)`
    IndexedLoad {
        target: VarId,
        subject: VarId,
        indices: Vec<VarId>,
    },

    /// `subject(indices...) = value`
    IndexedStore {
        subject: VarId,
        indices: Vec<VarId>,
        value: VarId,
    },

    Conditional {
        condition: VarId,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },

    /// The header runs at the loop head on every iteration,
    /// including iterations reached through `continue`.
    /// It is where the front-end recomputes `condition`.
    WhileLoop {
        header: Vec<Statement>,
        condition: VarId,
        body: Vec<Statement>,
    },

    Jump(JumpKind),
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Literal { .. } => "literal",
            Statement::Copy { .. } => "copy",
            Statement::StaticCall { .. } => "static call",
            Statement::IndexedLoad { .. } => "indexed load",
            Statement::IndexedStore { .. } => "indexed store",
            Statement::Conditional { .. } => "conditional",
            Statement::WhileLoop { .. } => "while loop",
            Statement::Jump(_) => "jump",
        }
    }
}

// ============================================================
// Functions
// ============================================================
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    pub name: String,

    // Indexed by VarId
    pub variables: Vec<Variable>,

    pub inputs: Vec<VarId>,
    pub outputs: Vec<VarId>,
    pub body: Vec<Statement>,
}

impl IrFunction {
    pub fn variable(&self, id: VarId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn input_reprs(&self) -> Vec<Repr> {
        self.inputs
            .iter()
            .filter_map(|id| self.variable(*id).map(|var| var.repr))
            .collect()
    }

    pub fn output_reprs(&self) -> Vec<Repr> {
        self.outputs
            .iter()
            .filter_map(|id| self.variable(*id).map(|var| var.repr))
            .collect()
    }
}
