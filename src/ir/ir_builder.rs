use crate::ir::ir_nodes::{IrFunction, JumpKind, Literal, Statement, VarId, VarKind, Variable};
use crate::ir::repr::Repr;

/// Assigns stable `VarId`s while the front-end assembles a function.
#[derive(Debug, Clone)]
pub struct IrFunctionBuilder {
    name: String,
    variables: Vec<Variable>,
    inputs: Vec<VarId>,
    outputs: Vec<VarId>,
}

impl IrFunctionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    fn new_variable(&mut self, kind: VarKind, repr: Repr, name: &str) -> VarId {
        let id = VarId(self.variables.len() as u32);
        self.variables.push(Variable {
            id,
            kind,
            repr,
            name: name.to_owned(),
        });
        id
    }

    pub fn input(&mut self, name: &str, repr: Repr) -> VarId {
        let id = self.new_variable(VarKind::Input, repr, name);
        self.inputs.push(id);
        id
    }

    pub fn output(&mut self, name: &str, repr: Repr) -> VarId {
        let id = self.new_variable(VarKind::Output, repr, name);
        self.outputs.push(id);
        id
    }

    pub fn local(&mut self, name: &str, repr: Repr) -> VarId {
        self.new_variable(VarKind::Local, repr, name)
    }

    pub fn finish(self, body: Vec<Statement>) -> IrFunction {
        IrFunction {
            name: self.name,
            variables: self.variables,
            inputs: self.inputs,
            outputs: self.outputs,
            body,
        }
    }
}

// ============================================================
// Statement shorthands
// ============================================================
pub fn literal(target: VarId, value: Literal) -> Statement {
    Statement::Literal { target, value }
}

pub fn copy(target: VarId, source: VarId) -> Statement {
    Statement::Copy { target, source }
}

pub fn call(target: VarId, function: &str, arguments: &[VarId]) -> Statement {
    Statement::StaticCall {
        targets: vec![target],
        function: function.to_owned(),
        arguments: arguments.to_vec(),
    }
}

pub fn index(target: VarId, subject: VarId, indices: &[VarId]) -> Statement {
    Statement::IndexedLoad {
        target,
        subject,
        indices: indices.to_vec(),
    }
}

pub fn if_else(condition: VarId, then_branch: Vec<Statement>, else_branch: Vec<Statement>) -> Statement {
    Statement::Conditional {
        condition,
        then_branch,
        else_branch,
    }
}

pub fn while_loop(header: Vec<Statement>, condition: VarId, body: Vec<Statement>) -> Statement {
    Statement::WhileLoop {
        header,
        condition,
        body,
    }
}

pub fn break_loop() -> Statement {
    Statement::Jump(JumpKind::Break)
}

pub fn continue_loop() -> Statement {
    Statement::Jump(JumpKind::Continue)
}
