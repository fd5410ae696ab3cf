//! # IR Lowering
//!
//! Walks one `IrFunction` and writes its bytecode into an emission target.
//!
//! ## Pass state
//! - `StorageAllocator` maps variables to parameters and locals
//! - `loop_stack` holds the continue and break labels of every enclosing loop
//!
//! Both live only for the duration of a single function. The function table
//! is borrowed shared and never changes during a pass.
//!
//! ## Failure
//! Any error abandons the whole function. The sink is dropped without being
//! completed, so the target never sees a partially lowered body.

pub mod conversion;
pub mod storage;

mod control_flow;
mod statements;


use crate::backends::bytecode::{FunctionSignature, Instruction, Label};
use crate::backends::emit::ephemeral::{CompiledFunction, EphemeralTarget};
use crate::backends::emit::{EmissionTarget, InstructionSink};
use crate::backends::lowering::storage::StorageAllocator;
use crate::backends::registry::FunctionTable;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::ir::ir_nodes::{IrFunction, Statement};
use crate::settings::LoweringConfig;
use crate::{lowering_log, return_contract_violation, return_unimplemented, timer_log};
use rayon::prelude::*;
use std::time::Instant;

/// Lowers a function into `target` and returns the target's handle for it.
pub fn lower_function<T: EmissionTarget>(
    function: &IrFunction,
    table: &FunctionTable,
    target: &mut T,
    config: &LoweringConfig,
) -> Result<T::Handle, CompilerError> {
    let _time = Instant::now();

    let result =
        lower_into(function, table, target, config).map_err(|e| e.with_function(&function.name));

    timer_log!(_time, "Lowered function in: ");
    result
}

fn lower_into<T: EmissionTarget>(
    function: &IrFunction,
    table: &FunctionTable,
    target: &mut T,
    config: &LoweringConfig,
) -> Result<T::Handle, CompilerError> {
    lowering_log!("Lowering ", Green function.name.as_str());

    let signature = signature_of(function)?;
    let mut sink = target.begin_function(signature)?;

    let mut lowerer = FunctionLowerer::new(function, table, config, &mut sink)?;
    lowerer.lower_block(&function.body)?;
    lowerer.emit_epilogue()?;

    target.complete_function(sink)
}

fn signature_of(function: &IrFunction) -> Result<FunctionSignature, CompilerError> {
    let [output] = function.outputs.as_slice() else {
        return_unimplemented!(MultiOutputFunction);
    };

    let Some(output) = function.variable(*output) else {
        return_contract_violation!(
            "Output #{} is not declared in '{}'",
            output.0,
            function.name
        );
    };

    Ok(FunctionSignature {
        name: function.name.clone(),
        inputs: function.input_reprs(),
        output: output.repr,
    })
}

/// Lowers independent functions into ephemeral callables.
/// Results come back in the order of `functions`.
pub fn lower_functions_parallel(
    functions: &[IrFunction],
    table: &FunctionTable,
    config: &LoweringConfig,
) -> Vec<Result<CompiledFunction, CompilerError>> {
    let _time = Instant::now();

    let results = if functions.len() < config.parallel_threshold {
        functions
            .iter()
            .map(|function| lower_ephemeral(function, table, config))
            .collect()
    } else {
        functions
            .par_iter()
            .map(|function| lower_ephemeral(function, table, config))
            .collect()
    };

    timer_log!(_time, "Lowered batch in: ");
    results
}

fn lower_ephemeral(
    function: &IrFunction,
    table: &FunctionTable,
    config: &LoweringConfig,
) -> Result<CompiledFunction, CompilerError> {
    let mut target = EphemeralTarget::new(config);
    lower_function(function, table, &mut target, config)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopLabels {
    pub continue_label: Label,
    pub break_label: Label,
}

pub(crate) struct FunctionLowerer<'a, S: InstructionSink> {
    pub function: &'a IrFunction,
    pub table: &'a FunctionTable,
    pub config: &'a LoweringConfig,
    pub sink: &'a mut S,
    pub storage: StorageAllocator<'a>,

    // Innermost loop last
    pub loop_stack: Vec<LoopLabels>,
}

impl<'a, S: InstructionSink> FunctionLowerer<'a, S> {
    pub fn new(
        function: &'a IrFunction,
        table: &'a FunctionTable,
        config: &'a LoweringConfig,
        sink: &'a mut S,
    ) -> Result<Self, CompilerError> {
        let storage = StorageAllocator::new(function, sink)?;
        Ok(Self {
            function,
            table,
            config,
            sink,
            storage,
            loop_stack: Vec::new(),
        })
    }

    pub fn lower_block(&mut self, statements: &[Statement]) -> Result<(), CompilerError> {
        for statement in statements {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), CompilerError> {
        lowering_log!("  ", statement.kind_name());

        match statement {
            Statement::Literal { target, value } => self.lower_literal(*target, value),
            Statement::Copy { target, source } => self.lower_copy(*target, *source),
            Statement::StaticCall {
                targets,
                function,
                arguments,
            } => self.lower_static_call(targets, function, arguments),
            Statement::IndexedLoad {
                target,
                subject,
                indices,
            } => self.lower_indexed_load(*target, *subject, indices),
            Statement::IndexedStore { .. } => return_unimplemented!(IndexedStore),
            Statement::Conditional {
                condition,
                then_branch,
                else_branch,
            } => self.lower_conditional(*condition, then_branch, else_branch),
            Statement::WhileLoop {
                header,
                condition,
                body,
            } => self.lower_while_loop(header, *condition, body),
            Statement::Jump(kind) => self.lower_jump(*kind),
        }
    }

    /// Returns the output variable's value.
    pub fn emit_epilogue(&mut self) -> Result<(), CompilerError> {
        let output = self.storage.output();
        self.storage.emit_load(self.sink, output)?;
        self.sink.emit(Instruction::Return);
        Ok(())
    }
}
