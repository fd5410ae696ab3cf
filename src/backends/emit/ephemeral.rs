use crate::backends::bytecode::value::Value;
use crate::backends::bytecode::vm::Interpreter;
use crate::backends::bytecode::{FunctionBody, FunctionSignature};
use crate::backends::emit::{EmissionTarget, FunctionBuilder};
use crate::backends::registry::HostFn;
use crate::compiler_messages::compiler_errors::CompilerError;
use crate::settings::{DEFAULT_MAX_STEPS, LoweringConfig};
use std::fmt;

/// Produces functions that can be called as soon as they are lowered.
#[derive(Debug, Clone)]
pub struct EphemeralTarget {
    max_steps: u64,
}

impl EphemeralTarget {
    pub fn new(config: &LoweringConfig) -> Self {
        Self {
            max_steps: config.max_steps,
        }
    }
}

impl Default for EphemeralTarget {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

impl EmissionTarget for EphemeralTarget {
    type Sink = FunctionBuilder;
    type Handle = CompiledFunction;

    fn begin_function(&mut self, signature: FunctionSignature) -> Result<FunctionBuilder, CompilerError> {
        Ok(FunctionBuilder::new(signature, false))
    }

    fn complete_function(&mut self, sink: FunctionBuilder) -> Result<CompiledFunction, CompilerError> {
        let (body, hosts) = sink.finish()?;
        Ok(CompiledFunction::new(body, hosts, self.max_steps))
    }
}

/// A finished body with its callees bound.
#[derive(Clone)]
pub struct CompiledFunction {
    body: FunctionBody,
    hosts: Vec<HostFn>,
    max_steps: u64,
}

impl CompiledFunction {
    pub(crate) fn new(body: FunctionBody, hosts: Vec<HostFn>, max_steps: u64) -> Self {
        Self {
            body,
            hosts,
            max_steps,
        }
    }

    pub fn name(&self) -> &str {
        &self.body.signature.name
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.body.signature
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    pub fn invoke(&self, arguments: &[Value]) -> Result<Value, CompilerError> {
        Interpreter::new(&self.body, &self.hosts, self.max_steps)
            .run(arguments)
            .map_err(|e| e.with_function(self.name()))
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("signature", &self.body.signature)
            .field("instructions", &self.body.instructions.len())
            .field("imports", &self.body.imports)
            .finish()
    }
}
