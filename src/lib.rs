//! Lowers a statically typed numeric IR into stack bytecode.
//!
//! Functions are lowered one at a time into an emission target. The ephemeral
//! target hands back callables that run straight away, the assembly target
//! collects named members that can be written to disk and bound again later.

pub mod backends;
pub mod compiler_messages;
pub mod ir;
pub mod settings;

pub use backends::bytecode::value::{NumArray, Scalar, Value};
pub use backends::emit::assembly::{Assembly, AssemblyBuilder, LoadedAssembly, MemberHandle};
pub use backends::emit::ephemeral::{CompiledFunction, EphemeralTarget};
pub use backends::emit::{EmissionTarget, InstructionSink};
pub use backends::lowering::{lower_function, lower_functions_parallel};
pub use backends::registry::{BuiltinProvider, FunctionDescriptor, FunctionTable};
pub use compiler_messages::compiler_errors::{CompilerError, Construct, ErrorType};
pub use ir::ir_builder::IrFunctionBuilder;
pub use ir::ir_nodes::{IrFunction, Statement, VarId};
pub use ir::repr::{ElementKind, Repr};
pub use settings::LoweringConfig;
