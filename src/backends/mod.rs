pub mod builtins;
pub mod bytecode;
pub mod emit;
pub mod lowering;
pub mod registry;
