//! The front-end facing IR: representations, variables and statements.

pub mod ir_builder;
pub mod ir_nodes;
pub mod repr;

#[cfg(test)]
mod tests;
