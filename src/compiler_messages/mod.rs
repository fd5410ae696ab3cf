pub mod compiler_dev_logging;
pub mod compiler_errors;
