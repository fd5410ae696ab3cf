use crate::ir::repr::Repr;
use saying::say;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// IR shapes the lowering engine recognises but deliberately refuses to lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    MultiTargetCall,
    IndexedStore,
    ReturnJump,
    MultiOutputFunction,
    DynamicIndexedLoad,
}

impl Construct {
    pub fn describe(&self) -> &'static str {
        match self {
            Construct::MultiTargetCall => "static call with other than exactly one target",
            Construct::IndexedStore => "indexed store",
            Construct::ReturnJump => "return used as a jump",
            Construct::MultiOutputFunction => "function with other than exactly one output",
            Construct::DynamicIndexedLoad => "indexed load from a dynamically typed value",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    UnsupportedConversion { source: Repr, target: Repr },
    FunctionNotFound { name: String, arity: usize },
    UnimplementedConstruct(Construct),

    // The IR producer broke one of its own guarantees
    InternalContractViolation,

    Emission,
    Config,
    File,
    Runtime,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::UnsupportedConversion { .. } => "Unsupported Conversion",
        ErrorType::FunctionNotFound { .. } => "Function Not Found",
        ErrorType::UnimplementedConstruct(_) => "Unimplemented Construct",
        ErrorType::InternalContractViolation => "Compiler Bug",
        ErrorType::Emission => "Emission Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::File => "File Error",
        ErrorType::Runtime => "Runtime Error",
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    VariableName,
    PrimarySuggestion,

    // Representation information
    ExpectedRepr,
    FoundRepr,
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub error_type: ErrorType,

    // Name of the IR function whose lowering was abandoned, once known
    pub function: Option<String>,

    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            error_type,
            function: None,
            metadata: HashMap::new(),
        }
    }

    pub fn unsupported_conversion(source: Repr, target: Repr) -> Self {
        let mut error = CompilerError::new(
            format!("No conversion exists from {} to {}", source, target),
            ErrorType::UnsupportedConversion { source, target },
        );
        error.new_metadata_entry(ErrorMetaDataKey::FoundRepr, source.to_string());
        error.new_metadata_entry(ErrorMetaDataKey::ExpectedRepr, target.to_string());
        error
    }

    pub fn function_not_found(name: &str, arity: usize) -> Self {
        CompilerError::new(
            format!("No function '{}' taking {} argument(s) is registered", name, arity),
            ErrorType::FunctionNotFound {
                name: name.to_owned(),
                arity,
            },
        )
    }

    pub fn unimplemented(construct: Construct) -> Self {
        CompilerError::new(
            format!("Lowering of {} is not implemented", construct.describe()),
            ErrorType::UnimplementedConstruct(construct),
        )
    }

    /// Create a contract violation (a bug in whatever built the IR, not the user's fault)
    pub fn contract_violation(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ErrorType::InternalContractViolation)
    }

    pub fn emission_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ErrorType::Emission)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ErrorType::Config)
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        CompilerError::new(
            format!("{}: {}", path.display(), msg.into()),
            ErrorType::File,
        )
    }

    pub fn runtime_error(msg: impl Into<String>) -> Self {
        CompilerError::new(msg, ErrorType::Runtime)
    }

    pub fn with_function(mut self, function: &str) -> Self {
        if self.function.is_none() {
            self.function = Some(function.to_owned());
        }
        self
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn new_metadata_entry(&mut self, key: ErrorMetaDataKey, value: impl Into<String>) {
        self.metadata.insert(key, value.into());
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Some(function) => write!(
                f,
                "{} in '{}': {}",
                error_type_to_str(&self.error_type),
                function,
                self.msg
            ),
            None => write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg),
        }
    }
}

impl std::error::Error for CompilerError {}

pub fn print_formatted_error(error: &CompilerError) {
    let header = error_type_to_str(&error.error_type);
    let function = error.function.as_deref().unwrap_or("<no function>");
    let message = &error.msg;

    say!(Red header, " (", function, ")");
    say!(message);

    if let Some(suggestion) = error.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Bright Black "  help: ", suggestion);
    }
}

/// Returns a new CompilerError for a broken IR producer guarantee.
///
/// Usage:
/// `return_contract_violation!("Copy reprs differ", { VariableName => name })`;
/// `return_contract_violation!("break outside of a loop in {}", function_name)`;
#[macro_export]
macro_rules! return_contract_violation {
    ($msg:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError {
            msg: $msg.into(),
            error_type: $crate::compiler_messages::compiler_errors::ErrorType::InternalContractViolation,
            function: None,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_messages::compiler_errors::ErrorMetaDataKey::$key,
                        ::std::string::String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($($arg:tt)*) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError::contract_violation(
            format!($($arg)*),
        ))
    };
}

/// Returns a new CompilerError for a recognised but unsupported IR shape.
#[macro_export]
macro_rules! return_unimplemented {
    ($construct:ident) => {
        return Err(
            $crate::compiler_messages::compiler_errors::CompilerError::unimplemented(
                $crate::compiler_messages::compiler_errors::Construct::$construct,
            ),
        )
    };
}

#[macro_export]
macro_rules! return_runtime_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError::runtime_error(
            format!($($arg)*),
        ))
    };
}

#[macro_export]
macro_rules! return_emission_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler_messages::compiler_errors::CompilerError::emission_error(
            format!($($arg)*),
        ))
    };
}
