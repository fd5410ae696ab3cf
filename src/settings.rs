use crate::compiler_messages::compiler_errors::CompilerError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "numlower.toml";
pub const DEFAULT_ASSEMBLY_NAME: &str = "module";

// Enough for any reasonable test program, small enough to stop a runaway loop quickly
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

// Below this many functions a batch is lowered on the calling thread
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

// Bumped whenever the persisted member layout changes
pub const ASSEMBLY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoweringConfig {
    /// Use the short constant form for int32 literals that fit in a byte.
    pub narrow_constants: bool,

    /// Attach variable names to local slots on targets that keep debug metadata.
    pub emit_debug_names: bool,

    /// Instruction budget for a single invocation.
    pub max_steps: u64,

    pub assembly_name: String,
    pub parallel_threshold: usize,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        LoweringConfig {
            narrow_constants: true,
            emit_debug_names: true,
            max_steps: DEFAULT_MAX_STEPS,
            assembly_name: String::from(DEFAULT_ASSEMBLY_NAME),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl LoweringConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, CompilerError> {
        let config: LoweringConfig = toml::from_str(source)
            .map_err(|e| CompilerError::config_error(format!("Invalid lowering config: {}", e)))?;

        if config.max_steps == 0 {
            return Err(CompilerError::config_error("max_steps must be at least 1"));
        }

        if config.assembly_name.trim().is_empty() {
            return Err(CompilerError::config_error("assembly_name cannot be empty"));
        }

        Ok(config)
    }

    /// Reads a config file. A directory is searched for `numlower.toml`.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let file = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let source = std::fs::read_to_string(&file)
            .map_err(|e| CompilerError::file_error(&file, e.to_string()))?;

        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> Result<String, CompilerError> {
        toml::to_string(self)
            .map_err(|e| CompilerError::config_error(format!("Could not write lowering config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler_messages::compiler_errors::ErrorType;

    #[test]
    fn empty_config_uses_defaults() {
        let config = LoweringConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoweringConfig::default());
        assert!(config.narrow_constants);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = LoweringConfig::from_toml_str(
            "narrow_constants = false\nmax_steps = 500\nassembly_name = \"kernels\"",
        )
        .unwrap();

        assert!(!config.narrow_constants);
        assert!(config.emit_debug_names);
        assert_eq!(config.max_steps, 500);
        assert_eq!(config.assembly_name, "kernels");
    }

    #[test]
    fn bad_configs_are_config_errors() {
        for source in ["max_steps = 0", "unknown_key = 1", "max_steps = \"many\""] {
            let error = LoweringConfig::from_toml_str(source).unwrap_err();
            assert_eq!(error.error_type, ErrorType::Config, "{}", source);
        }
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = LoweringConfig {
            parallel_threshold: 16,
            ..LoweringConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(LoweringConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_searches_directories_for_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "emit_debug_names = false").unwrap();

        let config = LoweringConfig::load(dir.path()).unwrap();
        assert!(!config.emit_debug_names);

        let missing = LoweringConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(missing.error_type, ErrorType::File);
    }
}
