//! Engine configuration loaded from TOML.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [registry]
//! modules = ["core", "base"]
//!
//! [evaluator]
//! process_end_processors = true
//! reinitialize_failed = false
//! ```
//!
//! Every section and key is optional.

use crate::core::error::{RegistryError, VoreenResult};
use crate::execution::evaluator::EvaluatorOptions;
use crate::registry::{Registry, BUILTIN_MODULES};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter in `env_logger` syntax, e.g. `info` or `voreen::network=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Modules loaded at startup, in order.
    pub modules: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            modules: BUILTIN_MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub process_end_processors: bool,
    pub reinitialize_failed: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        let defaults = EvaluatorOptions::default();
        Self {
            process_end_processors: defaults.process_end_processors,
            reinitialize_failed: defaults.reinitialize_failed,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> VoreenResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> VoreenResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Registry with the configured modules.
    pub fn registry(&self) -> Result<Registry, RegistryError> {
        Registry::from_modules(self.registry.modules.as_slice())
    }

    pub fn evaluator_options(&self) -> EvaluatorOptions {
        EvaluatorOptions::new()
            .with_end_processors(self.evaluator.process_end_processors)
            .with_reinitialize_failed(self.evaluator.reinitialize_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.registry.modules, vec!["core", "base"]);
        assert!(config.evaluator_options().process_end_processors);
    }

    #[test]
    fn test_partial_sections() {
        let config = EngineConfig::from_toml_str(
            r#"
            [registry]
            modules = ["core"]

            [evaluator]
            reinitialize_failed = true
            "#,
        )
        .unwrap();

        let registry = config.registry().unwrap();
        assert!(registry.processors().contains("Passthrough"));
        assert!(!registry.processors().contains("Blur"));
        let options = config.evaluator_options();
        assert!(options.reinitialize_failed);
        assert!(options.process_end_processors);
    }

    #[test]
    fn test_unknown_module_and_bad_toml() {
        let config = EngineConfig::from_toml_str("[registry]\nmodules = [\"python\"]").unwrap();
        assert!(matches!(
            config.registry(),
            Err(RegistryError::UnknownModule(name)) if name == "python"
        ));
        assert!(EngineConfig::from_toml_str("[evaluator]\nreinitialize_failed = 3").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voreen.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap().logging.level, "debug");
    }
}
