//! Configuration management for the price recommender

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

/// Locations and runtime options for the persisted model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// ONNX export of the trained price model
    pub model_path: PathBuf,
    /// JSON array of the feature names the model was trained on
    pub features_path: PathBuf,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Value sent to text inputs for columns nobody supplied
    #[serde(default)]
    pub missing_text: String,
}

fn default_onnx_threads() -> usize {
    1
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Interactive session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Log a metrics summary when an interactive session ends
    pub summary_on_exit: bool,
}

impl AppConfig {
    /// Load configuration layered as defaults, then the file at `path` if it
    /// exists, then `PRICER__SECTION__KEY` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("PRICER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                model_path: PathBuf::from("models/airbnb_rf_model.onnx"),
                features_path: PathBuf::from("models/model_features.json"),
                onnx_threads: 1,
                missing_text: String::new(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            session: SessionConfig {
                summary_on_exit: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(
            config.artifacts.model_path,
            PathBuf::from("models/airbnb_rf_model.onnx")
        );
        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.artifacts.missing_text, "");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(dir.path().join("absent.toml")).unwrap();

        assert_eq!(
            config.artifacts.features_path,
            PathBuf::from("models/model_features.json")
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[artifacts]
model_path = "/srv/pricer/model.onnx"
features_path = "/srv/pricer/features.json"
onnx_threads = 2

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.artifacts.model_path, PathBuf::from("/srv/pricer/model.onnx"));
        assert_eq!(config.artifacts.onnx_threads, 2);
        assert!(config.logging.is_json());
        assert!(config.session.summary_on_exit);
    }
}
