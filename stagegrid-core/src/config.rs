use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::grid::MAX_TILES;
use crate::selector::PromotionPolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stage: StageConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Visible-set selection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Maximum number of tiles on the stage (1..=36)
    pub max_visible: usize,
    /// Which active speakers may be promoted
    pub promotion: PromotionPolicy,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            max_visible: MAX_TILES,
            promotion: PromotionPolicy::ConnectedOnly,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum participants per room, local included (0 = unlimited)
    pub max_participants: usize,
    /// Capacity of the roster event channel
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_participants: 0,
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`STAGEGRID_STAGE__MAX_VISIBLE`, etc.)
    /// 2. Config file (if provided and present)
    /// 3. Defaults
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("STAGEGRID")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check settings that deserialize fine but make no sense
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.stage.max_visible == 0 || self.stage.max_visible > MAX_TILES {
            errors.push(format!(
                "stage.max_visible must be between 1 and {MAX_TILES}, got {}",
                self.stage.max_visible
            ));
        }
        if self.session.event_capacity == 0 {
            errors.push("session.event_capacity must be greater than 0".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stage.max_visible, 36);
        assert_eq!(config.stage.promotion, PromotionPolicy::ConnectedOnly);
        assert_eq!(config.session.event_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = Config::default();
        config.stage.max_visible = 40;
        config.session.event_capacity = 0;
        config.logging.format = "xml".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("max_visible"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "stage:\n  max_visible: 9\n  promotion: literal\nlogging:\n  format: json"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.stage.max_visible, 9);
        assert_eq!(config.stage.promotion, PromotionPolicy::Literal);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.session.event_capacity, 256);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/stagegrid.yaml")).unwrap();
        assert_eq!(config.stage.max_visible, 36);
    }
}
