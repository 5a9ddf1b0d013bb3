//! Configuration management for schema preparation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (narrative-schemas.toml)
//! - Environment variables (NARRATIVE_SCHEMAS__*)
//!
//! ## Example config file (narrative-schemas.toml):
//! ```toml
//! [generation]
//! model = "gpt-4o-mini"
//! strict = true
//! system_prompt = "You write consistent story material."
//!
//! [output]
//! format = "pretty"
//!
//! [check]
//! extensions = ["json"]
//! fail_fast = false
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Structured-output request settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Batch check settings
    #[serde(default)]
    pub check: CheckConfig,
}

/// Structured-output request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model requested for generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Ask the API to enforce the schema strictly
    #[serde(default = "default_true")]
    pub strict: bool,

    /// System message prepended to every request
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

impl OutputFormat {
    /// Render a value as JSON text in this format
    pub fn render<T: Serialize>(&self, value: &T) -> serde_json::Result<String> {
        match self {
            OutputFormat::Pretty => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        }
    }
}

/// Batch check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// File extensions treated as schema documents
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Stop at the first unsupported schema
    #[serde(default)]
    pub fail_fast: bool,
}

// Default value functions
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string()]
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            strict: true,
            system_prompt: None,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            fail_fast: false,
        }
    }
}

impl CheckConfig {
    /// Whether a path has one of the configured schema extensions
    pub fn matches(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "narrative-schemas.toml",
            ".narrative-schemas.toml",
            "config/narrative-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "narrative-schemas") {
            let xdg_config = config_dir.config_dir().join("narrative-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (NARRATIVE_SCHEMAS__*)
        builder = builder.add_source(
            Environment::with_prefix("NARRATIVE_SCHEMAS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Message(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert!(config.generation.strict);
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert_eq!(config.check.extensions, vec!["json"]);
    }

    #[test]
    fn test_serialize_config() {
        let config = SchemaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[generation]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("[check]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[generation]\nmodel = \"gpt-4o\"\nstrict = false\n\n[output]\nformat = \"compact\"\n",
        )
        .unwrap();

        let config = SchemaConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.generation.model, "gpt-4o");
        assert!(!config.generation.strict);
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert_eq!(config.check.extensions, vec!["json"]);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = SchemaConfig::default();
        config.generation.system_prompt = Some("Write tersely.".to_string());
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = SchemaConfig::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.generation.system_prompt.as_deref(), Some("Write tersely."));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = SchemaConfig::load_from(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, SchemaError::Config(_)));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("saved.toml");
        let err = SchemaConfig::default().save(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SchemaError::Io(_)));
    }

    #[test]
    fn test_extension_matching() {
        let check = CheckConfig::default();
        assert!(check.matches(std::path::Path::new("schemas/character.json")));
        assert!(!check.matches(std::path::Path::new("schemas/notes.md")));
        assert!(!check.matches(std::path::Path::new("schemas/README")));
    }

    #[test]
    fn test_compact_output() {
        let rendered = OutputFormat::Compact.render(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(rendered, "{\"a\":1}");
    }
}
