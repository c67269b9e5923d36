//! AttriSense configuration.
//!
//! Config file: ~/.config/attrisense/config.toml or /etc/attrisense/config.toml.
//! The provider credential is never stored here; only the name of the
//! environment variable that carries it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Model artifact settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the pipeline JSON artifact
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/attrition_pipeline.json")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

/// Generative-text provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Send contributing employee factors along with the probability
    pub include_context: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 20,
            include_context: true,
        }
    }
}

impl ProviderConfig {
    /// API key from the environment. Unset and blank are both "absent".
    pub fn credential(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Color display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Auto-detect based on terminal capabilities
    #[default]
    Auto,
    /// Force basic ANSI colors
    Basic,
    /// No colors (plain text)
    None,
}

impl std::str::FromStr for ColorMode {
    type Err = anyhow::Error;

    fn from_str(mode: &str) -> Result<Self> {
        match mode.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "basic" | "always" => Ok(ColorMode::Basic),
            "none" | "off" | "never" => Ok(ColorMode::None),
            _ => anyhow::bail!("Invalid color mode: '{}'. Valid values: auto, basic, none", mode),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorMode,
}

/// Main AttriSense configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttriSenseConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl AttriSenseConfig {
    /// ~/.config/attrisense/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("attrisense").join("config.toml"))
    }

    /// /etc/attrisense/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/attrisense/config.toml")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. Explicit path (must exist)
    /// 2. User config
    /// 3. System config
    /// 4. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::from_file(&user_path);
            }
        }

        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Self::from_file(&system_path);
        }

        Ok(Self::default())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AttriSenseConfig::default();
        assert_eq!(
            config.model.artifact_path,
            PathBuf::from("models/attrition_pipeline.json")
        );
        assert!(config.provider.enabled);
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.provider.timeout_secs, 20);
        assert!(config.provider.include_context);
        assert_eq!(config.output.color, ColorMode::Auto);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AttriSenseConfig = toml::from_str(
            r#"
            [provider]
            timeout_secs = 10

            [output]
            color = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.provider.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.output.color, ColorMode::None);
        assert_eq!(
            config.model.artifact_path,
            PathBuf::from("models/attrition_pipeline.json")
        );
    }

    #[test]
    fn test_color_mode_parsing() {
        assert_eq!("auto".parse::<ColorMode>().unwrap(), ColorMode::Auto);
        assert_eq!("BASIC".parse::<ColorMode>().unwrap(), ColorMode::Basic);
        assert_eq!("off".parse::<ColorMode>().unwrap(), ColorMode::None);
        assert!("rainbow".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_credential_from_named_env_var() {
        let mut provider = ProviderConfig {
            api_key_env: "ATTRISENSE_TEST_KEY_PRESENT".to_string(),
            ..ProviderConfig::default()
        };
        std::env::set_var("ATTRISENSE_TEST_KEY_PRESENT", " secret ");
        assert_eq!(provider.credential(), Some("secret".to_string()));

        provider.api_key_env = "ATTRISENSE_TEST_KEY_BLANK".to_string();
        std::env::set_var("ATTRISENSE_TEST_KEY_BLANK", "   ");
        assert_eq!(provider.credential(), None);

        provider.api_key_env = "ATTRISENSE_TEST_KEY_UNSET".to_string();
        assert_eq!(provider.credential(), None);
    }

    #[test]
    fn test_explicit_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AttriSenseConfig::default();
        config.model.artifact_path = PathBuf::from("/srv/models/v2.json");
        config.output.color = ColorMode::Basic;
        fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = AttriSenseConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.model.artifact_path, PathBuf::from("/srv/models/v2.json"));
        assert_eq!(loaded.output.color, ColorMode::Basic);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AttriSenseConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
