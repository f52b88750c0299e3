//! Configuration loading and setting resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Default language tag for narration requests
pub const DEFAULT_LANGUAGE: &str = "fr";

/// Default prebuilt voice name for the synthesis service
pub const DEFAULT_VOICE: &str = "Kore";

/// `[synthesis]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesisSection {
    /// Voice-synthesis service endpoint URL
    pub endpoint: Option<String>,
    /// API key for the synthesis service
    pub api_key: Option<String>,
    /// Prebuilt voice name
    pub voice: Option<String>,
    /// Default language tag for narration requests
    pub language: Option<String>,
}

/// `[audio]` section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioSection {
    /// Output device name (None = system default)
    pub device: Option<String>,
}

/// Parsed TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub synthesis: SynthesisSection,
    #[serde(default)]
    pub audio: AudioSection,
}

impl FileConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load configuration from the platform config file, if one exists.
    ///
    /// Returns defaults when no config file is found.
    pub fn load() -> Result<Self> {
        match find_config_file() {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                tracing::debug!("Loaded config file: {}", path.display());
                Self::from_toml_str(&content)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Locate the configuration file following the platform convention:
/// user config directory first (`~/.config/lectio/config.toml`), then
/// the system-wide path on Linux (`/etc/lectio/config.toml`).
fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("lectio").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/lectio/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve a setting following the priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file value
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    file_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli_arg {
        return Some(value.to_string());
    }

    if let Ok(value) = std::env::var(env_var_name) {
        if !value.is_empty() {
            return Some(value);
        }
    }

    file_value.map(|v| v.to_string())
}

/// Resolve a required setting, failing with a Config error naming the
/// setting when no source provides it.
pub fn resolve_required_setting(
    name: &str,
    cli_arg: Option<&str>,
    env_var_name: &str,
    file_value: Option<&str>,
) -> Result<String> {
    resolve_setting(cli_arg, env_var_name, file_value).ok_or_else(|| {
        Error::Config(format!(
            "Missing required setting '{}' (set via --{}, {}, or the config file)",
            name, name, env_var_name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = FileConfig::from_toml_str(
            r#"
            [synthesis]
            endpoint = "https://tts.example.com/v1/speech"
            api_key = "secret"
            voice = "Kore"
            language = "en"

            [audio]
            device = "pulse"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.synthesis.endpoint.as_deref(),
            Some("https://tts.example.com/v1/speech")
        );
        assert_eq!(config.synthesis.api_key.as_deref(), Some("secret"));
        assert_eq!(config.synthesis.language.as_deref(), Some("en"));
        assert_eq!(config.audio.device.as_deref(), Some("pulse"));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.synthesis.endpoint.is_none());
        assert!(config.audio.device.is_none());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = FileConfig::from_toml_str("[synthesis\nendpoint = 3");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_priority_cli_wins() {
        let resolved = resolve_setting(
            Some("from-cli"),
            "LECTIO_TEST_UNSET_VAR",
            Some("from-file"),
        );
        assert_eq!(resolved.as_deref(), Some("from-cli"));
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let resolved = resolve_setting(None, "LECTIO_TEST_UNSET_VAR", Some("from-file"));
        assert_eq!(resolved.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_resolve_required_missing() {
        let result =
            resolve_required_setting("api-key", None, "LECTIO_TEST_UNSET_VAR", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
