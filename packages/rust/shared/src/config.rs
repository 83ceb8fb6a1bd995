//! Application configuration for PileLog.
//!
//! User config lives at `~/.pilelog/pilelog.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PileLogError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pilelog.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pilelog";

// ---------------------------------------------------------------------------
// Config structs (matching pilelog.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend web service settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Deployment-wide project settings.
    #[serde(default)]
    pub project: ProjectConfig,

    /// Conversation behaviour.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the record-keeping web service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://localhost:8080".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier every record is filed under.
    #[serde(default = "default_project_id")]
    pub id: i64,

    /// Pile field identifier, if the deployment tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pile_field_id: Option<i64>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            id: default_project_id(),
            pile_field_id: None,
        }
    }
}

fn default_project_id() -> i64 {
    1
}

/// `[dialogue]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Maximum number of entries in a pile selection menu.
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,

    /// Language of operator-facing messages.
    #[serde(default)]
    pub locale: Locale,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_groups: default_max_groups(),
            locale: Locale::default(),
        }
    }
}

fn default_max_groups() -> usize {
    6
}

/// Operator-facing language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

/// `[telegram]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Name of the env var holding the bot token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
        }
    }
}

fn default_token_env() -> String {
    "TG_TOKEN".into()
}

impl AppConfig {
    /// Check the values the rest of the system relies on.
    pub fn validate(&self) -> Result<()> {
        if self.dialogue.max_groups < 2 {
            return Err(PileLogError::validation(format!(
                "dialogue.max_groups must be at least 2, got {}",
                self.dialogue.max_groups
            )));
        }

        let url = Url::parse(&self.backend.base_url).map_err(|e| {
            PileLogError::validation(format!(
                "backend.base_url '{}' is not a valid URL: {e}",
                self.backend.base_url
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PileLogError::validation(format!(
                "backend.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pilelog/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PileLogError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pilelog/pilelog.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PileLogError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PileLogError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PileLogError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PileLogError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PileLogError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the bot token from the env var named in `[telegram].token_env`.
pub fn resolve_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.telegram.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(PileLogError::config(format!(
            "Telegram bot token not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("TG_TOKEN"));
        assert!(toml_str.contains("locale = \"ru\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.dialogue.max_groups, 6);
        assert_eq!(parsed.project.id, 1);
        assert_eq!(parsed.project.pile_field_id, None);
        assert_eq!(parsed.telegram.token_env, "TG_TOKEN");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[backend]
base_url = "http://records.internal:9000"

[project]
id = 42
pile_field_id = 7

[dialogue]
locale = "en"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.backend.base_url, "http://records.internal:9000");
        assert_eq!(config.backend.timeout_secs, 30);
        assert_eq!(config.project.id, 42);
        assert_eq!(config.project.pile_field_id, Some(7));
        assert_eq!(config.dialogue.locale, Locale::En);
        assert_eq!(config.dialogue.max_groups, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join(format!("pilelog-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("pilelog.toml");
        std::fs::write(&path, "[dialogue]\nmax_groups = 4\n").expect("write");

        let config = load_config_from(&path).expect("load");
        assert_eq!(config.dialogue.max_groups, 4);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/pilelog.toml")).unwrap_err();
        assert!(matches!(err, PileLogError::Io { .. }));
    }

    #[test]
    fn validate_rejects_small_group_limit() {
        let mut config = AppConfig::default();
        config.dialogue.max_groups = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_groups"));
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = AppConfig::default();
        config.backend.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.backend.base_url = "ftp://records.example.com".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn token_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.telegram.token_env = "PILELOG_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = resolve_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("token not found"));
    }
}
