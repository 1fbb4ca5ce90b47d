use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::line_numbers::CursorLinePolicy;

/// Environment variable consulted for the API token
pub const TOKEN_ENV: &str = "VIMBIN_TOKEN";

/// Environment variable consulted for the server address
pub const URL_ENV: &str = "VIMBIN_URL";

/// Persisted vimbin configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Where the content store lives and how to authenticate
    #[serde(default)]
    pub server: ServerConfig,

    /// Status line settings
    #[serde(default)]
    pub status: StatusConfig,

    /// Editing session settings
    #[serde(default)]
    pub editor: EditorConfig,

    /// Custom key mappings applied once at session start
    #[serde(default)]
    pub keymap: KeymapConfig,
}

/// Server settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Base address of the vimbin server
    #[serde(default = "default_address")]
    pub address: String,

    /// API token sent as `X-API-Token`
    #[serde(default)]
    pub token: Option<String>,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub skip_insecure_verify: bool,
}

/// Status line settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StatusConfig {
    /// Delay before a status message clears itself, in milliseconds
    #[serde(default = "default_clear_delay_ms")]
    pub clear_delay_ms: u64,
}

/// Editor settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EditorConfig {
    /// Label shown in the gutter on the cursor's own line
    #[serde(default)]
    pub cursor_line_label: CursorLinePolicy,

    /// Refuse a second save while one is still in flight
    #[serde(default)]
    pub serialize_saves: bool,
}

/// What a key sequence resolves to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyTarget {
    /// Run a custom action registered on the engine
    Action(String),
    /// Replay another key sequence
    Keys(String),
    /// Run an ex-command
    Ex(String),
}

/// Declarative key mapping configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeymapConfig {
    /// Key sequence → target
    #[serde(default = "default_bindings")]
    pub bindings: BTreeMap<String, KeyTarget>,

    /// Default bindings removed at setup
    #[serde(default = "default_unmap")]
    pub unmap: Vec<String>,
}

// Default values
fn default_address() -> String {
    "http://localhost:8080".to_string()
}
fn default_clear_delay_ms() -> u64 {
    5000
}
fn default_bindings() -> BTreeMap<String, KeyTarget> {
    BTreeMap::from([
        (
            "<Space>y".to_string(),
            KeyTarget::Action("yankToClipboard".to_string()),
        ),
        (
            "<Space>p".to_string(),
            KeyTarget::Action("pasteFromClipboard".to_string()),
        ),
        ("<Space><Space>".to_string(), KeyTarget::Keys("l".to_string())),
    ])
}
fn default_unmap() -> Vec<String> {
    vec!["<Space>".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            skip_insecure_verify: false,
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            clear_delay_ms: default_clear_delay_ms(),
        }
    }
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            bindings: default_bindings(),
            unmap: default_unmap(),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    /// The config
    config: Config,

    /// The path to the config file
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager for `config.json` inside `config_dir`
    pub fn new(config_dir: &Path) -> Self {
        Self::with_path(config_dir.join("config.json"))
    }

    /// Create a manager for an explicit config file
    pub fn with_path(config_path: PathBuf) -> Self {
        Self {
            config: Config::default(),
            config_path,
        }
    }

    /// Default location: `<config dir>/vimbin/config.json`
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vimbin")
    }

    /// Load the config; a missing file keeps the defaults
    pub fn load(&mut self) -> Result<()> {
        if self.config_path.exists() {
            let config_str = fs::read_to_string(&self.config_path).with_context(|| {
                format!("Failed to read config '{}'", self.config_path.display())
            })?;
            self.config = serde_json::from_str(&config_str)
                .map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        }

        Ok(())
    }

    /// Save the config
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let config_str = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_path, config_str)?;
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the config
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the config
    pub fn get_config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}

/// Values given on the command line, highest precedence
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub skip_insecure_verify: bool,
}

/// Resolved settings for one session, built once and passed to every component
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub token: String,
    pub skip_insecure_verify: bool,
    pub clear_delay: Duration,
    pub cursor_line_label: CursorLinePolicy,
    pub serialize_saves: bool,
    pub keymap: KeymapConfig,
}

impl SessionConfig {
    /// Build a session config with defaults for everything but the endpoint
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            base_url: normalize_url(&base_url.into()),
            token: token.into(),
            skip_insecure_verify: false,
            clear_delay: Duration::from_millis(defaults.status.clear_delay_ms),
            cursor_line_label: defaults.editor.cursor_line_label,
            serialize_saves: defaults.editor.serialize_saves,
            keymap: defaults.keymap,
        }
    }

    /// Resolve flags > environment > config file
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        Self::resolve_with_env(config, overrides, |key| std::env::var(key).ok())
    }

    pub fn resolve_with_env<F>(config: &Config, overrides: &Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let address = non_empty(overrides.url.clone())
            .or_else(|| non_empty(env(URL_ENV)))
            .or_else(|| non_empty(Some(config.server.address.clone())))
            .ok_or_else(|| anyhow!("URL is empty"))?;

        let token = non_empty(overrides.token.clone())
            .or_else(|| non_empty(env(TOKEN_ENV)))
            .or_else(|| non_empty(config.server.token.clone()))
            .ok_or_else(|| anyhow!("API token is empty"))?;

        Ok(Self {
            base_url: normalize_url(&address),
            token,
            skip_insecure_verify: overrides.skip_insecure_verify
                || config.server.skip_insecure_verify,
            clear_delay: Duration::from_millis(config.status.clear_delay_ms),
            cursor_line_label: config.editor.cursor_line_label,
            serialize_saves: config.editor.serialize_saves,
            keymap: config.keymap.clone(),
        })
    }

    pub fn with_serialized_saves(mut self, serialize: bool) -> Self {
        self.serialize_saves = serialize;
        self
    }

    /// Full URL of an endpoint such as `/save`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
