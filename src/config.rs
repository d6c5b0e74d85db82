use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, VoiceRemindersError};
use crate::speech::Language;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_TTS_BASE_URL: &str = "https://translate.google.com";
pub const DEFAULT_AUDIO_URL_PREFIX: &str = "/tts";

/// Fixed API routes the audio prefix must not shadow.
const RESERVED_ROUTE_PREFIXES: [&str; 4] =
    ["/health", "/set_reminder", "/reminders", "/emergency"];

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(default = "crate::runtime_paths::default_db_path")]
    pub sqlite_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: crate::runtime_paths::default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SpeechConfig {
    #[serde(default = "crate::runtime_paths::default_audio_dir")]
    pub audio_dir: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub default_lang: Language,
    /// No timeout unless set; a hung provider call stalls only its own request.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_url_prefix() -> String {
    DEFAULT_AUDIO_URL_PREFIX.to_string()
}

fn default_tts_base_url() -> String {
    DEFAULT_TTS_BASE_URL.to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            audio_dir: crate::runtime_paths::default_audio_dir(),
            url_prefix: default_url_prefix(),
            base_url: default_tts_base_url(),
            default_lang: Language::default(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `VOICE_REMINDERS_LOG` still wins over this.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

fn default_ansi() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            ansi: default_ansi(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn convention_defaults() -> Self {
        Self::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            VoiceRemindersError::Config(format!(
                "failed to read config file {}: {e}",
                path.to_string_lossy()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(raw).map_err(|e| VoiceRemindersError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.sqlite_path.trim().is_empty() {
            return Err(VoiceRemindersError::Config(
                "storage.sqlite_path must not be empty".to_string(),
            ));
        }
        if self.speech.audio_dir.trim().is_empty() {
            return Err(VoiceRemindersError::Config(
                "speech.audio_dir must not be empty".to_string(),
            ));
        }
        validate_url_prefix(&self.speech.url_prefix)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// The audio route is mounted at `{prefix}/{filename}`, so the prefix must be a plain
/// absolute path that does not overlap the fixed API routes.
fn validate_url_prefix(raw: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(VoiceRemindersError::Config(format!(
            "speech.url_prefix {raw:?} {reason}"
        )))
    };
    if !raw.starts_with('/') {
        return invalid("must start with '/'");
    }
    let prefix = raw.trim_end_matches('/');
    if prefix.is_empty() {
        return invalid("must not be the root path");
    }
    if prefix.contains(['{', '}', '*']) {
        return invalid("must not contain route parameters or wildcards");
    }
    let collides = RESERVED_ROUTE_PREFIXES.iter().any(|reserved| {
        prefix == *reserved
            || prefix
                .strip_prefix(reserved)
                .is_some_and(|rest| rest.starts_with('/'))
    });
    if collides {
        return invalid("overlaps an API route");
    }
    Ok(())
}
