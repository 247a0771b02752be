use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::emotion::remote::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT, MAX_ATTEMPTS_LIMIT};
use crate::emotion::{ClassifierKind, RuleThresholds};

/// Environment variable holding the inference API token
pub const API_TOKEN_ENV: &str = "EMOTION_API_TOKEN";

/// Default inference endpoint (facial-expression image classification)
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/trpakov/vit-face-expression";

/// Configuration problems that must stop the request before it starts
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The remote classifier needs an API token: set EMOTION_API_TOKEN or `api_token` in the config file")]
    MissingApiToken,
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,
    pub classifier: ClassifierKind,
    pub music_dir: PathBuf,

    // Remote classifier
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    pub max_attempts: u32,

    // Rule-based tuning
    pub thresholds: RuleThresholds,

    // Playback
    pub player_command: Option<String>,

    // Mood journal path
    pub journal_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            classifier: ClassifierKind::Rule,
            music_dir: PathBuf::from("music"),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            thresholds: RuleThresholds::default(),
            player_command: None,
            journal_path: None,
        }
    }
}

impl Config {
    /// Newest config layout this build understands
    pub const SCHEMA_VERSION: u32 = 1;

    /// Read the config at `path`. A missing file yields the defaults.
    ///
    /// Out-of-range values are pulled back into range with a warning;
    /// thresholds that are not finite numbers are rejected.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read config {}", path.display()))
            }
        };

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in config {}", path.display()))?;
        config
            .normalized()
            .with_context(|| format!("Invalid settings in config {}", path.display()))
    }

    fn normalized(mut self) -> Result<Self> {
        if self.schema_version > Self::SCHEMA_VERSION {
            warn!(
                "Config schema {} is newer than {}; unknown fields are ignored",
                self.schema_version,
                Self::SCHEMA_VERSION
            );
        }

        let attempts = self.max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT);
        if attempts != self.max_attempts {
            warn!("max_attempts {} clamped to {}", self.max_attempts, attempts);
            self.max_attempts = attempts;
        }

        if self.timeout_secs == 0 {
            warn!("timeout_secs 0 raised to 1");
            self.timeout_secs = 1;
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("contrast", t.contrast),
            ("happy_brightness", t.happy_brightness),
            ("sad_brightness", t.sad_brightness),
            ("neutral_brightness", t.neutral_brightness),
        ] {
            if !value.is_finite() {
                bail!("threshold `{}` must be a finite number", name);
            }
        }

        Ok(self)
    }

    /// Write the config as pretty JSON, creating parent directories.
    /// The file is replaced in one rename so readers never see half a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create config directory {}", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Config is not serializable")?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, json)
            .with_context(|| format!("Cannot write {}", staging.display()))?;
        std::fs::rename(&staging, path)
            .with_context(|| format!("Cannot replace config {}", path.display()))
    }

    /// `~/.emotionplayer`, home of the config file and the mood journal
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".emotionplayer"))
            .context("No home directory to keep settings in")
    }

    /// `~/.emotionplayer/config.json`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Get the mood journal path
    pub fn get_journal_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.journal_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_config_dir()?.join("mood_journal.jsonl"))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// API token from the environment, then the config file
    pub fn api_token(&self) -> Result<String, ConfigError> {
        let from_env = std::env::var(API_TOKEN_ENV).ok();
        Self::pick_token(from_env, self.api_token.clone())
    }

    fn pick_token(from_env: Option<String>, from_file: Option<String>) -> Result<String, ConfigError> {
        from_env
            .into_iter()
            .chain(from_file)
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or(ConfigError::MissingApiToken)
    }
}
