//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::agent::ChatAgentConfig;
use crate::models::game::GameProfile;
use crate::models::session::HyperParameters;
use crate::{AppError, Result};

/// Where the emulator script connects.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EmulatorConfig {
    /// Interface to listen on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port the emulator script dials.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    9999
}

/// Composite image settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FramesConfig {
    /// Width in pixels of the column between two frames.
    #[serde(default = "default_separator_width")]
    pub separator_width: u32,
    /// Composite file name inside the game's data directory.
    #[serde(default = "default_frames_file")]
    pub file_name: String,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            separator_width: default_separator_width(),
            file_name: default_frames_file(),
        }
    }
}

fn default_separator_width() -> u32 {
    1
}

fn default_frames_file() -> String {
    "recent_frames.png".into()
}

/// Which decision agent drives the game.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// A person typing at the terminal.
    #[default]
    Human,
    /// An OpenAI-compatible chat-completions API.
    Chat,
}

/// Decision agent settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Adapter to use.
    #[serde(default)]
    pub kind: AgentKind,
    /// Model code for the chat adapter.
    #[serde(default)]
    pub model: String,
    /// Playthrough `model=` value; defaults to `model` (or `human`).
    #[serde(default)]
    pub identity: Option<String>,
    /// Chat API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Send `Progress: <p>` with every request.
    #[serde(default = "default_true")]
    pub include_progress: bool,
    /// Tell the agent when progress has stalled.
    #[serde(default = "default_true")]
    pub stuck_notice: bool,
    /// Fallback wait after a rate limit.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_seconds: u64,
    /// Wait after a server or transport error.
    #[serde(default = "default_error_delay")]
    pub error_delay_seconds: u64,
    /// Attempts per request; 0 retries forever.
    #[serde(default)]
    pub max_attempts: u32,
    /// API key, loaded at runtime from `api_key_env`.
    #[serde(skip)]
    pub api_key: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            kind: AgentKind::default(),
            model: String::new(),
            identity: None,
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            include_progress: true,
            stuck_notice: true,
            rate_limit_delay_seconds: default_rate_limit_delay(),
            error_delay_seconds: default_error_delay(),
            max_attempts: 0,
            api_key: String::new(),
        }
    }
}

impl AgentConfig {
    /// Identifier written into playthrough file names.
    #[must_use]
    pub fn identity(&self) -> String {
        match (&self.identity, self.kind) {
            (Some(identity), _) => identity.clone(),
            (None, AgentKind::Human) => "human".into(),
            (None, AgentKind::Chat) => self.model.clone(),
        }
    }

    /// Settings for the chat adapter.
    #[must_use]
    pub fn chat_config(&self) -> ChatAgentConfig {
        ChatAgentConfig {
            model: self.model.clone(),
            identity: self.identity(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            include_progress: self.include_progress,
            rate_limit_delay: Duration::from_secs(self.rate_limit_delay_seconds),
            error_delay: Duration::from_secs(self.error_delay_seconds),
            max_attempts: self.max_attempts,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn default_rate_limit_delay() -> u64 {
    33
}

fn default_error_delay() -> u64 {
    5
}

/// Window journal settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct JournalConfig {
    /// Write a JSONL line per window next to the playthrough file.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_stuck_threshold() -> usize {
    3
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Game identifier from the catalogue.
    pub game: String,
    /// Root for per-game composites and playthroughs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Halt after the first `GAME OVER`.
    #[serde(default = "default_true")]
    pub stop_on_game_over: bool,
    /// Identical progress samples in a row that count as stuck.
    #[serde(default = "default_stuck_threshold")]
    pub stuck_threshold: usize,
    /// Emulator connection.
    #[serde(default)]
    pub emulator: EmulatorConfig,
    /// Hyperparameters sent to the emulator.
    #[serde(default)]
    pub session: HyperParameters,
    /// Composite image settings.
    #[serde(default)]
    pub frames: FramesConfig,
    /// Decision agent.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Window journal.
    #[serde(default)]
    pub journal: JournalConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the chat API key from the configured environment variable.
    ///
    /// Does nothing for the human agent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the variable is unset or empty.
    pub fn load_credentials(&mut self) -> Result<()> {
        if self.agent.kind != AgentKind::Chat {
            return Ok(());
        }
        let key = env::var(&self.agent.api_key_env).map_err(|_| {
            AppError::Config(format!(
                "api key not found in {} env var",
                self.agent.api_key_env
            ))
        })?;
        if key.trim().is_empty() {
            return Err(AppError::Config(format!(
                "{} env var is empty",
                self.agent.api_key_env
            )));
        }
        self.agent.api_key = key;
        Ok(())
    }

    /// Catalogue record for the configured game.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the game is unknown.
    pub fn game_profile(&self) -> Result<&'static GameProfile> {
        GameProfile::lookup(&self.game)
    }

    /// Where the composite image is written.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the game is unknown.
    pub fn composite_path(&self) -> Result<PathBuf> {
        Ok(self
            .game_profile()?
            .data_dir(&self.data_dir)
            .join(&self.frames.file_name))
    }

    /// Directory holding playthrough files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the game is unknown.
    pub fn playthrough_dir(&self) -> Result<PathBuf> {
        Ok(self.game_profile()?.playthrough_dir(&self.data_dir))
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violation.
    pub fn validate(&self) -> Result<()> {
        self.game_profile()?;
        self.session.validate()?;

        if self.stuck_threshold == 0 {
            return Err(AppError::Config(
                "stuck_threshold must be greater than zero".into(),
            ));
        }

        if self.frames.file_name.trim().is_empty() {
            return Err(AppError::Config("frames.file_name must not be empty".into()));
        }

        if self.agent.kind == AgentKind::Chat && self.agent.model.trim().is_empty() {
            return Err(AppError::Config(
                "agent.model is required for the chat agent".into(),
            ));
        }

        let identity = self.agent.identity();
        if identity.is_empty() || identity.contains(['/', '\\']) {
            return Err(AppError::Config(format!(
                "agent identity '{identity}' cannot be used in a file name"
            )));
        }

        Ok(())
    }
}
