//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Listening, accepting, or writing on the emulator connection failed.
    Transport(String),
    /// The emulator closed the connection before a message was complete.
    Disconnected(String),
    /// The emulator sent something the protocol does not allow here.
    Protocol(String),
    /// Frame decoding, compositing, or encoding failure.
    Frame(String),
    /// Playthrough or journal persistence failure.
    Recorder(String),
    /// Decision agent failure that the agent could not recover from.
    Agent(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Whether the emulator hung up mid-message.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected(_))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Disconnected(msg) => write!(f, "disconnected: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Frame(msg) => write!(f, "frame: {msg}"),
            Self::Recorder(msg) => write!(f, "recorder: {msg}"),
            Self::Agent(msg) => write!(f, "agent: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        Self::Frame(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Agent(err.to_string())
    }
}
