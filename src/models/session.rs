//! Per-session hyperparameters shared with the emulator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

fn default_timeout_seconds() -> u64 {
    180
}

fn default_window_frames() -> u32 {
    30
}

fn default_sample_count() -> u32 {
    3
}

fn default_sample_stride() -> u32 {
    1
}

/// Immutable hyperparameter set sent to the emulator once at session start.
///
/// The same values key the playthrough file name, so two runs with equal
/// hyperparameters and agent identity append to the same log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HyperParameters {
    /// Soft per-window decision budget in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Number of frames each input decision is held for.
    #[serde(default = "default_window_frames")]
    pub window_frames: u32,
    /// Number of frames sampled into each window's bundle.
    #[serde(default = "default_sample_count")]
    pub sample_count: u32,
    /// Distance in frames between two sampled frames.
    #[serde(default = "default_sample_stride")]
    pub sample_stride: u32,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            window_frames: default_window_frames(),
            sample_count: default_sample_count(),
            sample_stride: default_sample_stride(),
        }
    }
}

impl HyperParameters {
    /// Decision budget for one window.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Values in the order the emulator expects them on the wire:
    /// timeout, window length, sample count, stride.
    #[must_use]
    pub fn wire_values(&self) -> [i64; 4] {
        [
            i64::try_from(self.timeout_seconds).unwrap_or(i64::MAX),
            i64::from(self.window_frames),
            i64::from(self.sample_count),
            i64::from(self.sample_stride),
        ]
    }

    /// Reject zero values; the emulator cannot pace a window of nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first zero field.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(AppError::Config(
                "session.timeout_seconds must be greater than zero".into(),
            ));
        }
        if self.window_frames == 0 {
            return Err(AppError::Config(
                "session.window_frames must be greater than zero".into(),
            ));
        }
        if self.sample_count == 0 {
            return Err(AppError::Config(
                "session.sample_count must be greater than zero".into(),
            ));
        }
        if self.sample_stride == 0 {
            return Err(AppError::Config(
                "session.sample_stride must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
