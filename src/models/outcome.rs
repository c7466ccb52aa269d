//! Per-window outcomes and the in-memory playthrough they accumulate into.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::models::input::InputDecision;
use crate::models::progress::{DEAD_SENTINEL, GAME_OVER_SENTINEL};

/// What happened in one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowOutcome {
    /// A valid decision was forwarded to the emulator.
    Applied {
        /// Forwarded inputs, possibly empty.
        inputs: InputDecision,
        /// Progress at the start of the window.
        progress: String,
    },
    /// The decision budget was exhausted; nothing was applied.
    Skipped {
        /// Progress at the start of the window.
        progress: String,
    },
    /// The agent answered outside the vocabulary or format.
    Invalid {
        /// Progress at the start of the window.
        progress: String,
    },
    /// The actor died; carries the last normal progress of the episode.
    Dead {
        /// Last normal progress, empty if none was seen yet.
        progress: String,
    },
    /// The episode ended.
    GameOver,
}

/// Outcome classification for structured logs and the journal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// See [`WindowOutcome::Applied`].
    Applied,
    /// See [`WindowOutcome::Skipped`].
    Skipped,
    /// See [`WindowOutcome::Invalid`].
    Invalid,
    /// See [`WindowOutcome::Dead`].
    Dead,
    /// See [`WindowOutcome::GameOver`].
    GameOver,
}

impl WindowOutcome {
    /// Outcome classification.
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Applied { .. } => OutcomeKind::Applied,
            Self::Skipped { .. } => OutcomeKind::Skipped,
            Self::Invalid { .. } => OutcomeKind::Invalid,
            Self::Dead { .. } => OutcomeKind::Dead,
            Self::GameOver => OutcomeKind::GameOver,
        }
    }

    /// Progress text attached to the outcome, if any.
    #[must_use]
    pub fn progress(&self) -> Option<&str> {
        match self {
            Self::Applied { progress, .. }
            | Self::Skipped { progress }
            | Self::Invalid { progress }
            | Self::Dead { progress } => Some(progress),
            Self::GameOver => None,
        }
    }
}

/// Playthrough token: `<inputs>|<progress>` with inputs `;`-joined (or
/// `None`), `Skipped|p`, `Invalid|p`, `DEAD|p`, or `GAME OVER`.
impl Display for WindowOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied { inputs, progress } => {
                if inputs.is_empty() {
                    write!(f, "None|{progress}")
                } else {
                    write!(f, "{}|{progress}", inputs.tokens().join(";"))
                }
            }
            Self::Skipped { progress } => write!(f, "Skipped|{progress}"),
            Self::Invalid { progress } => write!(f, "Invalid|{progress}"),
            Self::Dead { progress } if progress.is_empty() => f.write_str(DEAD_SENTINEL),
            Self::Dead { progress } => write!(f, "{DEAD_SENTINEL}|{progress}"),
            Self::GameOver => f.write_str(GAME_OVER_SENTINEL),
        }
    }
}

/// Append-only outcome sequence for the current episode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playthrough {
    outcomes: Vec<WindowOutcome>,
}

impl Playthrough {
    /// Append one outcome.
    pub fn push(&mut self, outcome: WindowOutcome) {
        self.outcomes.push(outcome);
    }

    /// Recorded outcomes, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> &[WindowOutcome] {
        &self.outcomes
    }

    /// Number of recorded windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Hand the outcomes over and start empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}
