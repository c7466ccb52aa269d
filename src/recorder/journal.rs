//! JSONL window journal written next to the playthrough file.

use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::models::outcome::{OutcomeKind, WindowOutcome};
use crate::{AppError, Result};

/// One journal line.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    /// When the window finished.
    pub timestamp: DateTime<Utc>,
    /// Identifier shared by every entry of one process run.
    pub run_id: Uuid,
    /// 1-based episode number within the run.
    pub episode: u32,
    /// 1-based window number within the episode.
    pub window: u32,
    /// Outcome classification.
    pub outcome: OutcomeKind,
    /// Progress attached to the outcome.
    pub progress: Option<String>,
    /// Applied inputs, comma-joined.
    pub inputs: Option<String>,
    /// Time the agent took to answer, when it was asked.
    pub decision_ms: Option<u64>,
    /// Budget deficit carried into the next window.
    pub deficit_ms: u64,
}

impl JournalEntry {
    /// Entry describing `outcome`.
    #[must_use]
    pub fn new(run_id: Uuid, episode: u32, window: u32, outcome: &WindowOutcome) -> Self {
        let inputs = match outcome {
            WindowOutcome::Applied { inputs, .. } => Some(inputs.to_wire()),
            _ => None,
        };
        Self {
            timestamp: Utc::now(),
            run_id,
            episode,
            window,
            outcome: outcome.kind(),
            progress: outcome.progress().map(str::to_owned),
            inputs,
            decision_ms: None,
            deficit_ms: 0,
        }
    }

    /// Set the agent latency.
    #[must_use]
    pub fn with_decision_ms(mut self, decision_ms: u64) -> Self {
        self.decision_ms = Some(decision_ms);
        self
    }

    /// Set the carried deficit.
    #[must_use]
    pub fn with_deficit_ms(mut self, deficit_ms: u64) -> Self {
        self.deficit_ms = deficit_ms;
        self
    }
}

/// Append-only JSONL writer.
pub struct WindowJournal {
    path: PathBuf,
    writer: BufWriter<fs::File>,
}

impl WindowJournal {
    /// Open (or create) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Recorder` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Recorder(format!(
                    "failed to create journal directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                AppError::Recorder(format!("failed to open journal {}: {e}", path.display()))
            })?;
        Ok(Self {
            path: path.to_owned(),
            writer: BufWriter::new(file),
        })
    }

    /// Journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry and flush.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Recorder` on serialization or write failure.
    pub fn record(&mut self, entry: &JournalEntry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| AppError::Recorder(format!("failed to serialize journal entry: {e}")))?;
        if let Err(e) = writeln!(self.writer, "{line}") {
            warn!("failed to write journal entry: {e}");
            return Err(AppError::Recorder(format!("journal write failed: {e}")));
        }
        if let Err(e) = self.writer.flush() {
            warn!("failed to flush journal: {e}");
            return Err(AppError::Recorder(format!("journal flush failed: {e}")));
        }
        Ok(())
    }
}

impl std::fmt::Debug for WindowJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowJournal")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
