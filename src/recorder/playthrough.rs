//! Append-only playthrough log keyed by hyperparameters and agent identity.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::models::outcome::{Playthrough, WindowOutcome};
use crate::models::progress::GAME_OVER_SENTINEL;
use crate::models::session::HyperParameters;
use crate::{AppError, Result};

/// Separator between `key=value` pairs in the file name.
pub const PAIR_DELIMITER: &str = "__";

/// Playthrough file extension.
pub const EXTENSION: &str = "csv";

/// How an episode line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeEnd {
    /// The emulator reported `GAME OVER`.
    GameOver,
    /// The run stopped mid-episode (fatal error or shutdown).
    Interrupted,
}

/// Canonical file name: `frame=..__freq=..__model=..__scr=...csv`.
///
/// Keys are sorted so any lookup by hyperparameter combination is exact
/// and independent of construction order.
#[must_use]
pub fn playthrough_file_name(hyper: &HyperParameters, model: &str) -> String {
    let params: BTreeMap<&str, String> = BTreeMap::from([
        ("frame", hyper.window_frames.to_string()),
        ("scr", hyper.sample_count.to_string()),
        ("freq", hyper.sample_stride.to_string()),
        ("model", model.to_owned()),
    ]);

    let stem = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(PAIR_DELIMITER);
    format!("{stem}.{EXTENSION}")
}

/// File line for an episode, or `None` when there is nothing to write.
///
/// The `GAME OVER` terminator is written for [`EpisodeEnd::GameOver`] only,
/// whether or not the outcomes already carry it; an interrupted episode is
/// written without one so readers can tell them apart.
#[must_use]
pub fn episode_line(playthrough: &Playthrough, end: EpisodeEnd) -> Option<String> {
    let mut tokens: Vec<String> = playthrough
        .outcomes()
        .iter()
        .filter(|outcome| **outcome != WindowOutcome::GameOver)
        .map(ToString::to_string)
        .collect();
    if end == EpisodeEnd::GameOver {
        tokens.push(GAME_OVER_SENTINEL.to_owned());
    }
    if tokens.is_empty() {
        return None;
    }
    Some(tokens.join(","))
}

/// Appends finished episodes to one playthrough file.
#[derive(Debug, Clone)]
pub struct PlaythroughRecorder {
    path: PathBuf,
}

impl PlaythroughRecorder {
    /// Recorder writing into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Recorder` if the directory cannot be created.
    pub fn new(dir: &Path, hyper: &HyperParameters, model: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|err| {
            AppError::Recorder(format!(
                "failed to create playthrough directory {}: {err}",
                dir.display()
            ))
        })?;
        Ok(Self {
            path: dir.join(playthrough_file_name(hyper, model)),
        })
    }

    /// Full path of the playthrough file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `playthrough` as one line, terminated according to `end`
    /// (see [`episode_line`]). Nothing is written for an interrupted
    /// episode with no outcomes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Recorder` if the file cannot be opened or written.
    pub fn append_episode(&self, playthrough: &Playthrough, end: EpisodeEnd) -> Result<()> {
        let Some(line) = episode_line(playthrough, end) else {
            return Ok(());
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                AppError::Recorder(format!(
                    "failed to open playthrough {}: {err}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}")
            .and_then(|()| file.flush())
            .map_err(|err| AppError::Recorder(format!("playthrough write failed: {err}")))?;

        info!(
            path = %self.path.display(),
            windows = playthrough.len(),
            ?end,
            "playthrough saved"
        );
        Ok(())
    }
}
