//! Durable records of a run.
//!
//! - [`PlaythroughRecorder`] appends one CSV-like line per episode to a file
//!   whose name encodes the hyperparameters and agent identity.
//! - [`WindowJournal`] appends one JSON object per window next to it.

pub mod journal;
pub mod playthrough;

pub use journal::{JournalEntry, WindowJournal};
pub use playthrough::{episode_line, playthrough_file_name, EpisodeEnd, PlaythroughRecorder};
