//! Progress samples reported by the emulator once per window.

/// Sentinel line the emulator sends when the actor died and respawned.
pub const DEAD_SENTINEL: &str = "DEAD";

/// Sentinel line the emulator sends when the episode has ended.
pub const GAME_OVER_SENTINEL: &str = "GAME OVER";

/// Classified progress line.
///
/// Sentinels are matched exactly and case-sensitively; everything else is
/// an opaque, game-specific descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressSample {
    /// Regular progress descriptor (e.g. `1-1 10%`).
    Normal(String),
    /// The actor died and respawned.
    Dead,
    /// The episode is over.
    GameOver,
}

impl ProgressSample {
    /// Classify a raw progress line.
    #[must_use]
    pub fn classify(raw: String) -> Self {
        match raw.as_str() {
            DEAD_SENTINEL => Self::Dead,
            GAME_OVER_SENTINEL => Self::GameOver,
            _ => Self::Normal(raw),
        }
    }

    /// Whether this sample ends or interrupts regular play.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Normal(_))
    }
}
