//! Static catalogue of playable titles.
//!
//! A title is a plain record: adding a game means adding an entry to
//! [`CATALOGUE`], not implementing a trait.

use std::path::{Path, PathBuf};

use crate::models::input::InputVocabulary;
use crate::{AppError, Result};

/// Fixed per-title metadata used for prompting, validation, and file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameProfile {
    /// Short identifier; also the per-game data directory name.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Original release year.
    pub release_year: u16,
    /// Console the title runs on.
    pub console: &'static str,
    /// Native frame rate.
    pub fps: u32,
    /// Allowed input tokens.
    pub inputs: &'static [&'static str],
    /// One line per input explaining what it does.
    pub input_descriptions: &'static [&'static str],
    /// What the player is trying to achieve.
    pub objective: &'static str,
}

/// Super Mario Bros.
pub const SMB: GameProfile = GameProfile {
    id: "smb",
    name: "Super Mario Bros.",
    release_year: 1985,
    console: "NES",
    fps: 60,
    inputs: &["left", "down", "right", "a", "b"],
    input_descriptions: &[
        "left : Moves Mario left.",
        "right : Moves Mario right.",
        "down : Makes Mario enter vertical pipes if they are enterable. Also allows big Mario to crouch.",
        "a : Makes Mario jump. Holding it longer makes Mario jump higher. The button needs to be released to jump again.",
        "b : Holding it makes Mario run faster when 'left' or 'right' is also held. Tapping it allows fiery Mario to shoot fireballs.",
    ],
    objective: "You must reach the flag pole at the end of each regular level and the axe at the end of each castle level, \
                which are both always to the right. Jumping over pipes, enemies, obstacles and gaps is crucial to progress.",
};

/// The Legend of Zelda.
pub const TLOZ: GameProfile = GameProfile {
    id: "tloz",
    name: "The Legend of Zelda",
    release_year: 1986,
    console: "NES",
    fps: 60,
    inputs: &["up", "left", "down", "right", "a", "b"],
    input_descriptions: &[
        "left : Moves Link left.",
        "right : Moves Link right.",
        "down : Moves Link down.",
        "up : Moves Link up.",
        "Link cannot move in a diagonal, only one directional input must be chosen at a time.",
        "a : Makes Link use the equipped item.",
        "b : Makes Link attack with his sword.",
    ],
    objective: "You must beat all the dungeons and defeat Ganon while obtaining various items on the way.",
};

/// Every title the pilot knows how to play.
pub const CATALOGUE: &[GameProfile] = &[SMB, TLOZ];

impl GameProfile {
    /// Find a title by identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` listing the known identifiers when `id`
    /// is not in the catalogue.
    pub fn lookup(id: &str) -> Result<&'static GameProfile> {
        CATALOGUE.iter().find(|game| game.id == id).ok_or_else(|| {
            let known: Vec<&str> = CATALOGUE.iter().map(|game| game.id).collect();
            AppError::Config(format!(
                "unknown game '{id}' (known: {})",
                known.join(", ")
            ))
        })
    }

    /// `"<name> (<year>)"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} ({})", self.name, self.release_year)
    }

    /// Seconds of game time covered by a window of `window_frames` frames.
    #[must_use]
    pub fn input_hold_seconds(&self, window_frames: u32) -> f64 {
        f64::from(window_frames) / f64::from(self.fps)
    }

    /// Validation vocabulary for this title.
    #[must_use]
    pub fn vocabulary(&self) -> InputVocabulary {
        InputVocabulary::new(self.inputs.iter().copied())
    }

    /// `<data_dir>/<id>`.
    #[must_use]
    pub fn data_dir(&self, root: &Path) -> PathBuf {
        root.join(self.id)
    }

    /// `<data_dir>/<id>/playthroughs`.
    #[must_use]
    pub fn playthrough_dir(&self, root: &Path) -> PathBuf {
        self.data_dir(root).join("playthroughs")
    }
}
