//! Texts sent to the decision agent outside of regular window requests.

use crate::models::game::GameProfile;
use crate::models::session::HyperParameters;

/// Queued after a `DEAD` progress sample.
pub const DEAD_NOTICE: &str = "You died and you've respawned!\n";

/// Queued when the last `K` progress samples were identical.
pub const STUCK_NOTICE: &str = "No progress is being made, try different inputs.\n";

/// Queued after an answer that failed validation.
pub const INVALID_NOTICE: &str =
    "The previous answer's format was invalid. Please provide only inputs separated by commas (,).\n";

/// Queued after an answer that arrived too late to be applied.
pub const LATE_NOTICE: &str =
    "The previous answer took too long and was not applied. Answer faster.\n";

/// Episode briefing describing the game, the answer format, and the
/// composite image layout.
#[must_use]
pub fn episode_briefing(
    game: &GameProfile,
    hyper: &HyperParameters,
    stuck_threshold: usize,
) -> String {
    let descriptions = game.input_descriptions.join("\n");
    format!(
        "You are a video game player. You are currently playing the game {full_name} for the {console}. \
         The goal of the game is: {objective}\n\
         Your answers will be limited. The only thing you can answer is a combination of these inputs, \
         separated by commas (,):\n{descriptions}\n\
         The inputs you answer will be applied for {frames} frames, which is equivalent to {seconds:.2} seconds, \
         after which you will receive a new image to repeat the process. \
         The inputs you answer must respect the format and they must contribute to reaching the game's goal. \
         Only one of each input must be in the answer. An empty answer means no input. \
         If you see that the inputs have no effects on the game, try different ones, \
         don't try the same inputs more than {stuck_threshold} times if you don't see any changes.\n\
         To decide which inputs to choose, you will be given images of the last {samples} frames that the game has rendered, \
         where the leftmost frame is the oldest and the rightmost frame is the most recent. \
         With these images, you will also receive your current game progress.\n\
         Answer \"Understood.\" if you understood these instructions.",
        full_name = game.full_name(),
        console = game.console,
        objective = game.objective,
        frames = hyper.window_frames,
        seconds = game.input_hold_seconds(hyper.window_frames),
        samples = hyper.sample_count,
    )
}
