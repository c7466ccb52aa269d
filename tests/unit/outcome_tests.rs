//! Unit tests for progress classification and playthrough tokens.

use emu_pilot::models::game::SMB;
use emu_pilot::models::outcome::{OutcomeKind, Playthrough, WindowOutcome};
use emu_pilot::models::progress::ProgressSample;

#[test]
fn sentinels_are_matched_exactly() {
    assert_eq!(ProgressSample::classify("DEAD".into()), ProgressSample::Dead);
    assert_eq!(
        ProgressSample::classify("GAME OVER".into()),
        ProgressSample::GameOver
    );
    assert_eq!(
        ProgressSample::classify("dead".into()),
        ProgressSample::Normal("dead".into())
    );
    assert!(!ProgressSample::classify("1-1 10%".into()).is_terminal());
    assert!(ProgressSample::Dead.is_terminal());
}

#[test]
fn applied_tokens_join_inputs_with_semicolons() {
    let inputs = SMB.vocabulary().parse("right,a").unwrap();
    let outcome = WindowOutcome::Applied {
        inputs,
        progress: "1-1 10%".into(),
    };
    assert_eq!(outcome.to_string(), "right;a|1-1 10%");
    assert_eq!(outcome.kind(), OutcomeKind::Applied);
}

#[test]
fn empty_applied_inputs_render_as_none() {
    let outcome = WindowOutcome::Applied {
        inputs: SMB.vocabulary().parse("").unwrap(),
        progress: "1-1 10%".into(),
    };
    assert_eq!(outcome.to_string(), "None|1-1 10%");
}

#[test]
fn non_applied_tokens() {
    let skipped = WindowOutcome::Skipped {
        progress: "1-2 5%".into(),
    };
    let invalid = WindowOutcome::Invalid {
        progress: "1-2 5%".into(),
    };
    assert_eq!(skipped.to_string(), "Skipped|1-2 5%");
    assert_eq!(invalid.to_string(), "Invalid|1-2 5%");
    assert_eq!(WindowOutcome::GameOver.to_string(), "GAME OVER");
    assert_eq!(WindowOutcome::GameOver.progress(), None);
}

#[test]
fn dead_token_carries_last_progress_when_known() {
    let dead = WindowOutcome::Dead {
        progress: "1-1 40%".into(),
    };
    assert_eq!(dead.to_string(), "DEAD|1-1 40%");
    let early = WindowOutcome::Dead {
        progress: String::new(),
    };
    assert_eq!(early.to_string(), "DEAD");
}

#[test]
fn playthrough_keeps_outcomes_in_order() {
    let mut playthrough = Playthrough::default();
    playthrough.push(WindowOutcome::Skipped {
        progress: "1-1 0%".into(),
    });
    playthrough.push(WindowOutcome::GameOver);

    assert_eq!(playthrough.len(), 2);
    assert_eq!(playthrough.outcomes()[1], WindowOutcome::GameOver);
}

#[test]
fn take_leaves_an_empty_playthrough() {
    let mut playthrough = Playthrough::default();
    playthrough.push(WindowOutcome::GameOver);

    let finished = playthrough.take();
    assert_eq!(finished.outcomes(), [WindowOutcome::GameOver]);
    assert!(playthrough.is_empty());
}

#[test]
fn outcome_kind_serializes_snake_case() {
    let json = serde_json::to_string(&OutcomeKind::GameOver).unwrap();
    assert_eq!(json, "\"game_over\"");
}
