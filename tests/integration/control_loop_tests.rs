//! End-to-end control-loop scenarios against an in-memory emulator.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use emu_pilot::session::briefing::{DEAD_NOTICE, INVALID_NOTICE, LATE_NOTICE, STUCK_NOTICE};
use emu_pilot::AppError;

use super::test_helpers::{AgentCall, Answer, EmulatorScript, Harness, AGENT_ID, HYPER_LINES};

fn proposals(calls: &[AgentCall]) -> Vec<(String, Vec<String>)> {
    calls
        .iter()
        .filter_map(|call| match call {
            AgentCall::Propose { progress, notices } => Some((progress.clone(), notices.clone())),
            AgentCall::Briefing => None,
        })
        .collect()
}

#[tokio::test]
async fn game_over_flushes_playthrough_and_halts() {
    let script = EmulatorScript::new(3).line("GAME OVER");
    let mut harness = Harness::new(script, vec![], true);

    let summary = harness
        .control
        .run(CancellationToken::new())
        .await
        .expect("run succeeds");
    assert_eq!(summary.episodes_completed, 1);

    let path = harness.control.playthrough_path().to_owned();
    let name = path.file_name().unwrap().to_str().unwrap().to_owned();
    assert!(name.contains(&format!("model={AGENT_ID}")), "got {name}");
    assert_eq!(name, format!("frame=30__freq=1__model={AGENT_ID}__scr=3.csv"));

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(playthrough, "GAME OVER\n");
    assert_eq!(sent, HYPER_LINES, "no input may follow the game over");
    assert_eq!(calls, vec![AgentCall::Briefing]);
}

#[tokio::test]
async fn valid_answers_are_forwarded_and_recorded() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("1-1 20%")
        .line("GAME OVER");
    let answers = vec![Answer::now("right, b"), Answer::now("")];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}right,b\n\n"));
    assert_eq!(playthrough, "right;b|1-1 10%,None|1-1 20%,GAME OVER\n");
    assert_eq!(
        proposals(&calls),
        vec![
            ("1-1 10%".to_owned(), vec![]),
            ("1-1 20%".to_owned(), vec![]),
        ]
    );
}

#[tokio::test]
async fn invalid_answer_sends_no_input_and_queues_correction() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("1-1 12%")
        .line("GAME OVER");
    let answers = vec![Answer::now("left,left"), Answer::now("jump")];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}\n\n"));
    assert_eq!(playthrough, "Invalid|1-1 10%,Invalid|1-1 12%,GAME OVER\n");

    let requests = proposals(&calls);
    assert!(requests[0].1.is_empty());
    assert_eq!(requests[1].1, vec![INVALID_NOTICE.to_owned()]);
}

#[tokio::test]
async fn identical_progress_queues_stuck_notice() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("1-1 10%")
        .window("1-1 10%")
        .line("GAME OVER");
    let answers = vec![Answer::now("right"), Answer::now("right"), Answer::now("right")];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();

    let (_sent, calls, _playthrough, _dir) = harness.finish().await;
    let requests = proposals(&calls);
    assert!(requests[0].1.is_empty());
    assert!(requests[1].1.is_empty());
    assert_eq!(requests[2].1, vec![STUCK_NOTICE.to_owned()]);
}

#[tokio::test]
async fn varying_progress_is_not_stuck() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("1-1 20%")
        .window("1-1 10%")
        .line("GAME OVER");
    let mut harness = Harness::new(script, vec![], true);

    harness.control.run(CancellationToken::new()).await.unwrap();

    let (_sent, calls, _playthrough, _dir) = harness.finish().await;
    assert!(proposals(&calls).iter().all(|(_, notices)| notices.is_empty()));
}

#[tokio::test]
async fn dead_skips_frames_and_decision() {
    // DEAD carries no frame bundle: the next line is already a new window.
    let script = EmulatorScript::new(3)
        .window("1-1 40%")
        .line("DEAD")
        .window("1-1 0%")
        .line("GAME OVER");
    let answers = vec![Answer::now("a"), Answer::now("right")];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}a\nright\n"));
    assert_eq!(playthrough, "a|1-1 40%,DEAD|1-1 40%,right|1-1 0%,GAME OVER\n");

    let requests = proposals(&calls);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].1, vec![DEAD_NOTICE.to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn slow_decision_is_skipped_and_deficit_carried() {
    let script = EmulatorScript::new(3).window("1-1 10%").line("GAME OVER");
    let answers = vec![Answer::after("right", Duration::from_secs(200))];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();
    assert_eq!(harness.control.budget().deficit().as_secs(), 20);

    let (sent, _calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}\n"), "late answers are not applied");
    assert_eq!(playthrough, "Skipped|1-1 10%,GAME OVER\n");
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_skips_without_asking() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("1-1 11%")
        .window("1-1 12%")
        .line("GAME OVER");
    let answers = vec![
        Answer::after("right", Duration::from_secs(400)),
        Answer::now("a"),
    ];
    let mut harness = Harness::new(script, answers, true);

    harness.control.run(CancellationToken::new()).await.unwrap();
    // 400 - 180 = 220 carried, 220 - 180 = 40 after the skipped window,
    // then paid off by the instant third answer.
    assert_eq!(harness.control.budget().deficit(), Duration::ZERO);

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}\n\na\n"));
    assert_eq!(
        playthrough,
        "Skipped|1-1 10%,Skipped|1-1 11%,a|1-1 12%,GAME OVER\n"
    );

    let requests = proposals(&calls);
    assert_eq!(requests.len(), 2, "the exhausted window must not ask the agent");
    assert_eq!(requests[1].0, "1-1 12%");
    assert_eq!(requests[1].1, vec![LATE_NOTICE.to_owned()]);
}

#[tokio::test]
async fn restart_after_game_over_starts_a_new_episode() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .window("GAME OVER")
        .window("1-1 5%")
        .window("GAME OVER");
    let answers = vec![Answer::now("right"), Answer::now("left")];
    let mut harness = Harness::new(script, answers, false);

    // The stream ends after the second game over, which is fatal once the
    // third episode wants its first window.
    let err = harness
        .control
        .run(CancellationToken::new())
        .await
        .expect_err("emulator hung up");
    assert!(err.is_disconnect(), "got {err}");

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(sent, format!("{HYPER_LINES}right\n\nleft\n\n"));
    assert_eq!(playthrough, "right|1-1 10%,GAME OVER\nleft|1-1 5%,GAME OVER\n");
    let briefings = calls
        .iter()
        .filter(|call| **call == AgentCall::Briefing)
        .count();
    assert_eq!(briefings, 3);
}

#[tokio::test]
async fn disconnect_preserves_partial_episode() {
    let script = EmulatorScript::new(3)
        .window("1-2 30%")
        .line("1-2 35%");
    let answers = vec![Answer::now("right,a")];
    let mut harness = Harness::new(script, answers, true);

    let err = harness
        .control
        .run(CancellationToken::new())
        .await
        .expect_err("truncated bundle is fatal");
    assert!(matches!(err, AppError::Disconnected(_)), "got {err}");
    assert!(harness.control.playthrough().is_empty());

    let (_sent, _calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(playthrough, "right;a|1-2 30%\n", "interrupted lines carry no terminator");
}

#[tokio::test]
async fn oversized_frame_length_preserves_partial_episode() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .line("1-1 20%")
        .line("9223372036854775807")
        .line("abc");
    let answers = vec![Answer::now("right")];
    let mut harness = Harness::new(script, answers, true);

    let err = harness
        .control
        .run(CancellationToken::new())
        .await
        .expect_err("oversized frame is fatal");
    assert!(matches!(err, AppError::Protocol(_)), "got {err}");

    let (_sent, _calls, playthrough, _dir) = harness.finish().await;
    assert_eq!(playthrough, "right|1-1 10%\n");
}

#[tokio::test]
async fn cancellation_flushes_partial_episode() {
    let script = EmulatorScript::new(3).window("1-1 10%");
    let answers = vec![Answer::now("b")];
    let mut harness = Harness::new(script, answers, true);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = harness.control.run(cancel).await.unwrap();
    assert_eq!(summary.windows, 0);

    let (sent, calls, playthrough, _dir) = harness.finish().await;
    assert!(sent.is_empty(), "nothing is sent once cancelled");
    assert!(calls.is_empty());
    assert!(playthrough.is_empty());
}

#[tokio::test]
async fn journal_records_each_window() {
    let script = EmulatorScript::new(3)
        .window("1-1 10%")
        .line("DEAD")
        .line("GAME OVER");
    let harness = Harness::new(script, vec![Answer::now("right")], true);
    let journal_path = harness.control.playthrough_path().with_extension("jsonl");
    let journal = emu_pilot::recorder::WindowJournal::open(&journal_path).unwrap();
    let mut harness = Harness {
        control: harness.control.with_journal(journal),
        ..harness
    };

    harness.control.run(CancellationToken::new()).await.unwrap();

    let text = std::fs::read_to_string(&journal_path).unwrap();
    let entries: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["outcome"], "applied");
    assert_eq!(entries[0]["inputs"], "right");
    assert_eq!(entries[0]["window"], 1);
    assert!(entries[0]["decision_ms"].is_u64());
    assert_eq!(entries[1]["outcome"], "dead");
    assert_eq!(entries[1]["progress"], "1-1 10%");
    assert_eq!(entries[2]["outcome"], "game_over");
    assert_eq!(entries[0]["run_id"], entries[2]["run_id"]);

    let _ = harness.finish().await;
}
