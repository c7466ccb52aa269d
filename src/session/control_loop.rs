//! Per-window orchestration between the emulator and the decision agent.
//!
//! Each window reads one progress line, classifies it, and then either
//! ends the episode, records a death, or runs a full decision round:
//!
//! ```text
//! progress ─┬─ GAME OVER ─▶ flush playthrough ─▶ halt | new episode
//!           ├─ DEAD ──────▶ record, queue notice (no frames, no decision)
//!           └─ normal ────▶ stuck check ─▶ frames ─▶ budget ─▶ decide
//!                           ─▶ validate ─▶ forward ─▶ record
//! ```
//!
//! Exactly one line goes back to the emulator for every window that read
//! frames, even when nothing is applied.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::DecisionAgent;
use crate::frames::FrameAggregator;
use crate::models::game::GameProfile;
use crate::models::input::InputVocabulary;
use crate::models::outcome::{Playthrough, WindowOutcome};
use crate::models::progress::ProgressSample;
use crate::models::session::HyperParameters;
use crate::recorder::{EpisodeEnd, JournalEntry, PlaythroughRecorder, WindowJournal};
use crate::session::briefing::{
    episode_briefing, DEAD_NOTICE, INVALID_NOTICE, LATE_NOTICE, STUCK_NOTICE,
};
use crate::session::budget::{BudgetVerdict, TimeoutBudget};
use crate::session::stuck::StuckWindow;
use crate::transport::EmulatorChannel;
use crate::Result;

/// Behavioural switches for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Hyperparameters sent to the emulator at start.
    pub hyper: HyperParameters,
    /// Identical samples in a row that count as stuck.
    pub stuck_threshold: usize,
    /// Whether to tell the agent when it is stuck.
    pub stuck_notice: bool,
    /// Halt after the first `GAME OVER` instead of starting a new episode.
    pub stop_on_game_over: bool,
}

/// What the caller should do after a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    /// Read the next window.
    Continue,
    /// The run is over.
    Halt,
}

/// Counters reported when the loop returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Episodes that reached `GAME OVER`.
    pub episodes_completed: u32,
    /// Windows recorded across all episodes.
    pub windows: u64,
}

/// The orchestrator. Owns the channel, the agent, and all per-run state.
pub struct ControlLoop<S> {
    channel: EmulatorChannel<S>,
    agent: Box<dyn DecisionAgent>,
    vocabulary: InputVocabulary,
    settings: LoopSettings,
    aggregator: FrameAggregator,
    recorder: PlaythroughRecorder,
    journal: Option<WindowJournal>,
    briefing: String,
    budget: TimeoutBudget,
    stuck: StuckWindow,
    playthrough: Playthrough,
    last_progress: String,
    run_id: Uuid,
    episode: u32,
    window: u32,
    summary: RunSummary,
}

impl<S> ControlLoop<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Assemble a loop for `game`. Nothing is sent until [`run`](Self::run).
    #[must_use]
    pub fn new(
        channel: EmulatorChannel<S>,
        agent: Box<dyn DecisionAgent>,
        game: &GameProfile,
        settings: LoopSettings,
        aggregator: FrameAggregator,
        recorder: PlaythroughRecorder,
    ) -> Self {
        Self {
            channel,
            agent,
            vocabulary: game.vocabulary(),
            briefing: episode_briefing(game, &settings.hyper, settings.stuck_threshold),
            budget: TimeoutBudget::new(settings.hyper.timeout()),
            stuck: StuckWindow::new(settings.stuck_threshold),
            settings,
            aggregator,
            recorder,
            journal: None,
            playthrough: Playthrough::default(),
            last_progress: String::new(),
            run_id: Uuid::new_v4(),
            episode: 0,
            window: 0,
            summary: RunSummary::default(),
        }
    }

    /// Also write one JSONL line per window.
    #[must_use]
    pub fn with_journal(mut self, journal: WindowJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Outcomes of the episode in progress.
    #[must_use]
    pub fn playthrough(&self) -> &Playthrough {
        &self.playthrough
    }

    /// Current decision budget.
    #[must_use]
    pub fn budget(&self) -> &TimeoutBudget {
        &self.budget
    }

    /// Playthrough file this loop appends to.
    #[must_use]
    pub fn playthrough_path(&self) -> &Path {
        self.recorder.path()
    }

    /// Hand the channel back, e.g. to close the connection.
    pub fn into_channel(self) -> EmulatorChannel<S> {
        self.channel
    }

    /// Send the hyperparameters, brief the agent, and play until halted,
    /// cancelled, or a fatal error.
    ///
    /// Whatever the episode in progress has recorded is appended to the
    /// playthrough file before returning, unless it already was.
    ///
    /// # Errors
    ///
    /// Transport, protocol, frame, recorder, and agent failures are fatal
    /// and returned after the best-effort flush.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<RunSummary> {
        let span = info_span!("control_loop", run_id = %self.run_id, agent = self.agent.identity());
        let result = self.drive(&cancel).instrument(span).await;

        if let Err(err) = &result {
            error!(%err, "control loop stopped on fatal error");
        }
        self.flush_interrupted();
        result
    }

    async fn drive(&mut self, cancel: &CancellationToken) -> Result<RunSummary> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("shutdown requested before the session started");
                return Ok(self.summary);
            }
            started = self.start() => started?,
        }

        loop {
            let step = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                step = self.step() => step?,
            };
            if step == WindowStep::Halt {
                break;
            }
        }

        info!(
            episodes = self.summary.episodes_completed,
            windows = self.summary.windows,
            "control loop finished"
        );
        Ok(self.summary)
    }

    /// Send the hyperparameters and start the first episode.
    ///
    /// # Errors
    ///
    /// Returns the transport or agent failure that prevented the start.
    pub async fn start(&mut self) -> Result<()> {
        for value in self.settings.hyper.wire_values() {
            self.channel.send_number(value).await?;
        }
        info!(hyper = ?self.settings.hyper, "hyperparameters sent");
        self.begin_episode().await
    }

    async fn begin_episode(&mut self) -> Result<()> {
        self.episode += 1;
        self.window = 0;
        self.stuck.clear();
        self.last_progress.clear();

        let reply = self.agent.start_episode(&self.briefing).await?;
        info!(
            episode = self.episode,
            agent = self.agent.display_name(),
            reply = %reply,
            "episode started"
        );
        Ok(())
    }

    /// Run one window.
    ///
    /// # Errors
    ///
    /// Any fatal failure; recoverable conditions are recorded instead.
    pub async fn step(&mut self) -> Result<WindowStep> {
        let line = self.channel.receive_line().await?;
        info!(progress = %line, "progress received");

        match ProgressSample::classify(line) {
            ProgressSample::GameOver => self.finish_episode().await,
            ProgressSample::Dead => {
                warn!(last_progress = %self.last_progress, "actor died and respawned");
                self.agent.set_context_notice(DEAD_NOTICE);
                let progress = self.last_progress.clone();
                self.record(WindowOutcome::Dead { progress }, None);
                Ok(WindowStep::Continue)
            }
            ProgressSample::Normal(progress) => {
                self.play_window(progress).await?;
                Ok(WindowStep::Continue)
            }
        }
    }

    async fn finish_episode(&mut self) -> Result<WindowStep> {
        self.record(WindowOutcome::GameOver, None);
        let finished = self.playthrough.take();
        self.recorder
            .append_episode(&finished, EpisodeEnd::GameOver)?;
        self.summary.episodes_completed += 1;
        info!(episode = self.episode, windows = finished.len(), "game over");

        if self.settings.stop_on_game_over {
            return Ok(WindowStep::Halt);
        }

        // The emulator still sends this window's frames and waits for a line.
        self.receive_bundle().await?;
        self.channel.send_string("").await?;
        self.begin_episode().await?;
        Ok(WindowStep::Continue)
    }

    async fn play_window(&mut self, progress: String) -> Result<()> {
        if self.stuck.push(&progress) {
            warn!(
                progress = %progress,
                threshold = self.settings.stuck_threshold,
                "no progress across recent windows"
            );
            if self.settings.stuck_notice {
                self.agent.set_context_notice(STUCK_NOTICE);
            }
        }
        self.last_progress.clone_from(&progress);

        let bundle = self.receive_bundle().await?;
        let image = self.aggregator.compose(&bundle).await?;

        if self.budget.is_exhausted() {
            self.budget.skip_window();
            warn!(
                deficit_ms = millis(self.budget.deficit()),
                "behind schedule, skipping decision"
            );
            self.channel.send_string("").await?;
            self.record(WindowOutcome::Skipped { progress }, None);
            return Ok(());
        }

        let started = Instant::now();
        let answer = self.agent.propose_input(&progress, &image).await?;
        let elapsed = started.elapsed();

        let outcome = match self.budget.charge(elapsed) {
            BudgetVerdict::Overrun => {
                warn!(
                    elapsed_ms = millis(elapsed),
                    timeout_s = self.budget.window().as_secs(),
                    deficit_ms = millis(self.budget.deficit()),
                    "decision arrived too late"
                );
                self.channel.send_string("").await?;
                self.agent.set_context_notice(LATE_NOTICE);
                WindowOutcome::Skipped { progress }
            }
            BudgetVerdict::WithinBudget => match self.vocabulary.parse(&answer) {
                Ok(inputs) => {
                    let wire = inputs.to_wire();
                    info!(inputs = %wire, elapsed_ms = millis(elapsed), "applying inputs");
                    self.channel.send_string(&wire).await?;
                    WindowOutcome::Applied { inputs, progress }
                }
                Err(reason) => {
                    warn!(answer = %answer, %reason, "invalid inputs");
                    self.channel.send_string("").await?;
                    self.agent.set_context_notice(INVALID_NOTICE);
                    WindowOutcome::Invalid { progress }
                }
            },
        };

        self.record(outcome, Some(elapsed));
        Ok(())
    }

    async fn receive_bundle(&mut self) -> Result<Vec<Bytes>> {
        let count = self.settings.hyper.sample_count;
        let mut bundle = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
        for _ in 0..count {
            bundle.push(self.channel.receive_blob().await?);
        }
        Ok(bundle)
    }

    fn record(&mut self, outcome: WindowOutcome, decision: Option<Duration>) {
        self.window += 1;
        self.summary.windows += 1;

        if let Some(journal) = self.journal.as_mut() {
            let mut entry = JournalEntry::new(self.run_id, self.episode, self.window, &outcome)
                .with_deficit_ms(millis(self.budget.deficit()));
            if let Some(elapsed) = decision {
                entry = entry.with_decision_ms(millis(elapsed));
            }
            if let Err(err) = journal.record(&entry) {
                warn!(%err, "journal entry dropped");
            }
        }

        self.playthrough.push(outcome);
    }

    fn flush_interrupted(&mut self) {
        if self.playthrough.is_empty() {
            return;
        }
        let partial = self.playthrough.take();
        if let Err(err) = self.recorder.append_episode(&partial, EpisodeEnd::Interrupted) {
            error!(%err, windows = partial.len(), "failed to save interrupted playthrough");
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
