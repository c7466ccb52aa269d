#![forbid(unsafe_code)]

//! `emu-pilot`: drive an emulated game from a decision agent.
//!
//! Loads configuration, waits for the emulator script to connect, and runs
//! the control loop until the episode ends, the emulator disconnects, or a
//! shutdown signal arrives.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use emu_pilot::agent::{ChatAgent, DecisionAgent, HumanAgent};
use emu_pilot::config::{AgentKind, GlobalConfig};
use emu_pilot::frames::FrameAggregator;
use emu_pilot::recorder::{PlaythroughRecorder, WindowJournal};
use emu_pilot::session::{ControlLoop, LoopSettings};
use emu_pilot::transport::EmulatorListener;
use emu_pilot::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "emu-pilot", about = "Drive an emulated game from a decision agent", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured game identifier.
    #[arg(long)]
    game: Option<String>,

    /// Override the port the emulator connects to.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("emu-pilot bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(game) = args.game {
        config.game = game;
    }
    if let Some(port) = args.port {
        config.emulator.port = port;
    }
    config.validate()?;
    config.load_credentials()?;

    let game = config.game_profile()?;
    info!(game = game.id, name = %game.full_name(), "configuration loaded");

    // ── Build collaborators ─────────────────────────────
    let agent: Box<dyn DecisionAgent> = match config.agent.kind {
        AgentKind::Human => Box::new(HumanAgent::new()),
        AgentKind::Chat => Box::new(ChatAgent::new(config.agent.chat_config())),
    };
    info!(agent = agent.display_name(), identity = agent.identity(), "decision agent ready");

    let aggregator = FrameAggregator::new(config.composite_path()?, config.frames.separator_width);
    let recorder =
        PlaythroughRecorder::new(&config.playthrough_dir()?, &config.session, agent.identity())?;
    info!(path = %recorder.path().display(), "recording playthroughs");

    // ── Wait for the emulator ───────────────────────────
    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_ct.cancel();
    });

    let listener = EmulatorListener::bind(&config.emulator.host, config.emulator.port).await?;
    let channel = tokio::select! {
        () = ct.cancelled() => {
            info!("shut down before the emulator connected");
            return Ok(());
        }
        accepted = listener.accept() => accepted?,
    };

    let settings = LoopSettings {
        hyper: config.session,
        stuck_threshold: config.stuck_threshold,
        stuck_notice: config.agent.stuck_notice,
        stop_on_game_over: config.stop_on_game_over,
    };
    let mut control = ControlLoop::new(channel, agent, game, settings, aggregator, recorder);

    if config.journal.enabled {
        let journal_path = control.playthrough_path().with_extension("jsonl");
        match WindowJournal::open(&journal_path) {
            Ok(journal) => control = control.with_journal(journal),
            Err(err) => warn!(%err, "window journal disabled"),
        }
    }

    // ── Play ────────────────────────────────────────────
    match control.run(ct).await {
        Ok(summary) => {
            info!(
                episodes = summary.episodes_completed,
                windows = summary.windows,
                "emu-pilot shut down"
            );
            Ok(())
        }
        Err(err) => {
            error!(%err, "emu-pilot aborted");
            Err(err)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
