use std::path::PathBuf;
use std::time::Duration;

use emu_pilot::config::{AgentKind, GlobalConfig};
use emu_pilot::AppError;

fn sample_toml() -> &'static str {
    r#"
game = "smb"
data_dir = "runs"
stop_on_game_over = false
stuck_threshold = 4

[emulator]
host = "127.0.0.1"
port = 10000

[session]
timeout_seconds = 60
window_frames = 15
sample_count = 4
sample_stride = 2

[frames]
separator_width = 2
file_name = "latest.png"

[agent]
kind = "chat"
model = "gpt-4o"
rate_limit_delay_seconds = 10
max_attempts = 5

[journal]
enabled = false
"#
}

#[test]
fn parses_full_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.game, "smb");
    assert_eq!(config.data_dir, PathBuf::from("runs"));
    assert!(!config.stop_on_game_over);
    assert_eq!(config.stuck_threshold, 4);
    assert_eq!(config.emulator.port, 10000);
    assert_eq!(config.session.wire_values(), [60, 15, 4, 2]);
    assert_eq!(config.frames.separator_width, 2);
    assert_eq!(config.agent.kind, AgentKind::Chat);
    assert!(!config.journal.enabled);
}

#[test]
fn minimal_config_uses_defaults() {
    let config = GlobalConfig::from_toml_str("game = \"tloz\"").expect("config parses");

    assert_eq!(config.emulator.host, "localhost");
    assert_eq!(config.emulator.port, 9999);
    assert_eq!(config.session.wire_values(), [180, 30, 3, 1]);
    assert_eq!(config.stuck_threshold, 3);
    assert!(config.stop_on_game_over);
    assert_eq!(config.agent.kind, AgentKind::Human);
    assert_eq!(config.agent.identity(), "human");
    assert_eq!(config.frames.file_name, "recent_frames.png");
    assert!(config.journal.enabled);
}

#[test]
fn derived_paths_are_per_game() {
    let config = GlobalConfig::from_toml_str(sample_toml()).unwrap();

    assert_eq!(
        config.composite_path().unwrap(),
        PathBuf::from("runs/smb/latest.png")
    );
    assert_eq!(
        config.playthrough_dir().unwrap(),
        PathBuf::from("runs/smb/playthroughs")
    );
}

#[test]
fn chat_config_carries_delays() {
    let config = GlobalConfig::from_toml_str(sample_toml()).unwrap();
    let chat = config.agent.chat_config();

    assert_eq!(chat.model, "gpt-4o");
    assert_eq!(chat.identity, "gpt-4o");
    assert_eq!(chat.rate_limit_delay, Duration::from_secs(10));
    assert_eq!(chat.error_delay, Duration::from_secs(5));
    assert_eq!(chat.max_attempts, 5);
    assert!(chat.include_progress);
}

#[test]
fn explicit_identity_wins() {
    let raw = "game = \"smb\"\n[agent]\nkind = \"chat\"\nmodel = \"gpt-4o\"\nidentity = \"gpt4o-run2\"";
    let config = GlobalConfig::from_toml_str(raw).unwrap();
    assert_eq!(config.agent.identity(), "gpt4o-run2");
}

#[test]
fn unknown_game_is_rejected() {
    let err = GlobalConfig::from_toml_str("game = \"pong\"").unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "got {err}");
}

#[test]
fn missing_game_is_rejected() {
    let err = GlobalConfig::from_toml_str("data_dir = \"x\"").unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "got {err}");
}

#[test]
fn zero_hyperparameter_is_rejected() {
    let err = GlobalConfig::from_toml_str("game = \"smb\"\n[session]\nsample_count = 0")
        .unwrap_err();
    assert!(err.to_string().contains("sample_count"), "got {err}");
}

#[test]
fn zero_stuck_threshold_is_rejected() {
    let err = GlobalConfig::from_toml_str("game = \"smb\"\nstuck_threshold = 0").unwrap_err();
    assert!(err.to_string().contains("stuck_threshold"), "got {err}");
}

#[test]
fn chat_agent_requires_model() {
    let err = GlobalConfig::from_toml_str("game = \"smb\"\n[agent]\nkind = \"chat\"").unwrap_err();
    assert!(err.to_string().contains("agent.model"), "got {err}");
}

#[test]
fn identity_with_path_separator_is_rejected() {
    let raw = "game = \"smb\"\n[agent]\nidentity = \"../escape\"";
    let err = GlobalConfig::from_toml_str(raw).unwrap_err();
    assert!(err.to_string().contains("file name"), "got {err}");
}

#[test]
fn human_agent_needs_no_credentials() {
    let mut config = GlobalConfig::from_toml_str("game = \"smb\"").unwrap();
    config.load_credentials().expect("nothing to load");
    assert!(config.agent.api_key.is_empty());
}

#[test]
fn missing_api_key_env_is_rejected() {
    let raw = "game = \"smb\"\n[agent]\nkind = \"chat\"\nmodel = \"m\"\napi_key_env = \"EMU_PILOT_TEST_UNSET_KEY\"";
    let mut config = GlobalConfig::from_toml_str(raw).unwrap();
    let err = config.load_credentials().unwrap_err();
    assert!(err.to_string().contains("EMU_PILOT_TEST_UNSET_KEY"), "got {err}");
}

#[test]
fn load_from_missing_path_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GlobalConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "got {err}");
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, sample_toml()).unwrap();

    let config = GlobalConfig::load_from_path(&path).unwrap();
    assert_eq!(config.session.sample_count, 4);
}
