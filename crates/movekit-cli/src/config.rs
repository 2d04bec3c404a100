//! Demo configuration – reads/writes `~/.movekit/config.toml`.
//!
//! ```toml
//! frame_rate_hz = 60
//! frames = 600
//!
//! [movement]
//! interaction_mode = "six_dof"
//! input_driver = "controller"
//! collisions_enabled = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use movekit_runtime::MovementConfig;
use movekit_types::{InputDriver, InteractionMode, MoveError};
use serde::{Deserialize, Serialize};

/// Persisted demo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Simulated frame rate.
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    /// Frames to run before ending the session.
    #[serde(default = "default_frames")]
    pub frames: u32,

    #[serde(default)]
    pub movement: MovementConfig,
}

fn default_frame_rate_hz() -> u32 {
    60
}
fn default_frames() -> u32 {
    300
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_frame_rate_hz(),
            frames: default_frames(),
            movement: MovementConfig::default(),
        }
    }
}

impl CliConfig {
    /// Seconds per frame; a zero rate is treated as 1 Hz.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate_hz.max(1) as f32
    }
}

/// Return the path to `~/.movekit/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".movekit").join("config.toml")
}

/// Load the config at `path` with environment overrides applied.
/// `Ok(None)` when the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<CliConfig>, MoveError> {
    let mut cfg = read_from(path)?;
    if let Some(cfg) = cfg.as_mut() {
        apply_env_overrides(cfg);
    }
    Ok(cfg)
}

// The file as written, without environment overrides.
pub(crate) fn read_from(path: &Path) -> Result<Option<CliConfig>, MoveError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| MoveError::Config(format!("Failed to read config at {}: {e}", path.display())))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| MoveError::Config(format!("Failed to parse config: {e}")))
}

/// Save the config to `path`, creating the parent directory if necessary.
pub fn save_to(cfg: &CliConfig, path: &Path) -> Result<(), MoveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| MoveError::Config(format!("Failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| MoveError::Config(format!("Failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| MoveError::Config(format!("Failed to write config at {}: {e}", path.display())))
}

/// Apply `MOVEKIT_*` environment overrides.  Unparseable values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `MOVEKIT_MODE` | `movement.interaction_mode` (`three_dof` / `six_dof`) |
/// | `MOVEKIT_DRIVER` | `movement.input_driver` (`headpose` / `controller`) |
/// | `MOVEKIT_FRAME_RATE` | `frame_rate_hz` |
/// | `MOVEKIT_FRAMES` | `frames` |
pub fn apply_env_overrides(cfg: &mut CliConfig) {
    if let Ok(v) = std::env::var("MOVEKIT_MODE")
        && let Some(mode) = parse_mode(&v)
    {
        cfg.movement.interaction_mode = mode;
    }
    if let Ok(v) = std::env::var("MOVEKIT_DRIVER")
        && let Some(driver) = parse_driver(&v)
    {
        cfg.movement.input_driver = driver;
    }
    if let Ok(v) = std::env::var("MOVEKIT_FRAME_RATE")
        && let Ok(hz) = v.parse::<u32>()
        && hz > 0
    {
        cfg.frame_rate_hz = hz;
    }
    if let Ok(v) = std::env::var("MOVEKIT_FRAMES")
        && let Ok(frames) = v.parse::<u32>()
    {
        cfg.frames = frames;
    }
}

fn parse_mode(raw: &str) -> Option<InteractionMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "three_dof" | "3dof" => Some(InteractionMode::ThreeDof),
        "six_dof" | "6dof" => Some(InteractionMode::SixDof),
        _ => None,
    }
}

fn parse_driver(raw: &str) -> Option<InputDriver> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "headpose" => Some(InputDriver::Headpose),
        "controller" => Some(InputDriver::Controller),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut cfg = CliConfig::default();
        cfg.frames = 42;
        cfg.movement.collisions_enabled = true;
        cfg.movement.touch.depth_enabled = true;
        save_to(&cfg, &path).expect("save");

        let loaded = read_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.frames, 42);
        assert!(loaded.movement.collisions_enabled);
        assert!(loaded.movement.touch.depth_enabled);
    }

    #[test]
    fn saved_defaults_load_back_unchanged() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("nested").join("config.toml");
        save_to(&CliConfig::default(), &path).expect("save");
        assert_eq!(read_from(&path).expect("load ok"), Some(CliConfig::default()));
    }

    #[test]
    fn config_path_points_to_movekit_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".movekit"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "frames = \"many\"").expect("write");
        assert!(matches!(load_from(&path), Err(MoveError::Config(_))));
    }

    #[test]
    fn partial_file_takes_defaults() {
        let cfg: CliConfig = toml::from_str("[movement]\nauto_center = true\n").expect("parse");
        assert_eq!(cfg.frame_rate_hz, 60);
        assert_eq!(cfg.frames, 300);
        assert!(cfg.movement.auto_center);
        assert!(cfg.movement.run_on_start);
    }

    #[test]
    fn frame_dt_guards_zero_rate() {
        let cfg = CliConfig {
            frame_rate_hz: 0,
            ..CliConfig::default()
        };
        assert!((cfg.frame_dt() - 1.0).abs() < f32::EPSILON);
    }

    // One test owns all MOVEKIT_* variables so parallel tests never race.
    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        // SAFETY: this is the only test in the crate touching MOVEKIT_* vars.
        unsafe {
            std::env::set_var("MOVEKIT_MODE", "six_dof");
            std::env::set_var("MOVEKIT_DRIVER", "Controller");
            std::env::set_var("MOVEKIT_FRAME_RATE", "not-a-rate");
            std::env::set_var("MOVEKIT_FRAMES", "12");
        }
        let mut cfg = CliConfig::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.movement.interaction_mode, InteractionMode::SixDof);
        assert_eq!(cfg.movement.input_driver, InputDriver::Controller);
        assert_eq!(cfg.frame_rate_hz, 60);
        assert_eq!(cfg.frames, 12);

        unsafe {
            std::env::set_var("MOVEKIT_MODE", "four_dof");
            std::env::set_var("MOVEKIT_FRAME_RATE", "90");
        }
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.movement.interaction_mode, InteractionMode::SixDof);
        assert_eq!(cfg.frame_rate_hz, 90);

        unsafe {
            std::env::remove_var("MOVEKIT_MODE");
            std::env::remove_var("MOVEKIT_DRIVER");
            std::env::remove_var("MOVEKIT_FRAME_RATE");
            std::env::remove_var("MOVEKIT_FRAMES");
        }
    }
}
