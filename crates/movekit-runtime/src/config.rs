//! [`MovementConfig`] – the recognised options of a movement component.
//!
//! The config is plain serde data so hosts can embed it in their own files;
//! [`MovementConfig::from_toml_str`] parses the standalone TOML form:
//!
//! ```toml
//! interaction_mode = "six_dof"
//! input_driver = "controller"
//! collisions_enabled = true
//!
//! [touch]
//! depth_enabled = true
//! max_depth_delta = 0.1
//!
//! [engine]
//! max_distance = 8.0
//! ```
//!
//! Every field is optional; missing ones take the defaults below.

use movekit_types::{InputDriver, InteractionMode, MoveError, MovementSettings};
use serde::{Deserialize, Serialize};

/// Touchpad adjustments applied on top of the tracked control pose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchConfig {
    /// Swipe up/down on the touchpad to push/pull the object.
    #[serde(default)]
    pub depth_enabled: bool,

    /// Largest depth change per frame, in metres (reached at full force).
    #[serde(default = "default_max_depth_delta")]
    pub max_depth_delta: f32,

    /// Radial scroll on the touchpad to spin the object.
    #[serde(default)]
    pub rotation_enabled: bool,

    /// Largest rotation change per frame, in degrees.
    #[serde(default = "default_max_rotation_delta")]
    pub max_rotation_delta: f32,
}

fn default_max_depth_delta() -> f32 {
    0.1
}
fn default_max_rotation_delta() -> f32 {
    10.0
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            depth_enabled: false,
            max_depth_delta: default_max_depth_delta(),
            rotation_enabled: false,
            max_rotation_delta: default_max_rotation_delta(),
        }
    }
}

/// Options of one movement component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    #[serde(default)]
    pub interaction_mode: InteractionMode,

    #[serde(default)]
    pub input_driver: InputDriver,

    /// Start a session as soon as the component is attached.
    #[serde(default = "default_run_on_start")]
    pub run_on_start: bool,

    /// Track hard/soft collisions and write poses through the rigidbody.
    #[serde(default)]
    pub collisions_enabled: bool,

    #[serde(default)]
    pub auto_center: bool,

    #[serde(default)]
    pub touch: TouchConfig,

    /// Tuning forwarded to the engine at session start.
    #[serde(default)]
    pub engine: MovementSettings,
}

fn default_run_on_start() -> bool {
    true
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            interaction_mode: InteractionMode::default(),
            input_driver: InputDriver::default(),
            run_on_start: default_run_on_start(),
            collisions_enabled: false,
            auto_center: false,
            touch: TouchConfig::default(),
            engine: MovementSettings::default(),
        }
    }
}

impl MovementConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Config`] when the document is malformed or names
    /// an unknown mode / driver.
    pub fn from_toml_str(raw: &str) -> Result<Self, MoveError> {
        toml::from_str(raw).map_err(|e| MoveError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject values the session cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), MoveError> {
        let touch = &self.touch;
        if !touch.max_depth_delta.is_finite() || touch.max_depth_delta < 0.0 {
            return Err(MoveError::InvalidConfig(format!(
                "touch.max_depth_delta must be >= 0, got {}",
                touch.max_depth_delta
            )));
        }
        if !touch.max_rotation_delta.is_finite() || touch.max_rotation_delta < 0.0 {
            return Err(MoveError::InvalidConfig(format!(
                "touch.max_rotation_delta must be >= 0, got {}",
                touch.max_rotation_delta
            )));
        }
        self.engine
            .check()
            .map_err(|e| MoveError::InvalidConfig(format!("engine.{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = MovementConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, MovementConfig::default());
        assert!(cfg.run_on_start);
        assert!(!cfg.collisions_enabled);
    }

    #[test]
    fn parses_modes_and_tables() {
        let cfg = MovementConfig::from_toml_str(
            r#"
            interaction_mode = "six_dof"
            input_driver = "controller"
            collisions_enabled = true

            [touch]
            rotation_enabled = true
            max_rotation_delta = 5.0

            [engine]
            max_distance = 8.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.interaction_mode, InteractionMode::SixDof);
        assert_eq!(cfg.input_driver, InputDriver::Controller);
        assert!(cfg.collisions_enabled);
        assert!(cfg.touch.rotation_enabled);
        assert!(!cfg.touch.depth_enabled);
        assert!((cfg.touch.max_rotation_delta - 5.0).abs() < f32::EPSILON);
        assert!((cfg.engine.max_distance - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_mode_is_a_config_error() {
        let err = MovementConfig::from_toml_str(r#"interaction_mode = "four_dof""#).unwrap_err();
        assert!(matches!(err, MoveError::Config(_)));
    }

    #[test]
    fn negative_touch_delta_fails_validation() {
        let mut cfg = MovementConfig::default();
        cfg.touch.max_depth_delta = -1.0;
        assert!(matches!(cfg.validate(), Err(MoveError::InvalidConfig(_))));
    }

    #[test]
    fn bad_engine_settings_fail_validation() {
        let mut cfg = MovementConfig::default();
        cfg.engine.max_distance = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("engine.max_distance"));
    }

    #[test]
    fn roundtrips_through_toml() {
        let mut cfg = MovementConfig::default();
        cfg.interaction_mode = InteractionMode::SixDof;
        cfg.touch.depth_enabled = true;
        let raw = toml::to_string_pretty(&cfg).unwrap();
        let back = MovementConfig::from_toml_str(&raw).unwrap();
        assert_eq!(back, cfg);
    }
}
