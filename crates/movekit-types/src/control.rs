//! Data exchanged with the movement engine: session settings, per-mode
//! control signals, and the engine's answer to an `end` request.

use serde::{Deserialize, Serialize};

use crate::math::{Pose, Quaternion, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Engine settings
// ────────────────────────────────────────────────────────────────────────────

/// Session-wide tuning handed to the engine when a session starts.
///
/// Angles are radians, distances metres, times seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSettings {
    /// Number of frames kept for sway smoothing.
    #[serde(default = "default_sway_history_size")]
    pub sway_history_size: u32,
    /// Largest angular step the engine applies per update.
    #[serde(default = "default_max_delta_angle")]
    pub max_delta_angle: f32,
    /// How aggressively the object converges on its target (1/s).
    #[serde(default = "default_control_dampening_factor")]
    pub control_dampening_factor: f32,
    #[serde(default = "default_max_sway_angle")]
    pub max_sway_angle: f32,
    /// Headpose rotation speed (rad/s) above which control input is ignored.
    #[serde(default = "default_max_headpose_rotation_speed")]
    pub max_headpose_rotation_speed: f32,
    /// Headpose translation speed (m/s) above which control input is ignored.
    #[serde(default = "default_max_headpose_movement_speed")]
    pub max_headpose_movement_speed: f32,
    #[serde(default = "default_max_depth_delta_for_sway")]
    pub max_depth_delta_for_sway: f32,
    /// Closest the object may be placed to the user.
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    /// Farthest the object may be placed from the user.
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "default_max_sway_time_s")]
    pub max_sway_time_s: f32,
    /// Time budget after which a pending `end` resolves as a timeout.
    #[serde(default = "default_end_resolve_timeout_s")]
    pub end_resolve_timeout_s: f32,
}

fn default_sway_history_size() -> u32 {
    30
}
fn default_max_delta_angle() -> f32 {
    30f32.to_radians()
}
fn default_control_dampening_factor() -> f32 {
    3.0
}
fn default_max_sway_angle() -> f32 {
    30f32.to_radians()
}
fn default_max_headpose_rotation_speed() -> f32 {
    300f32.to_radians()
}
fn default_max_headpose_movement_speed() -> f32 {
    0.75
}
fn default_max_depth_delta_for_sway() -> f32 {
    0.1
}
fn default_min_distance() -> f32 {
    0.5
}
fn default_max_distance() -> f32 {
    15.0
}
fn default_max_sway_time_s() -> f32 {
    0.15
}
fn default_end_resolve_timeout_s() -> f32 {
    10.0
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            sway_history_size: default_sway_history_size(),
            max_delta_angle: default_max_delta_angle(),
            control_dampening_factor: default_control_dampening_factor(),
            max_sway_angle: default_max_sway_angle(),
            max_headpose_rotation_speed: default_max_headpose_rotation_speed(),
            max_headpose_movement_speed: default_max_headpose_movement_speed(),
            max_depth_delta_for_sway: default_max_depth_delta_for_sway(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            max_sway_time_s: default_max_sway_time_s(),
            end_resolve_timeout_s: default_end_resolve_timeout_s(),
        }
    }
}

impl MovementSettings {
    /// Check that every limit is finite and in range.
    ///
    /// Returns a description of the first offending field.
    pub fn check(&self) -> Result<(), String> {
        let positive = [
            ("max_delta_angle", self.max_delta_angle),
            ("control_dampening_factor", self.control_dampening_factor),
            ("max_sway_angle", self.max_sway_angle),
            ("max_headpose_rotation_speed", self.max_headpose_rotation_speed),
            ("max_headpose_movement_speed", self.max_headpose_movement_speed),
            ("max_depth_delta_for_sway", self.max_depth_delta_for_sway),
            ("max_distance", self.max_distance),
            ("max_sway_time_s", self.max_sway_time_s),
            ("end_resolve_timeout_s", self.end_resolve_timeout_s),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive finite number, got {value}"));
            }
        }
        if self.sway_history_size == 0 {
            return Err("sway_history_size must be at least 1".to_string());
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(format!("min_distance must be >= 0, got {}", self.min_distance));
        }
        if self.min_distance > self.max_distance {
            return Err(format!(
                "min_distance {} exceeds max_distance {}",
                self.min_distance, self.max_distance
            ));
        }
        Ok(())
    }
}

/// Settings specific to a three-degrees-of-freedom session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreeDofSettings {
    /// Re-center the object in front of the user when it drifts out of view.
    pub auto_center: bool,
}

/// Settings specific to a six-degrees-of-freedom session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SixDofSettings {
    pub auto_center: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Control signals
// ────────────────────────────────────────────────────────────────────────────

/// Per-frame control input for a 3DoF session: the object orbits the head
/// along the control ray.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreeDofControl {
    pub headpose_position: Vec3,
    pub control_rotation: Quaternion,
}

/// Per-frame control input for a 6DoF session: the object follows the full
/// control pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SixDofControl {
    pub headpose_position: Vec3,
    pub headpose_rotation: Quaternion,
    pub control_position: Vec3,
    pub control_rotation: Quaternion,
}

/// A control signal of either shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlSignal {
    ThreeDof(ThreeDofControl),
    SixDof(SixDofControl),
}

// ────────────────────────────────────────────────────────────────────────────
// Object snapshot / end outcome
// ────────────────────────────────────────────────────────────────────────────

/// The controlled object as it was when a session started.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub pose: Pose,
    /// Identity when the object was already upright, otherwise its
    /// normalized rotation at start.
    pub original_orientation: Quaternion,
}

/// Successful answer to an engine `end` request.
///
/// Every variant carries the pose the engine computed for this call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndOutcome {
    /// The session is finished; the handle is no longer valid.
    Completed(Pose),
    /// The object is still settling; call `end` again next frame.
    Pending(Pose),
    /// The time budget ran out; the session is finished.
    TimedOut(Pose),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass_check() {
        assert!(MovementSettings::default().check().is_ok());
    }

    #[test]
    fn inverted_distance_range_is_rejected() {
        let settings = MovementSettings {
            min_distance: 5.0,
            max_distance: 1.0,
            ..MovementSettings::default()
        };
        let err = settings.check().unwrap_err();
        assert!(err.contains("min_distance"));
    }

    #[test]
    fn non_finite_limit_is_rejected() {
        let settings = MovementSettings {
            end_resolve_timeout_s: f32::NAN,
            ..MovementSettings::default()
        };
        assert!(settings.check().is_err());
    }

    #[test]
    fn partial_settings_fill_defaults() {
        let settings: MovementSettings =
            serde_json::from_str(r#"{ "max_distance": 4.0 }"#).unwrap();
        assert!((settings.max_distance - 4.0).abs() < f32::EPSILON);
        assert_eq!(settings.sway_history_size, 30);
    }
}
