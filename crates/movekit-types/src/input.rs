//! Host-provided samples consumed once per frame.

use serde::{Deserialize, Serialize};

use crate::math::{Pose, Quaternion, Vec2, Vec3};

/// Direction reported by a radial-scroll touchpad gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Clockwise,
    CounterClockwise,
}

/// Touchpad gesture currently recognised by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchGesture {
    Tap,
    Swipe,
    RadialScroll(ScrollDirection),
}

/// Primary touch point on the controller touchpad.
///
/// `position` is relative to the pad centre, each axis in `[-1, 1]`;
/// `force` is in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TouchSample {
    pub active: bool,
    pub position: Vec2,
    pub force: f32,
}

/// State of a handheld controller for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerSample {
    pub connected: bool,
    pub position: Vec3,
    pub orientation: Quaternion,
    pub touch: TouchSample,
    pub gesture: Option<TouchGesture>,
}

impl ControllerSample {
    /// A connected controller at `pose` with no touch activity.
    pub fn connected_at(pose: Pose) -> Self {
        Self {
            connected: true,
            position: pose.position,
            orientation: pose.rotation,
            touch: TouchSample::default(),
            gesture: None,
        }
    }

    /// A controller that is known to the host but not connected.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            position: Vec3::zero(),
            orientation: Quaternion::identity(),
            touch: TouchSample::default(),
            gesture: None,
        }
    }
}

/// Everything the host hands the movement component for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
    /// Tracked head (camera) pose; `None` when head tracking is unavailable.
    pub headpose: Option<Pose>,
    /// `None` when the host has no controller device at all.
    pub controller: Option<ControllerSample>,
}

impl FrameInput {
    /// A frame with head tracking at `headpose` and no controller.
    pub fn headpose_only(dt: f32, headpose: Pose) -> Self {
        Self {
            dt,
            headpose: Some(headpose),
            controller: None,
        }
    }

    pub fn with_controller(mut self, controller: ControllerSample) -> Self {
        self.controller = Some(controller);
        self
    }
}
