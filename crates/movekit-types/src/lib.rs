//! `movekit-types` – shared vocabulary for the MoveKit crates.
//!
//! # Modules
//!
//! - [`math`] – vectors, quaternions, poses and collider bounds.
//! - [`control`] – engine settings, per-mode control signals, end outcomes.
//! - [`input`] – per-frame host samples (head pose, controller, touchpad).
//! - [`collision`] – contact / proximity notifications.
//!
//! Identifiers and the error taxonomy live at the crate root.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod collision;
pub mod control;
pub mod input;
pub mod math;

pub use collision::{
    CollisionKind, ContactEvent, ContactPoint, MovementColliderMarker, ProximityEvent,
};
pub use control::{
    ControlSignal, EndOutcome, MovementSettings, ObjectSnapshot, SixDofControl, SixDofSettings,
    ThreeDofControl, ThreeDofSettings,
};
pub use input::{ControllerSample, FrameInput, ScrollDirection, TouchGesture, TouchSample};
pub use math::{Bounds, Pose, Quaternion, Vec2, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Opaque handle of a movement session inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub Uuid);

impl SessionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Opaque handle of a collision session inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionHandle(pub Uuid);

impl CollisionHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CollisionHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CollisionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "collision:{}", self.0)
    }
}

/// Host identity of a scene object (stable for the object's lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub i64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Modes
// ────────────────────────────────────────────────────────────────────────────

/// Degrees-of-freedom model of a movement session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Object orbits the user; only the control rotation matters.
    #[default]
    ThreeDof,
    /// Object follows the full control pose.
    SixDof,
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionMode::ThreeDof => write!(f, "3dof"),
            InteractionMode::SixDof => write!(f, "6dof"),
        }
    }
}

/// Which tracked input steers the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputDriver {
    #[default]
    Headpose,
    Controller,
}

impl std::fmt::Display for InputDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputDriver::Headpose => write!(f, "headpose"),
            InputDriver::Controller => write!(f, "controller"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine operations
// ────────────────────────────────────────────────────────────────────────────

/// Every call on the movement-engine surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOp {
    Start3Dof,
    Start6Dof,
    Update3Dof,
    Update6Dof,
    ChangeRotation,
    ChangeDepth,
    StartHardCollision,
    UpdateHardCollision,
    StartSoftCollision,
    EndCollision,
    End,
}

impl EngineOp {
    pub fn name(self) -> &'static str {
        match self {
            EngineOp::Start3Dof => "start_3dof",
            EngineOp::Start6Dof => "start_6dof",
            EngineOp::Update3Dof => "update_3dof",
            EngineOp::Update6Dof => "update_6dof",
            EngineOp::ChangeRotation => "change_rotation",
            EngineOp::ChangeDepth => "change_depth",
            EngineOp::StartHardCollision => "start_hard_collision",
            EngineOp::UpdateHardCollision => "update_hard_collision",
            EngineOp::StartSoftCollision => "start_soft_collision",
            EngineOp::EndCollision => "end_collision",
            EngineOp::End => "end",
        }
    }
}

impl std::fmt::Display for EngineOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Non-success status returned by the movement engine.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineFault {
    #[error("invalid handle")]
    InvalidHandle,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("operation not allowed: {0}")]
    NotAllowed(String),

    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Everything that can disable a movement component.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MoveError {
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Collisions enabled but controlled object has no {0}")]
    MissingPhysics(&'static str),

    #[error("Duplicate {kind} collision session for object {object}")]
    DuplicateCollision { kind: CollisionKind, object: ObjectId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Engine call {operation} failed: {source}")]
    Engine {
        operation: EngineOp,
        #[source]
        source: EngineFault,
    },

    #[error("Configuration Error: {0}")]
    Config(String),
}

impl MoveError {
    /// Wrap an engine fault with the name of the failing call.
    pub fn engine(operation: EngineOp) -> impl FnOnce(EngineFault) -> Self {
        move |source| MoveError::Engine { operation, source }
    }
}
