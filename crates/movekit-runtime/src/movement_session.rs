//! [`MovementSession`] – one live engine session and its per-mode protocol.
//!
//! The DoF path is chosen once, at start, as a [`DofPath`] variant; every
//! later call dispatches on that variant instead of re-reading the config.

use movekit_hal::{ControlledObject, MovementEngine};
use movekit_types::{
    ControlSignal, ControllerSample, EndOutcome, EngineOp, InputDriver, InteractionMode,
    MoveError, MovementSettings, ObjectSnapshot, Pose, Quaternion, SessionHandle, SixDofSettings,
    ThreeDofSettings, Vec3,
};
use tracing::{debug, info};

use crate::control_sampler::{TouchAdjustment, six_dof_control, three_dof_control};

/// Degrees-of-freedom path of a session, with its engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DofPath {
    ThreeDof(ThreeDofSettings),
    SixDof(SixDofSettings),
}

impl DofPath {
    pub fn for_mode(mode: InteractionMode, auto_center: bool) -> Self {
        match mode {
            InteractionMode::ThreeDof => DofPath::ThreeDof(ThreeDofSettings { auto_center }),
            InteractionMode::SixDof => DofPath::SixDof(SixDofSettings { auto_center }),
        }
    }

    pub fn mode(&self) -> InteractionMode {
        match self {
            DofPath::ThreeDof(_) => InteractionMode::ThreeDof,
            DofPath::SixDof(_) => InteractionMode::SixDof,
        }
    }
}

/// A started engine session.  Owns the session handle exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementSession {
    handle: SessionHandle,
    path: DofPath,
    driver: InputDriver,
}

impl MovementSession {
    /// Orientation reported to the engine at start: identity for an object
    /// that is already upright, its normalized rotation otherwise.
    pub fn original_orientation(object: &dyn ControlledObject) -> Quaternion {
        if object.up().approx_eq(Vec3::up()) {
            Quaternion::identity()
        } else {
            object.pose().rotation.normalized()
        }
    }

    /// Snapshot `object` and open a session on `engine`.
    ///
    /// # Errors
    ///
    /// [`MoveError::Engine`] when the DoF-specific start call fails.
    pub fn start(
        engine: &mut dyn MovementEngine,
        settings: &MovementSettings,
        path: DofPath,
        driver: InputDriver,
        object: &dyn ControlledObject,
        headpose: Pose,
        controller: Option<&ControllerSample>,
    ) -> Result<Self, MoveError> {
        let snapshot = ObjectSnapshot {
            pose: object.pose(),
            original_orientation: Self::original_orientation(object),
        };

        let handle = match path {
            DofPath::ThreeDof(dof) => {
                let control = three_dof_control(driver, headpose, controller);
                engine
                    .start_3dof(settings, &dof, &control, &snapshot)
                    .map_err(MoveError::engine(EngineOp::Start3Dof))?
            }
            DofPath::SixDof(dof) => {
                let control = six_dof_control(driver, headpose, controller);
                engine
                    .start_6dof(settings, &dof, &control, &snapshot)
                    .map_err(MoveError::engine(EngineOp::Start6Dof))?
            }
        };

        info!(%handle, mode = %path.mode(), %driver, "movement session started");
        Ok(Self {
            handle,
            path,
            driver,
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn mode(&self) -> InteractionMode {
        self.path.mode()
    }

    /// Control signal for this frame, shaped for the session's path.
    pub fn control(&self, headpose: Pose, controller: Option<&ControllerSample>) -> ControlSignal {
        match self.path {
            DofPath::ThreeDof(_) => {
                ControlSignal::ThreeDof(three_dof_control(self.driver, headpose, controller))
            }
            DofPath::SixDof(_) => {
                ControlSignal::SixDof(six_dof_control(self.driver, headpose, controller))
            }
        }
    }

    /// Issue exactly one DoF update and return the engine's object pose.
    ///
    /// # Errors
    ///
    /// [`MoveError::Engine`] when the update call fails.
    pub fn update(
        &self,
        engine: &mut dyn MovementEngine,
        headpose: Pose,
        controller: Option<&ControllerSample>,
        dt: f32,
    ) -> Result<Pose, MoveError> {
        match self.control(headpose, controller) {
            ControlSignal::ThreeDof(control) => engine
                .update_3dof(self.handle, &control, dt)
                .map_err(MoveError::engine(EngineOp::Update3Dof)),
            ControlSignal::SixDof(control) => engine
                .update_6dof(self.handle, &control, dt)
                .map_err(MoveError::engine(EngineOp::Update6Dof)),
        }
    }

    /// Forward a touch adjustment to the engine.
    pub fn adjust(
        &self,
        engine: &mut dyn MovementEngine,
        adjustment: TouchAdjustment,
    ) -> Result<(), MoveError> {
        match adjustment {
            TouchAdjustment::Rotation { delta_rad } => engine
                .change_rotation(self.handle, delta_rad)
                .map_err(MoveError::engine(EngineOp::ChangeRotation)),
            TouchAdjustment::Depth { delta_m } => engine
                .change_depth(self.handle, delta_m)
                .map_err(MoveError::engine(EngineOp::ChangeDepth)),
        }
    }

    /// Ask the engine to end the session within `budget` seconds.
    ///
    /// The handle stays owned by `self`; callers drop the session once the
    /// outcome is terminal.
    pub fn end(&self, engine: &mut dyn MovementEngine, budget: f32) -> Result<EndOutcome, MoveError> {
        let outcome = engine
            .end(self.handle, budget)
            .map_err(MoveError::engine(EngineOp::End))?;
        debug!(handle = %self.handle, ?outcome, "engine end answered");
        Ok(outcome)
    }
}
