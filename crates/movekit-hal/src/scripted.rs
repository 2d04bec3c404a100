//! [`ScriptedEngine`] – a call-recording [`MovementEngine`] for tests.
//!
//! Every call is appended to an in-memory log as an [`EngineCall`].  By
//! default every call succeeds; individual operations can be made to fail
//! once with [`ScriptedEngine::fail_next`], and the answers of
//! [`MovementEngine::end`] can be queued with [`ScriptedEngine::push_end`].
//!
//! # Stub behaviour
//!
//! | Call | Default answer |
//! |---|---|
//! | `start_*` | a fresh [`SessionHandle`], which becomes the active session |
//! | `update_6dof` | the control pose |
//! | `update_3dof` | one metre along the control ray from the head |
//! | `start_*_collision` | a fresh [`CollisionHandle`] |
//! | `end` | [`EndOutcome::Completed`] with the last returned pose |
//!
//! Calls carrying a handle other than the active session's fail with
//! [`EngineFault::InvalidHandle`].
//!
//! # Example
//!
//! ```rust
//! use movekit_hal::scripted::ScriptedEngine;
//! use movekit_hal::MovementEngine;
//! use movekit_types::{EngineOp, MovementSettings, ObjectSnapshot, SixDofControl, SixDofSettings};
//!
//! let mut engine = ScriptedEngine::new();
//! let handle = engine
//!     .start_6dof(
//!         &MovementSettings::default(),
//!         &SixDofSettings::default(),
//!         &SixDofControl::default(),
//!         &ObjectSnapshot::default(),
//!     )
//!     .unwrap();
//! assert_eq!(engine.active_session(), Some(handle));
//! assert_eq!(engine.count(EngineOp::Start6Dof), 1);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use movekit_types::{
    CollisionHandle, EndOutcome, EngineFault, EngineOp, MovementSettings, ObjectSnapshot, Pose,
    SessionHandle, SixDofControl, SixDofSettings, ThreeDofControl, ThreeDofSettings, Vec3,
};

use crate::engine::MovementEngine;

/// One recorded engine call with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Start3Dof {
        dof: ThreeDofSettings,
        control: ThreeDofControl,
        object: ObjectSnapshot,
    },
    Start6Dof {
        dof: SixDofSettings,
        control: SixDofControl,
        object: ObjectSnapshot,
    },
    Update3Dof {
        handle: SessionHandle,
        control: ThreeDofControl,
        dt: f32,
    },
    Update6Dof {
        handle: SessionHandle,
        control: SixDofControl,
        dt: f32,
    },
    ChangeRotation {
        handle: SessionHandle,
        delta_rad: f32,
    },
    ChangeDepth {
        handle: SessionHandle,
        delta_m: f32,
    },
    StartHardCollision {
        handle: SessionHandle,
        normal: Vec3,
    },
    UpdateHardCollision {
        handle: SessionHandle,
        collision: CollisionHandle,
        normal: Vec3,
    },
    StartSoftCollision {
        handle: SessionHandle,
        other_center: Vec3,
        closest_distance: f32,
        max_distance: f32,
    },
    EndCollision {
        handle: SessionHandle,
        collision: CollisionHandle,
    },
    End {
        handle: SessionHandle,
        dt: f32,
    },
}

impl EngineCall {
    /// The operation this call belongs to.
    pub fn op(&self) -> EngineOp {
        match self {
            EngineCall::Start3Dof { .. } => EngineOp::Start3Dof,
            EngineCall::Start6Dof { .. } => EngineOp::Start6Dof,
            EngineCall::Update3Dof { .. } => EngineOp::Update3Dof,
            EngineCall::Update6Dof { .. } => EngineOp::Update6Dof,
            EngineCall::ChangeRotation { .. } => EngineOp::ChangeRotation,
            EngineCall::ChangeDepth { .. } => EngineOp::ChangeDepth,
            EngineCall::StartHardCollision { .. } => EngineOp::StartHardCollision,
            EngineCall::UpdateHardCollision { .. } => EngineOp::UpdateHardCollision,
            EngineCall::StartSoftCollision { .. } => EngineOp::StartSoftCollision,
            EngineCall::EndCollision { .. } => EngineOp::EndCollision,
            EngineCall::End { .. } => EngineOp::End,
        }
    }
}

/// Call-recording engine with scripted answers.
#[derive(Default)]
pub struct ScriptedEngine {
    calls: Vec<EngineCall>,
    faults: HashMap<EngineOp, VecDeque<EngineFault>>,
    end_outcomes: VecDeque<EndOutcome>,
    update_pose: Option<Pose>,
    active: Option<SessionHandle>,
    collisions: HashSet<CollisionHandle>,
    last_pose: Pose,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `op` fail with `fault`.  Queued faults are
    /// consumed in order, one per call.
    pub fn fail_next(&mut self, op: EngineOp, fault: EngineFault) {
        self.faults.entry(op).or_default().push_back(fault);
    }

    /// Queue the answer of the next successful `end` call.
    pub fn push_end(&mut self, outcome: EndOutcome) {
        self.end_outcomes.push_back(outcome);
    }

    /// Answer every subsequent update with `pose` instead of echoing the
    /// control signal.
    pub fn set_update_pose(&mut self, pose: Pose) {
        self.update_pose = Some(pose);
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Calls of one operation, oldest first.
    pub fn calls_of(&self, op: EngineOp) -> Vec<&EngineCall> {
        self.calls.iter().filter(|c| c.op() == op).collect()
    }

    pub fn count(&self, op: EngineOp) -> usize {
        self.calls.iter().filter(|c| c.op() == op).count()
    }

    /// Forget the call log (scripted faults and outcomes are kept).
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Handle of the session the engine currently considers alive.
    pub fn active_session(&self) -> Option<SessionHandle> {
        self.active
    }

    /// Number of collision sessions started and not yet ended.
    pub fn open_collisions(&self) -> usize {
        self.collisions.len()
    }

    // Record `call`, then apply any scripted fault and the handle check.
    fn admit(&mut self, call: EngineCall, handle: Option<SessionHandle>) -> Result<(), EngineFault> {
        let op = call.op();
        self.calls.push(call);
        if let Some(fault) = self.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            return Err(fault);
        }
        match handle {
            Some(h) if self.active != Some(h) => Err(EngineFault::InvalidHandle),
            _ => Ok(()),
        }
    }

    fn open_session(&mut self, pose: Pose) -> SessionHandle {
        let handle = SessionHandle::new();
        self.active = Some(handle);
        self.collisions.clear();
        self.last_pose = pose;
        handle
    }

    fn answer_update(&mut self, computed: Pose) -> Pose {
        let pose = self.update_pose.unwrap_or(computed);
        self.last_pose = pose;
        pose
    }

    fn open_collision(&mut self) -> CollisionHandle {
        let collision = CollisionHandle::new();
        self.collisions.insert(collision);
        collision
    }
}

impl MovementEngine for ScriptedEngine {
    fn start_3dof(
        &mut self,
        _settings: &MovementSettings,
        dof: &ThreeDofSettings,
        control: &ThreeDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault> {
        self.admit(
            EngineCall::Start3Dof {
                dof: *dof,
                control: *control,
                object: *object,
            },
            None,
        )?;
        Ok(self.open_session(object.pose))
    }

    fn start_6dof(
        &mut self,
        _settings: &MovementSettings,
        dof: &SixDofSettings,
        control: &SixDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault> {
        self.admit(
            EngineCall::Start6Dof {
                dof: *dof,
                control: *control,
                object: *object,
            },
            None,
        )?;
        Ok(self.open_session(object.pose))
    }

    fn update_3dof(
        &mut self,
        handle: SessionHandle,
        control: &ThreeDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault> {
        self.admit(
            EngineCall::Update3Dof {
                handle,
                control: *control,
                dt,
            },
            Some(handle),
        )?;
        let position =
            control.headpose_position + control.control_rotation.rotate(Vec3::forward());
        Ok(self.answer_update(Pose::new(position, control.control_rotation)))
    }

    fn update_6dof(
        &mut self,
        handle: SessionHandle,
        control: &SixDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault> {
        self.admit(
            EngineCall::Update6Dof {
                handle,
                control: *control,
                dt,
            },
            Some(handle),
        )?;
        Ok(self.answer_update(Pose::new(control.control_position, control.control_rotation)))
    }

    fn change_rotation(&mut self, handle: SessionHandle, delta_rad: f32) -> Result<(), EngineFault> {
        self.admit(EngineCall::ChangeRotation { handle, delta_rad }, Some(handle))
    }

    fn change_depth(&mut self, handle: SessionHandle, delta_m: f32) -> Result<(), EngineFault> {
        self.admit(EngineCall::ChangeDepth { handle, delta_m }, Some(handle))
    }

    fn start_hard_collision(
        &mut self,
        handle: SessionHandle,
        normal: Vec3,
    ) -> Result<CollisionHandle, EngineFault> {
        self.admit(EngineCall::StartHardCollision { handle, normal }, Some(handle))?;
        Ok(self.open_collision())
    }

    fn update_hard_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
        normal: Vec3,
    ) -> Result<(), EngineFault> {
        self.admit(
            EngineCall::UpdateHardCollision {
                handle,
                collision,
                normal,
            },
            Some(handle),
        )?;
        if self.collisions.contains(&collision) {
            Ok(())
        } else {
            Err(EngineFault::InvalidHandle)
        }
    }

    fn start_soft_collision(
        &mut self,
        handle: SessionHandle,
        other_center: Vec3,
        closest_distance: f32,
        max_distance: f32,
    ) -> Result<CollisionHandle, EngineFault> {
        self.admit(
            EngineCall::StartSoftCollision {
                handle,
                other_center,
                closest_distance,
                max_distance,
            },
            Some(handle),
        )?;
        Ok(self.open_collision())
    }

    fn end_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
    ) -> Result<(), EngineFault> {
        self.admit(EngineCall::EndCollision { handle, collision }, Some(handle))?;
        if self.collisions.remove(&collision) {
            Ok(())
        } else {
            Err(EngineFault::InvalidHandle)
        }
    }

    fn end(&mut self, handle: SessionHandle, dt: f32) -> Result<EndOutcome, EngineFault> {
        self.admit(EngineCall::End { handle, dt }, Some(handle))?;
        let outcome = self
            .end_outcomes
            .pop_front()
            .unwrap_or(EndOutcome::Completed(self.last_pose));
        if matches!(outcome, EndOutcome::Completed(_) | EndOutcome::TimedOut(_)) {
            self.active = None;
            self.collisions.clear();
        }
        Ok(outcome)
    }
}
