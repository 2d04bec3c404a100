//! [`MovementController`] – the session lifecycle state machine.
//!
//! ```text
//!            start_movement_session
//!  ShutDown ───────────────────────▶ Running ──┐ update (touch, then DoF update)
//!     ▲  ▲                            │  ▲     │
//!     │  │   end: Completed/TimedOut  │  └─────┘
//!     │  └────────────────────────────┤
//!     │                               │ end: Pending
//!     │   end: Completed/TimedOut     ▼
//!     └──────────────────────── PendingShutDown ◀─┐ update polls end
//!                                        └────────┘
//! ```
//!
//! Every failure is handled where it happens: the controller logs it, stores
//! it as [`last_error`][MovementController::last_error] and disables itself.
//! A disabled controller ignores [`update`][MovementController::update]
//! until [`enable`][MovementController::enable] or a successful restart.
//! Nothing is retried.

use movekit_hal::{ControlledObject, MovementEngine};
use movekit_types::{
    CollisionKind, ContactEvent, EndOutcome, FrameInput, MoveError, ObjectId, Pose,
    ProximityEvent, SessionHandle,
};
use tracing::{debug, error, info, warn};

use crate::collision_ledger::CollisionLedger;
use crate::config::MovementConfig;
use crate::control_sampler::ControlSampler;
use crate::movement_session::{DofPath, MovementSession};

/// Lifecycle state of a [`MovementController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    Running,
    PendingShutDown,
    #[default]
    ShutDown,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Running => write!(f, "running"),
            SessionState::PendingShutDown => write!(f, "pending_shut_down"),
            SessionState::ShutDown => write!(f, "shut_down"),
        }
    }
}

/// Drives one controlled object through movement sessions on one engine.
///
/// Hosts call [`update`][Self::update] once per frame and forward their
/// contact / proximity notifications to the `on_*` callbacks.  Dropping the
/// controller performs a forced [`teardown`][Self::teardown].
pub struct MovementController<E: MovementEngine, O: ControlledObject> {
    config: MovementConfig,
    engine: E,
    object: O,
    state: SessionState,
    enabled: bool,
    last_error: Option<MoveError>,
    session: Option<MovementSession>,
    ledger: CollisionLedger,
    sampler: ControlSampler,
}

impl<E: MovementEngine, O: ControlledObject> MovementController<E, O> {
    /// Create an idle (`ShutDown`, enabled) controller.
    pub fn new(config: MovementConfig, engine: E, object: O) -> Self {
        let sampler = ControlSampler::new(config.touch.clone());
        Self {
            config,
            engine,
            object,
            state: SessionState::ShutDown,
            enabled: true,
            last_error: None,
            session: None,
            ledger: CollisionLedger::new(),
            sampler,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn object(&self) -> &O {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut O {
        &mut self.object
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The failure that disabled the controller, if any.
    pub fn last_error(&self) -> Option<&MoveError> {
        self.last_error.as_ref()
    }

    /// The live session while `Running` or `PendingShutDown`.
    pub fn session(&self) -> Option<&MovementSession> {
        self.session.as_ref()
    }

    pub fn ledger(&self) -> &CollisionLedger {
        &self.ledger
    }

    /// Clear the recorded failure and resume per-frame updates.
    pub fn enable(&mut self) {
        if !self.enabled {
            info!(state = %self.state, "movement component re-enabled");
        }
        self.enabled = true;
        self.last_error = None;
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Host attach hook: starts a session when `run_on_start` is set.
    pub fn on_start(&mut self, frame: &FrameInput) {
        if self.config.run_on_start {
            self.start_movement_session(frame);
        }
    }

    /// `ShutDown → Running`.  A no-op (with a warning) in any other state.
    ///
    /// A successful start also clears an earlier failure.
    pub fn start_movement_session(&mut self, frame: &FrameInput) {
        if self.state != SessionState::ShutDown {
            warn!(state = %self.state, "movement session already active, start ignored");
            return;
        }
        match self.open_session(frame) {
            Ok(session) => {
                self.session = Some(session);
                self.state = SessionState::Running;
                self.sampler = ControlSampler::new(self.config.touch.clone());
                self.enabled = true;
                self.last_error = None;
            }
            Err(err) => self.fail("start movement session", err),
        }
    }

    /// Advance one frame.
    ///
    /// `Running` applies at most one touch adjustment, then exactly one DoF
    /// update, then writes the returned pose.  `PendingShutDown` polls the
    /// engine end with the frame's `dt`.
    pub fn update(&mut self, frame: &FrameInput) {
        if !self.enabled {
            return;
        }
        match self.state {
            SessionState::Running => {
                if let Err(err) = self.tick(frame) {
                    self.fail("update", err);
                }
            }
            SessionState::PendingShutDown => self.end_movement_session(frame.dt, false),
            SessionState::ShutDown => {}
        }
    }

    /// End the session.
    ///
    /// Graceful (`force_end == false`): ends hard collisions only and hands
    /// the engine `dt` seconds to settle, which may leave the controller in
    /// `PendingShutDown`.  Forced: ends every collision and hands the
    /// engine an unbounded budget.
    pub fn end_movement_session(&mut self, dt: f32, force_end: bool) {
        if self.state == SessionState::ShutDown {
            warn!("no movement session to end, end ignored");
            return;
        }
        if let Err(err) = self.close_session(dt, force_end) {
            self.fail("end movement session", err);
        }
    }

    /// Forced end for component destruction.  Runs whether or not the
    /// controller is enabled; does nothing once `ShutDown`.
    pub fn teardown(&mut self) {
        if self.state == SessionState::ShutDown {
            return;
        }
        info!(state = %self.state, "tearing down movement session");
        self.end_movement_session(0.0, true);
    }

    // ── Collision callbacks ─────────────────────────────────────────────────

    /// First contact with another object.
    pub fn on_contact_enter(&mut self, event: &ContactEvent) {
        let Some(session) = self.collision_session(event.marker.is_some()) else {
            return;
        };
        let Some(normal) = event.first_normal() else {
            debug!(object = %event.other, "contact without contact points ignored");
            return;
        };
        if let Err(err) = self
            .ledger
            .begin_hard(&mut self.engine, session, event.other, normal)
        {
            self.fail("contact enter", err);
        }
    }

    /// Continued contact; refreshes the normal of a tracked collision.
    pub fn on_contact_stay(&mut self, event: &ContactEvent) {
        let Some(session) = self.collision_session(event.marker.is_some()) else {
            return;
        };
        let Some(normal) = event.first_normal() else {
            return;
        };
        if let Err(err) = self
            .ledger
            .refresh_hard(&mut self.engine, session, event.other, normal)
        {
            self.fail("contact stay", err);
        }
    }

    pub fn on_contact_exit(&mut self, other: ObjectId) {
        self.finish_collision(CollisionKind::Hard, other, "contact exit");
    }

    /// Entering the proximity zone of another object.
    pub fn on_proximity_enter(&mut self, event: &ProximityEvent) {
        let Some(session) = self.collision_session(event.marker.is_some()) else {
            return;
        };
        let Some(marker) = event.marker else {
            return;
        };
        let result = self
            .object
            .collider_bounds()
            .ok_or(MoveError::MissingPhysics("collider"))
            .and_then(|own| {
                let other_center = event.other_bounds.center;
                let max_distance = own.center.distance(other_center);
                let closest_distance = max_distance * (marker.max_depth_percent / 100.0);
                self.ledger.begin_soft(
                    &mut self.engine,
                    session,
                    event.other,
                    other_center,
                    closest_distance,
                    max_distance,
                )
            });
        if let Err(err) = result {
            self.fail("proximity enter", err);
        }
    }

    pub fn on_proximity_exit(&mut self, other: ObjectId) {
        self.finish_collision(CollisionKind::Soft, other, "proximity exit");
    }

    /// End every tracked collision of `kinds`.  The listed ledgers are
    /// cleared even when an end call fails; the failure disables the
    /// controller.
    pub fn end_all_collisions(&mut self, kinds: &[CollisionKind]) {
        let Some(session) = self.session.as_ref().map(MovementSession::handle) else {
            for &kind in kinds {
                self.ledger.clear(kind);
            }
            return;
        };
        if let Err(err) = self.ledger.end_all(&mut self.engine, session, kinds) {
            self.fail("end collisions", err);
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn fail(&mut self, context: &'static str, err: MoveError) {
        error!(context, state = %self.state, error = %err, "movement component disabled");
        self.enabled = false;
        self.last_error = Some(err);
    }

    // Session handle for a collision callback, or `None` when the event
    // must be ignored.
    fn collision_session(&self, marked: bool) -> Option<SessionHandle> {
        if !self.config.collisions_enabled || !marked || self.state == SessionState::ShutDown {
            return None;
        }
        self.session.as_ref().map(MovementSession::handle)
    }

    fn finish_collision(&mut self, kind: CollisionKind, other: ObjectId, context: &'static str) {
        if !self.config.collisions_enabled {
            return;
        }
        let Some(session) = self.session.as_ref().map(MovementSession::handle) else {
            return;
        };
        if let Err(err) = self.ledger.finish(&mut self.engine, session, kind, other) {
            self.fail(context, err);
        }
    }

    fn open_session(&mut self, frame: &FrameInput) -> Result<MovementSession, MoveError> {
        self.config.validate()?;
        let headpose = frame
            .headpose
            .ok_or(MoveError::MissingCollaborator("headpose"))?;
        if self.config.collisions_enabled {
            if !self.object.has_rigidbody() {
                return Err(MoveError::MissingPhysics("rigidbody"));
            }
            if self.object.collider_bounds().is_none() {
                return Err(MoveError::MissingPhysics("collider"));
            }
        }
        let path = DofPath::for_mode(self.config.interaction_mode, self.config.auto_center);
        MovementSession::start(
            &mut self.engine,
            &self.config.engine,
            path,
            self.config.input_driver,
            &self.object,
            headpose,
            frame.controller.as_ref(),
        )
    }

    fn tick(&mut self, frame: &FrameInput) -> Result<(), MoveError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        let headpose = frame
            .headpose
            .ok_or(MoveError::MissingCollaborator("headpose"))?;
        let controller = frame.controller.as_ref();

        if let Some(adjustment) = self.sampler.sample_touch(controller) {
            session.adjust(&mut self.engine, adjustment)?;
        }
        let pose = session.update(&mut self.engine, headpose, controller, frame.dt)?;
        write_pose(&mut self.object, self.config.collisions_enabled, pose);
        Ok(())
    }

    fn close_session(&mut self, dt: f32, force_end: bool) -> Result<(), MoveError> {
        let Some(session) = self.session.as_ref() else {
            self.state = SessionState::ShutDown;
            return Ok(());
        };

        let kinds: &[CollisionKind] = if force_end {
            &CollisionKind::ALL
        } else {
            &[CollisionKind::Hard]
        };
        // A collision failure does not stop the engine end; it is reported
        // once the state has resolved.
        let deferred = self
            .ledger
            .end_all(&mut self.engine, session.handle(), kinds)
            .err();

        let budget = if force_end { f32::MAX } else { dt };
        let handle = session.handle();
        match session.end(&mut self.engine, budget)? {
            EndOutcome::Completed(pose) => {
                write_pose(&mut self.object, self.config.collisions_enabled, pose);
                // Soft collisions died with the engine session.
                self.ledger.clear_all();
                self.session = None;
                self.state = SessionState::ShutDown;
                info!(%handle, "movement session ended");
            }
            EndOutcome::Pending(pose) => {
                write_pose(&mut self.object, self.config.collisions_enabled, pose);
                if self.state != SessionState::PendingShutDown {
                    info!(%handle, "movement session settling");
                }
                self.state = SessionState::PendingShutDown;
            }
            EndOutcome::TimedOut(_) => {
                self.ledger.clear_all();
                self.session = None;
                self.state = SessionState::ShutDown;
                info!(%handle, "movement session timed out while ending");
            }
        }

        deferred.map_or(Ok(()), Err)
    }
}

impl<E: MovementEngine, O: ControlledObject> Drop for MovementController<E, O> {
    fn drop(&mut self) {
        self.teardown();
    }
}

// Normalize the rotation and write through the rigidbody when collisions
// need the physics scene to see the move.
fn write_pose<O: ControlledObject>(object: &mut O, collisions_enabled: bool, pose: Pose) {
    let pose = Pose::new(pose.position, pose.rotation.normalized());
    if collisions_enabled && object.has_rigidbody() {
        object.move_rigidbody(pose);
    } else {
        object.set_pose(pose);
    }
}
