//! The [`MovementEngine`] trait – the motion solver behind a movement session.
//!
//! Every call is synchronous and returns immediately.  Long-running work
//! (settling an object after release) is expressed through
//! [`EndOutcome::Pending`] rather than by blocking, so the caller polls
//! [`MovementEngine::end`] once per frame until it resolves.

use movekit_types::{
    CollisionHandle, EndOutcome, EngineFault, MovementSettings, ObjectSnapshot, Pose,
    SessionHandle, SixDofControl, SixDofSettings, ThreeDofControl, ThreeDofSettings, Vec3,
};

/// Handle-based motion solver.
///
/// A session handle returned by one of the `start_*` calls stays valid until
/// [`end`][MovementEngine::end] reports [`EndOutcome::Completed`] or
/// [`EndOutcome::TimedOut`].  Collision handles are scoped to their session.
pub trait MovementEngine: Send {
    /// Start a three-degrees-of-freedom session.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineFault`] when the session cannot be created.
    fn start_3dof(
        &mut self,
        settings: &MovementSettings,
        dof: &ThreeDofSettings,
        control: &ThreeDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault>;

    /// Start a six-degrees-of-freedom session.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineFault`] when the session cannot be created.
    fn start_6dof(
        &mut self,
        settings: &MovementSettings,
        dof: &SixDofSettings,
        control: &SixDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault>;

    /// Advance a 3DoF session by `dt` seconds and return the new object pose.
    fn update_3dof(
        &mut self,
        handle: SessionHandle,
        control: &ThreeDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault>;

    /// Advance a 6DoF session by `dt` seconds and return the new object pose.
    fn update_6dof(
        &mut self,
        handle: SessionHandle,
        control: &SixDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault>;

    /// Rotate the object around world up by `delta_rad`.
    fn change_rotation(&mut self, handle: SessionHandle, delta_rad: f32) -> Result<(), EngineFault>;

    /// Push the object away from (positive) or toward (negative) the user.
    fn change_depth(&mut self, handle: SessionHandle, delta_m: f32) -> Result<(), EngineFault>;

    /// Begin a hard (contact) collision along `normal`.
    fn start_hard_collision(
        &mut self,
        handle: SessionHandle,
        normal: Vec3,
    ) -> Result<CollisionHandle, EngineFault>;

    /// Refresh the contact normal of an active hard collision.
    fn update_hard_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
        normal: Vec3,
    ) -> Result<(), EngineFault>;

    /// Begin a soft (proximity) collision with an object centred at
    /// `other_center`.  The object may approach to `closest_distance` and
    /// starts feeling resistance inside `max_distance`.
    fn start_soft_collision(
        &mut self,
        handle: SessionHandle,
        other_center: Vec3,
        closest_distance: f32,
        max_distance: f32,
    ) -> Result<CollisionHandle, EngineFault>;

    /// End a hard or soft collision.
    fn end_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
    ) -> Result<(), EngineFault>;

    /// Request the end of a session, spending at most `dt` seconds settling.
    ///
    /// Passing an effectively infinite budget forces a terminal answer.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineFault`] for anything other than completion,
    /// pending or timeout.
    fn end(&mut self, handle: SessionHandle, dt: f32) -> Result<EndOutcome, EngineFault>;
}
