//! In-process simulation of the movement engine and a controlled object.
//!
//! [`SimEngine`] is a small but plausible motion solver: it drags the object
//! toward the point the control ray designates, honours depth and rotation
//! nudges, refuses to push the object through hard contacts, slows it down
//! inside proximity zones and settles it when the session ends.  It lets the
//! whole MoveKit stack run in headless tests, CI pipelines and the
//! `movekit` demo binary without a tracking device.
//!
//! # Example
//!
//! ```rust
//! use movekit_hal::sim::SimEngine;
//! use movekit_hal::MovementEngine;
//! use movekit_types::{
//!     MovementSettings, ObjectSnapshot, Pose, Quaternion, SixDofControl, SixDofSettings, Vec3,
//! };
//!
//! let mut engine = SimEngine::new();
//! let object = ObjectSnapshot {
//!     pose: Pose::new(Vec3::new(0.0, 0.0, 2.0), Quaternion::identity()),
//!     original_orientation: Quaternion::identity(),
//! };
//! let handle = engine
//!     .start_6dof(
//!         &MovementSettings::default(),
//!         &SixDofSettings::default(),
//!         &SixDofControl::default(),
//!         &object,
//!     )
//!     .expect("sim start must succeed");
//! let pose = engine
//!     .update_6dof(handle, &SixDofControl::default(), 0.016)
//!     .expect("sim update must succeed");
//! assert!(pose.position.z > 0.0);
//! ```

use std::collections::HashMap;

use movekit_types::{
    Bounds, CollisionHandle, EndOutcome, EngineFault, MovementSettings, ObjectSnapshot, Pose,
    Quaternion, SessionHandle, SixDofControl, SixDofSettings, ThreeDofControl, ThreeDofSettings,
    Vec3,
};
use tracing::debug;

use crate::engine::MovementEngine;
use crate::object::ControlledObject;

/// Distance (m) under which an ending session counts as settled.
const SETTLE_DISTANCE: f32 = 1e-3;

/// Slowest fraction of normal speed inside a proximity zone.
const SOFT_MIN_SCALE: f32 = 0.1;

// ────────────────────────────────────────────────────────────────────────────
// Simulated engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct SoftZone {
    center: Vec3,
    closest_distance: f32,
    max_distance: f32,
}

#[derive(Debug)]
struct SimSession {
    settings: MovementSettings,
    pose: Pose,
    /// Object rotation relative to the control rotation at start.
    rotation_offset: Quaternion,
    depth: f32,
    yaw: f32,
    target: Pose,
    hard: HashMap<CollisionHandle, Vec3>,
    soft: HashMap<CollisionHandle, SoftZone>,
    ending_elapsed: f32,
}

impl SimSession {
    fn new(settings: &MovementSettings, object: &ObjectSnapshot, anchor: Vec3, rotation: Quaternion) -> Self {
        let depth = object
            .pose
            .position
            .distance(anchor)
            .clamp(settings.min_distance, settings.max_distance);
        Self {
            settings: settings.clone(),
            pose: object.pose,
            rotation_offset: (rotation.normalized().conjugate() * object.pose.rotation).normalized(),
            depth,
            yaw: 0.0,
            target: object.pose,
            hard: HashMap::new(),
            soft: HashMap::new(),
            ending_elapsed: 0.0,
        }
    }

    /// Point `depth` metres down the control ray, rotated with the control.
    fn aim(&mut self, anchor: Vec3, rotation: Quaternion) -> Pose {
        let rotation = rotation.normalized();
        let position = anchor + rotation.rotate(Vec3::forward()) * self.depth;
        let yaw = Quaternion::from_axis_angle(Vec3::up(), self.yaw);
        self.target = Pose::new(position, (yaw * rotation * self.rotation_offset).normalized());
        self.target
    }

    fn step(&mut self, dt: f32) -> Pose {
        let mut t = (self.settings.control_dampening_factor * dt).clamp(0.0, 1.0);

        for zone in self.soft.values() {
            let d = self.pose.position.distance(zone.center);
            if d < zone.max_distance {
                let span = (zone.max_distance - zone.closest_distance).max(f32::EPSILON);
                t *= ((d - zone.closest_distance) / span).clamp(SOFT_MIN_SCALE, 1.0);
            }
        }

        let mut delta = (self.target.position - self.pose.position) * t;
        for normal in self.hard.values() {
            let n = normal.normalized();
            let into = delta.dot(n);
            if into < 0.0 {
                delta = delta - n * into;
            }
        }

        self.pose = Pose::new(
            self.pose.position + delta,
            nlerp(self.pose.rotation, self.target.rotation, t),
        );
        self.pose
    }
}

/// Normalized linear interpolation along the shorter arc.
fn nlerp(from: Quaternion, to: Quaternion, t: f32) -> Quaternion {
    let dot = from.w * to.w + from.x * to.x + from.y * to.y + from.z * to.z;
    let to = if dot < 0.0 {
        Quaternion::new(-to.w, -to.x, -to.y, -to.z)
    } else {
        to
    };
    Quaternion::new(
        from.w + (to.w - from.w) * t,
        from.x + (to.x - from.x) * t,
        from.y + (to.y - from.y) * t,
        from.z + (to.z - from.z) * t,
    )
    .normalized()
}

/// A simulated movement engine hosting any number of sessions.
#[derive(Debug, Default)]
pub struct SimEngine {
    sessions: HashMap<SessionHandle, SimSession>,
}

impl SimEngine {
    /// Create an engine with no sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions that have not ended yet.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Active hard + soft collisions of `handle`, or `None` for an unknown
    /// session.
    pub fn collision_count(&self, handle: SessionHandle) -> Option<usize> {
        self.sessions.get(&handle).map(|s| s.hard.len() + s.soft.len())
    }

    fn session(&mut self, handle: SessionHandle) -> Result<&mut SimSession, EngineFault> {
        self.sessions
            .get_mut(&handle)
            .ok_or(EngineFault::InvalidHandle)
    }

    fn open(&mut self, session: SimSession) -> SessionHandle {
        let handle = SessionHandle::new();
        debug!(%handle, depth = session.depth, "sim session started");
        self.sessions.insert(handle, session);
        handle
    }
}

fn check_dt(dt: f32) -> Result<(), EngineFault> {
    if dt.is_nan() || dt < 0.0 {
        return Err(EngineFault::InvalidParameter(format!("dt must be >= 0, got {dt}")));
    }
    Ok(())
}

impl MovementEngine for SimEngine {
    fn start_3dof(
        &mut self,
        settings: &MovementSettings,
        _dof: &ThreeDofSettings,
        control: &ThreeDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault> {
        settings.check().map_err(EngineFault::InvalidParameter)?;
        let session = SimSession::new(
            settings,
            object,
            control.headpose_position,
            control.control_rotation,
        );
        Ok(self.open(session))
    }

    fn start_6dof(
        &mut self,
        settings: &MovementSettings,
        _dof: &SixDofSettings,
        control: &SixDofControl,
        object: &ObjectSnapshot,
    ) -> Result<SessionHandle, EngineFault> {
        settings.check().map_err(EngineFault::InvalidParameter)?;
        let session = SimSession::new(
            settings,
            object,
            control.control_position,
            control.control_rotation,
        );
        Ok(self.open(session))
    }

    fn update_3dof(
        &mut self,
        handle: SessionHandle,
        control: &ThreeDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault> {
        check_dt(dt)?;
        let session = self.session(handle)?;
        session.aim(control.headpose_position, control.control_rotation);
        Ok(session.step(dt))
    }

    fn update_6dof(
        &mut self,
        handle: SessionHandle,
        control: &SixDofControl,
        dt: f32,
    ) -> Result<Pose, EngineFault> {
        check_dt(dt)?;
        let session = self.session(handle)?;
        session.aim(control.control_position, control.control_rotation);
        Ok(session.step(dt))
    }

    fn change_rotation(&mut self, handle: SessionHandle, delta_rad: f32) -> Result<(), EngineFault> {
        if !delta_rad.is_finite() {
            return Err(EngineFault::InvalidParameter(format!(
                "rotation delta must be finite, got {delta_rad}"
            )));
        }
        let session = self.session(handle)?;
        session.yaw += delta_rad;
        Ok(())
    }

    fn change_depth(&mut self, handle: SessionHandle, delta_m: f32) -> Result<(), EngineFault> {
        if !delta_m.is_finite() {
            return Err(EngineFault::InvalidParameter(format!(
                "depth delta must be finite, got {delta_m}"
            )));
        }
        let session = self.session(handle)?;
        session.depth = (session.depth + delta_m)
            .clamp(session.settings.min_distance, session.settings.max_distance);
        Ok(())
    }

    fn start_hard_collision(
        &mut self,
        handle: SessionHandle,
        normal: Vec3,
    ) -> Result<CollisionHandle, EngineFault> {
        if normal.length() <= f32::EPSILON {
            return Err(EngineFault::InvalidParameter("contact normal is zero".into()));
        }
        let session = self.session(handle)?;
        let collision = CollisionHandle::new();
        session.hard.insert(collision, normal);
        Ok(collision)
    }

    fn update_hard_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
        normal: Vec3,
    ) -> Result<(), EngineFault> {
        let session = self.session(handle)?;
        match session.hard.get_mut(&collision) {
            Some(n) => {
                *n = normal;
                Ok(())
            }
            None => Err(EngineFault::InvalidHandle),
        }
    }

    fn start_soft_collision(
        &mut self,
        handle: SessionHandle,
        other_center: Vec3,
        closest_distance: f32,
        max_distance: f32,
    ) -> Result<CollisionHandle, EngineFault> {
        if !(0.0..=max_distance).contains(&closest_distance) {
            return Err(EngineFault::InvalidParameter(format!(
                "closest distance {closest_distance} outside [0, {max_distance}]"
            )));
        }
        let session = self.session(handle)?;
        let collision = CollisionHandle::new();
        session.soft.insert(
            collision,
            SoftZone {
                center: other_center,
                closest_distance,
                max_distance,
            },
        );
        Ok(collision)
    }

    fn end_collision(
        &mut self,
        handle: SessionHandle,
        collision: CollisionHandle,
    ) -> Result<(), EngineFault> {
        let session = self.session(handle)?;
        if session.hard.remove(&collision).is_some() || session.soft.remove(&collision).is_some() {
            Ok(())
        } else {
            Err(EngineFault::InvalidHandle)
        }
    }

    fn end(&mut self, handle: SessionHandle, dt: f32) -> Result<EndOutcome, EngineFault> {
        check_dt(dt)?;
        let session = self.session(handle)?;
        session.ending_elapsed += dt;

        if session.ending_elapsed >= session.settings.end_resolve_timeout_s {
            let pose = session.pose;
            self.sessions.remove(&handle);
            debug!(%handle, "sim session timed out while ending");
            return Ok(EndOutcome::TimedOut(pose));
        }

        let pose = session.step(dt);
        if pose.position.distance(session.target.position) < SETTLE_DISTANCE {
            self.sessions.remove(&handle);
            debug!(%handle, "sim session settled");
            Ok(EndOutcome::Completed(pose))
        } else {
            Ok(EndOutcome::Pending(pose))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated object
// ────────────────────────────────────────────────────────────────────────────

/// Velocity state of a simulated rigidbody.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimRigidbody {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// A simulated scene object.  Records how its pose was written so tests can
/// tell transform writes from rigidbody writes.
#[derive(Debug, Clone, Default)]
pub struct SimObject {
    pose: Pose,
    rigidbody: Option<SimRigidbody>,
    collider_extents: Option<Vec3>,
    transform_writes: usize,
    rigidbody_writes: usize,
}

impl SimObject {
    /// A bare object (no rigidbody, no collider) at `pose`.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            ..Self::default()
        }
    }

    /// Attach a rigidbody at rest.
    pub fn with_rigidbody(mut self) -> Self {
        self.rigidbody = Some(SimRigidbody::default());
        self
    }

    /// Attach a box collider with the given half-size, centred on the object.
    pub fn with_collider(mut self, extents: Vec3) -> Self {
        self.collider_extents = Some(extents);
        self
    }

    pub fn rigidbody(&self) -> Option<&SimRigidbody> {
        self.rigidbody.as_ref()
    }

    /// Give the rigidbody some velocity, as the physics scene would.
    pub fn push(&mut self, velocity: Vec3, angular_velocity: Vec3) {
        if let Some(body) = self.rigidbody.as_mut() {
            body.velocity = velocity;
            body.angular_velocity = angular_velocity;
        }
    }

    pub fn transform_writes(&self) -> usize {
        self.transform_writes
    }

    pub fn rigidbody_writes(&self) -> usize {
        self.rigidbody_writes
    }
}

impl ControlledObject for SimObject {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
        self.transform_writes += 1;
    }

    fn has_rigidbody(&self) -> bool {
        self.rigidbody.is_some()
    }

    fn move_rigidbody(&mut self, pose: Pose) {
        if let Some(body) = self.rigidbody.as_mut() {
            *body = SimRigidbody::default();
            self.pose = pose;
            self.rigidbody_writes += 1;
        }
    }

    fn collider_bounds(&self) -> Option<Bounds> {
        self.collider_extents
            .map(|extents| Bounds::new(self.pose.position, extents))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn object_at(position: Vec3) -> ObjectSnapshot {
        ObjectSnapshot {
            pose: Pose::new(position, Quaternion::identity()),
            original_orientation: Quaternion::identity(),
        }
    }

    fn started_6dof(engine: &mut SimEngine, at: Vec3) -> SessionHandle {
        engine
            .start_6dof(
                &MovementSettings::default(),
                &SixDofSettings::default(),
                &SixDofControl::default(),
                &object_at(at),
            )
            .expect("sim start must succeed")
    }

    #[test]
    fn stationary_control_keeps_object_in_place() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        let pose = engine
            .update_6dof(handle, &SixDofControl::default(), 0.016)
            .unwrap();
        assert!(pose.position.approx_eq(Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn object_follows_moving_control() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        let control = SixDofControl {
            control_position: Vec3::new(1.0, 0.0, 0.0),
            ..SixDofControl::default()
        };
        let mut pose = Pose::identity();
        for _ in 0..200 {
            pose = engine.update_6dof(handle, &control, 0.016).unwrap();
        }
        assert!((pose.position.x - 1.0).abs() < 1e-2, "x={}", pose.position.x);
        assert!((pose.position.z - 2.0).abs() < 1e-2, "z={}", pose.position.z);
    }

    #[test]
    fn depth_is_clamped_to_max_distance() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        engine.change_depth(handle, 1000.0).unwrap();
        let max = MovementSettings::default().max_distance;
        assert_eq!(engine.sessions[&handle].depth, max);
    }

    #[test]
    fn hard_collision_blocks_motion_into_normal() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        // Wall behind the object along +Z: contact normal points back at us.
        engine
            .start_hard_collision(handle, Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        engine.change_depth(handle, 3.0).unwrap();
        let pose = engine
            .update_6dof(handle, &SixDofControl::default(), 0.1)
            .unwrap();
        assert!(pose.position.z <= 2.0 + 1e-5, "z={}", pose.position.z);
    }

    #[test]
    fn infinite_budget_end_times_out() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        let outcome = engine.end(handle, f32::MAX).unwrap();
        assert!(matches!(outcome, EndOutcome::TimedOut(_)));
        assert_eq!(engine.live_sessions(), 0);
    }

    #[test]
    fn end_is_pending_until_settled() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        let control = SixDofControl {
            control_position: Vec3::new(2.0, 0.0, 0.0),
            ..SixDofControl::default()
        };
        engine.update_6dof(handle, &control, 0.016).unwrap();
        assert!(matches!(engine.end(handle, 0.016), Ok(EndOutcome::Pending(_))));

        let mut outcome = EndOutcome::Pending(Pose::identity());
        for _ in 0..400 {
            outcome = engine.end(handle, 0.016).unwrap();
            if !matches!(outcome, EndOutcome::Pending(_)) {
                break;
            }
        }
        assert!(matches!(outcome, EndOutcome::Completed(_)));
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let mut engine = SimEngine::new();
        let result = engine.change_depth(SessionHandle::new(), 0.1);
        assert_eq!(result, Err(EngineFault::InvalidHandle));
    }

    #[test]
    fn soft_collision_rejects_inverted_range() {
        let mut engine = SimEngine::new();
        let handle = started_6dof(&mut engine, Vec3::new(0.0, 0.0, 2.0));
        let result = engine.start_soft_collision(handle, Vec3::zero(), 3.0, 1.0);
        assert!(matches!(result, Err(EngineFault::InvalidParameter(_))));
    }

    #[test]
    fn sim_object_rigidbody_write_zeroes_velocity() {
        let mut object = SimObject::new(Pose::identity()).with_rigidbody();
        object.push(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        object.move_rigidbody(Pose::new(Vec3::new(0.0, 1.0, 0.0), Quaternion::identity()));
        assert_eq!(object.rigidbody(), Some(&SimRigidbody::default()));
        assert_eq!(object.rigidbody_writes(), 1);
        assert_eq!(object.transform_writes(), 0);
    }

    #[test]
    fn sim_object_collider_follows_pose() {
        let mut object = SimObject::new(Pose::identity()).with_collider(Vec3::new(0.5, 0.5, 0.5));
        object.set_pose(Pose::new(Vec3::new(3.0, 0.0, 0.0), Quaternion::identity()));
        let bounds = object.collider_bounds().unwrap();
        assert_eq!(bounds.center, Vec3::new(3.0, 0.0, 0.0));
    }
}
