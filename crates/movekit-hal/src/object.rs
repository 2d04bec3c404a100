//! The [`ControlledObject`] trait – the scene entity a session moves.

use movekit_types::{Bounds, Pose, Vec3};

/// A scene object whose pose is driven by a movement session.
///
/// Hosts back this with their own transform / physics components.  When
/// collisions are enabled the object must expose a rigidbody and a collider;
/// poses are then written through the rigidbody so the physics scene keeps
/// producing contact notifications.
pub trait ControlledObject: Send {
    /// Current world pose.
    fn pose(&self) -> Pose;

    /// Write `pose` straight onto the transform.
    fn set_pose(&mut self, pose: Pose);

    fn has_rigidbody(&self) -> bool;

    /// Move the rigidbody to `pose` and zero its linear and angular
    /// velocity.  Only called when [`has_rigidbody`][Self::has_rigidbody]
    /// is `true`.
    fn move_rigidbody(&mut self, pose: Pose);

    /// World bounds of the object's collider, `None` without one.
    fn collider_bounds(&self) -> Option<Bounds>;

    /// The object's local up axis in world space.
    fn up(&self) -> Vec3 {
        self.pose().up()
    }
}
