//! Rigid-body math primitives shared by every MoveKit crate.
//!
//! Conventions follow the host engines MoveKit is embedded in: +Y is world
//! up, +Z is forward, quaternions are stored `(w, x, y, z)`.
//!
//! # Example
//!
//! ```rust
//! use movekit_types::math::{Quaternion, Vec3};
//!
//! // 90° yaw turns forward (+Z) into +X.
//! let yaw = Quaternion::from_axis_angle(Vec3::up(), std::f32::consts::FRAC_PI_2);
//! let r = yaw.rotate(Vec3::forward());
//! assert!((r.x - 1.0).abs() < 1e-5);
//! ```

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Tolerance used by the `approx_eq` helpers, matching the host's vector
/// equality threshold.
pub const APPROX_EPSILON: f32 = 1e-5;

// ────────────────────────────────────────────────────────────────────────────
// Vec2
// ────────────────────────────────────────────────────────────────────────────

/// A 2-D vector, used for touchpad samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Signed angle in degrees that rotates `from` onto `to`.
    ///
    /// Positive values are counter-clockwise.  Returns `0.0` when either
    /// vector has zero length.
    pub fn signed_angle(from: Self, to: Self) -> f32 {
        let cross = from.x * to.y - from.y * to.x;
        let dot = from.x * to.x + from.y * to.y;
        if cross == 0.0 && dot == 0.0 {
            return 0.0;
        }
        cross.atan2(dot).to_degrees()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector (positions, directions, normals).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// World up (+Y).
    pub fn up() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// World forward (+Z).
    pub fn forward() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, rhs: Self) -> f32 {
        (self - rhs).length()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::zero()
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (to - self) * t
    }

    /// True when the two vectors are closer than [`APPROX_EPSILON`].
    pub fn approx_eq(self, rhs: Self) -> bool {
        let d = self - rhs;
        d.dot(d) < APPROX_EPSILON * APPROX_EPSILON
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A rotation quaternion (w, x, y, z convention).
///
/// Values coming back from the tracking service may drift off unit length;
/// call [`Quaternion::normalized`] before applying them to an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` radians around `axis` (need not be unit).
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let axis = axis.normalized();
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    pub fn length(self) -> f32 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit-length copy.  A degenerate (zero) quaternion becomes identity.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::identity();
        }
        let inv = 1.0 / len;
        Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv)
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self * p * self.conjugate();
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// True when both quaternions describe the same rotation (q and -q are
    /// treated as equal).
    pub fn approx_eq(self, rhs: Self) -> bool {
        let a = self.normalized();
        let b = rhs.normalized();
        let dot = a.w * b.w + a.x * b.x + a.y * b.y + a.z * b.z;
        (1.0 - dot.abs()) < APPROX_EPSILON
    }
}

impl Mul for Quaternion {
    type Output = Self;

    /// Hamilton product: `self` applied after `rhs`.
    fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose / Bounds
// ────────────────────────────────────────────────────────────────────────────

/// Position + rotation of an object in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// The object's local up axis expressed in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation.rotate(Vec3::up())
    }

    /// The object's local forward axis expressed in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation.rotate(Vec3::forward())
    }
}

/// Axis-aligned bounding box reported by a collider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vec3,
    /// Half-size along each axis.
    pub extents: Vec3,
}

impl Bounds {
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn signed_angle_is_positive_counter_clockwise() {
        let a = Vec2::signed_angle(Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!((a - 90.0).abs() < 1e-4, "got {a}");
        let b = Vec2::signed_angle(Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
        assert!((b + 90.0).abs() < 1e-4, "got {b}");
    }

    #[test]
    fn signed_angle_with_zero_vector_is_zero() {
        assert_eq!(Vec2::signed_angle(Vec2::zero(), Vec2::new(0.3, 0.4)), 0.0);
    }

    #[test]
    fn yaw_rotates_forward_onto_x() {
        let q = Quaternion::from_axis_angle(Vec3::up(), FRAC_PI_2);
        let r = q.rotate(Vec3::forward());
        assert!((r.x - 1.0).abs() < 1e-5);
        assert!(r.z.abs() < 1e-5);
    }

    #[test]
    fn normalized_zero_quaternion_is_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn normalized_restores_unit_length() {
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0).normalized();
        assert!((q.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn negated_quaternion_is_same_rotation() {
        let q = Quaternion::from_axis_angle(Vec3::up(), 0.4);
        let neg = Quaternion::new(-q.w, -q.x, -q.y, -q.z);
        assert!(q.approx_eq(neg));
    }

    #[test]
    fn pose_up_follows_rotation() {
        let tilted = Pose::new(
            Vec3::zero(),
            Quaternion::from_axis_angle(Vec3::forward(), FRAC_PI_2),
        );
        assert!(!tilted.up().approx_eq(Vec3::up()));
        assert!(Pose::identity().up().approx_eq(Vec3::up()));
    }

    #[test]
    fn lerp_clamps_parameter() {
        let a = Vec3::zero();
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec3::new(1.0, 0.0, 0.0));
    }
}
