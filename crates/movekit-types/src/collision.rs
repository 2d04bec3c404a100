//! Contact and proximity notifications delivered by the host physics scene.

use serde::{Deserialize, Serialize};

use crate::ObjectId;
use crate::math::{Bounds, Vec3};

/// The two independent collision subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Physical contact between colliders.
    Hard,
    /// Overlap of proximity trigger volumes.
    Soft,
}

impl CollisionKind {
    /// Both kinds, hard first.
    pub const ALL: [CollisionKind; 2] = [CollisionKind::Hard, CollisionKind::Soft];
}

impl std::fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionKind::Hard => write!(f, "hard"),
            CollisionKind::Soft => write!(f, "soft"),
        }
    }
}

/// Marker attached to scene objects that should interact with moved
/// objects.  Objects without it are ignored by the collision ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementColliderMarker {
    /// How deep (percent of the centre-to-centre distance) a moved object
    /// may push into this object's proximity zone.
    pub max_depth_percent: f32,
}

impl Default for MovementColliderMarker {
    fn default() -> Self {
        Self {
            max_depth_percent: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub point: Vec3,
    pub normal: Vec3,
}

/// A hard contact notification (enter or stay).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub other: ObjectId,
    pub marker: Option<MovementColliderMarker>,
    pub contacts: Vec<ContactPoint>,
}

impl ContactEvent {
    /// Normal of the first reported contact point, if any.
    pub fn first_normal(&self) -> Option<Vec3> {
        self.contacts.first().map(|c| c.normal)
    }
}

/// A proximity trigger notification (enter).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityEvent {
    pub other: ObjectId,
    pub marker: Option<MovementColliderMarker>,
    /// World bounds of the other object's collider.
    pub other_bounds: Bounds,
}
