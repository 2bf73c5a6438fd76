//! # Localisation module
//!
//! Poses of the chassis, cameras and markers on the XY plane of the field frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Isometry2, Vector2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and heading in some parent frame.
///
/// For the chassis the parent is the field frame, for a camera mount it is the chassis body
/// frame.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// The position in the parent frame
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The angle from the parent's X+ axis to the frame's X+ axis, positive anticlockwise.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad,
        }
    }

    /// The transform from this frame into its parent.
    pub fn isometry(&self) -> Isometry2<f64> {
        Isometry2::new(self.position_m, self.heading_rad)
    }

    /// Build a pose from a transform, the heading is returned in `(-pi, pi]`.
    pub fn from_isometry(iso: &Isometry2<f64>) -> Self {
        Self {
            position_m: iso.translation.vector,
            heading_rad: iso.rotation.angle(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Pose::new(0.0, 0.0, 0.0)
    }
}
