//! # Vision Equipment Communications Module
//!
//! Detections are produced by the fiducial detection pipeline running on each camera. One
//! [`DetectionSet`] is the complete result of a single camera frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single sighting of one fiducial marker by one camera.
///
/// The pose is that of the marker in the camera frame: X forwards out of the lens, Y to the left,
/// Z upwards.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq)]
pub struct Detection {
    /// Identifier encoded in the marker
    pub marker_id: i32,

    /// Distance to the marker along the camera's optical axis.
    ///
    /// Units: meters
    pub forward_m: f64,

    /// Offset of the marker to the left of the optical axis.
    ///
    /// Units: meters
    pub lateral_m: f64,

    /// Rotation of the marker about the camera Z axis.
    ///
    /// A marker squarely facing the camera has a yaw of +/- pi.
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Pose ambiguity reported by the pipeline, lower is more certain.
    pub ambiguity: f64,
}

/// All detections from a single camera frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectionSet {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Markers seen in the frame, in no particular order
    pub detections: Vec<Detection>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Cameras available on the robot
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Hash, Eq, PartialEq)]
pub enum CamId {
    /// The camera mounted on the left of the chassis
    Left,

    /// The camera mounted on the right of the chassis
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Detection {
    /// Returns true if every value of the detection can be used.
    ///
    /// NaN or infinite pose values, and negative or non-finite ambiguities, are produced by a
    /// pipeline which failed to solve the pose.
    pub fn is_well_formed(&self) -> bool {
        self.forward_m.is_finite()
            && self.lateral_m.is_finite()
            && self.yaw_rad.is_finite()
            && self.ambiguity.is_finite()
            && self.ambiguity >= 0.0
    }
}

impl DetectionSet {
    /// A frame in which nothing was seen.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            detections: Vec::new(),
        }
    }

    /// Returns true if the frame contains no detections at all.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Age of the frame at the given time in seconds. Frames from the future have a negative
    /// age.
    pub fn age_s(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.timestamp).num_milliseconds() as f64 / 1000.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
