//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::CamId;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulated world.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Starting position of the chassis.
    ///
    /// Units: meters, Frame: field
    pub initial_position_m: [f64; 2],

    /// Starting heading of the chassis.
    ///
    /// Units: radians, Frame: field
    pub initial_heading_rad: f64,

    /// The simulated cameras
    pub cameras: Vec<SimCameraParams>,

    /// Ambiguity of a detection at zero range
    pub ambiguity_base: f64,

    /// Increase in ambiguity per meter of range
    pub ambiguity_per_m: f64,
}

/// A camera mounted on the simulated chassis.
#[derive(Debug, Clone, Deserialize)]
pub struct SimCameraParams {
    pub cam: CamId,

    /// Units: meters, Frame: chassis body
    pub mount_position_m: [f64; 2],

    /// Units: radians, Frame: chassis body
    pub mount_heading_rad: f64,

    /// Half of the horizontal field of view.
    ///
    /// Units: radians
    pub half_fov_rad: f64,

    /// Markers further away than this can't be detected.
    ///
    /// Units: meters
    pub max_range_m: f64,
}
