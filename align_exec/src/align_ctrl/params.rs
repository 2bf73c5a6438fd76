//! Alignment control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::CamId;
use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for alignment control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- CAMERAS ----
    /// Cameras to use, in the order they are checked. On equal ambiguity the first camera in
    /// this list wins.
    pub cameras: Vec<CameraParams>,

    /// Offset of the desired stopping point to the left of the marker.
    ///
    /// Units: meters
    pub target_lateral_offset_m: f64,

    /// Detection sets older than this are ignored.
    ///
    /// Units: seconds
    pub max_detection_age_s: f64,

    /// Markers at or beyond this forward distance are never selected.
    ///
    /// Units: meters
    #[serde(default = "default_max_range_m")]
    pub max_range_m: f64,

    // ---- FILTERING ----
    /// Number of samples in each smoothing window
    pub window_len: usize,

    /// Number of consecutive cycles without a target before the manouvre is aborted.
    pub lost_target_debounce_cycles: u32,

    /// Number of consecutive cycles the rotation error must be outside the deadband before
    /// rotation is considered unsettled again.
    pub rot_unsettle_debounce_cycles: u32,

    // ---- AXES ----
    /// Rotation gate and clamp.
    ///
    /// Units: degrees
    pub rot: AxisParams,

    /// Lateral gate and clamp.
    ///
    /// Units: meters
    pub lat: AxisParams,

    /// Forward clamp.
    ///
    /// Units: meters
    pub fwd: ClampParams,

    /// Forward motion stops once the remaining distance is at or below this.
    ///
    /// Units: meters
    pub end_distance_m: f64,

    /// Rotation rate used to search for a target when none is visible.
    ///
    /// Units: radians/second
    pub search_rot_rate_rads: f64,

    // ---- OUTPUT ----
    /// Gains from the synthesized command to the chassis drive command. These may be negative
    /// to account for the drive's sign conventions.
    pub fwd_output_scale: f64,
    pub lat_output_scale: f64,
    pub rot_output_scale: f64,
}

/// Calibration of a single camera.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraParams {
    pub cam: CamId,

    /// Offset of the camera to the left of the chassis centre line.
    ///
    /// Units: meters
    pub lateral_offset_m: f64,

    /// Offset of the camera forward of the chassis reference point.
    ///
    /// Units: meters
    pub forward_offset_m: f64,
}

/// Two-threshold gate and magnitude clamp for one axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisParams {
    /// Error magnitude below which the axis becomes settled
    pub tolerance: f64,

    /// Error magnitude above which a settled axis becomes unsettled
    pub deadband: f64,

    /// Smallest non-zero command magnitude
    pub floor: f64,

    /// Largest command magnitude
    pub ceiling: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClampParams {
    pub floor: f64,
    pub ceiling: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Violations of the parameter invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("No cameras are configured")]
    NoCameras,

    #[error("Camera {0:?} is configured more than once")]
    DuplicateCamera(CamId),

    #[error("{0} must be finite")]
    NonFinite(&'static str),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("{axis} tolerance ({tolerance}) must be less than its deadband ({deadband})")]
    ToleranceNotBelowDeadband {
        axis: &'static str,
        tolerance: f64,
        deadband: f64,
    },

    #[error("{axis} floor ({floor}) must be non-negative and less than its ceiling ({ceiling})")]
    InvalidClamp {
        axis: &'static str,
        floor: f64,
        ceiling: f64,
    },

    #[error("Forward floor ({0}) must not exceed half the forward ceiling ({1})")]
    ForwardFloorAboveHalfCeiling(f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the invariants the controller relies on.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.cameras.is_empty() {
            return Err(ParamsError::NoCameras);
        }

        for (i, c) in self.cameras.iter().enumerate() {
            if self.cameras[..i].iter().any(|p| p.cam == c.cam) {
                return Err(ParamsError::DuplicateCamera(c.cam));
            }
            finite("camera lateral_offset_m", c.lateral_offset_m)?;
            finite("camera forward_offset_m", c.forward_offset_m)?;
        }

        finite("target_lateral_offset_m", self.target_lateral_offset_m)?;
        finite("end_distance_m", self.end_distance_m)?;
        finite("search_rot_rate_rads", self.search_rot_rate_rads)?;
        finite("fwd_output_scale", self.fwd_output_scale)?;
        finite("lat_output_scale", self.lat_output_scale)?;
        finite("rot_output_scale", self.rot_output_scale)?;

        positive("max_detection_age_s", self.max_detection_age_s)?;
        positive("max_range_m", self.max_range_m)?;

        if self.window_len == 0 {
            return Err(ParamsError::NotPositive("window_len"));
        }
        if self.lost_target_debounce_cycles == 0 {
            return Err(ParamsError::NotPositive("lost_target_debounce_cycles"));
        }
        if self.rot_unsettle_debounce_cycles == 0 {
            return Err(ParamsError::NotPositive("rot_unsettle_debounce_cycles"));
        }

        self.rot.validate("rot")?;
        self.lat.validate("lat")?;
        check_clamp("fwd", self.fwd.floor, self.fwd.ceiling)?;

        // Forward speed is halved while rotating, the floor must still fit under the halved
        // ceiling
        if self.fwd.floor > self.fwd.ceiling / 2.0 {
            return Err(ParamsError::ForwardFloorAboveHalfCeiling(
                self.fwd.floor,
                self.fwd.ceiling,
            ));
        }

        Ok(())
    }

    /// Get the calibration for a camera.
    pub fn camera(&self, cam: CamId) -> Option<&CameraParams> {
        self.cameras.iter().find(|c| c.cam == cam)
    }

    /// Parameters used in the unit tests
    #[cfg(test)]
    pub(crate) fn test_params() -> Self {
        Params {
            cameras: vec![
                CameraParams {
                    cam: CamId::Right,
                    lateral_offset_m: 0.0,
                    forward_offset_m: 0.0,
                },
                CameraParams {
                    cam: CamId::Left,
                    lateral_offset_m: 0.1,
                    forward_offset_m: 0.05,
                },
            ],
            target_lateral_offset_m: 0.0,
            max_detection_age_s: 0.5,
            max_range_m: 100.0,
            window_len: 20,
            lost_target_debounce_cycles: 20,
            rot_unsettle_debounce_cycles: 4,
            rot: AxisParams {
                tolerance: 5.0,
                deadband: 10.0,
                floor: 1.0,
                ceiling: 20.0,
            },
            lat: AxisParams {
                tolerance: 0.05,
                deadband: 0.1,
                floor: 0.05,
                ceiling: 0.5,
            },
            fwd: ClampParams {
                floor: 0.05,
                ceiling: 1.0,
            },
            end_distance_m: 0.3,
            search_rot_rate_rads: 0.5,
            fwd_output_scale: 1.0,
            lat_output_scale: 1.0,
            rot_output_scale: -0.05,
        }
    }
}

impl AxisParams {
    fn validate(&self, axis: &'static str) -> Result<(), ParamsError> {
        if !(self.tolerance.is_finite() && self.deadband.is_finite()) {
            return Err(ParamsError::NonFinite(axis));
        }
        if self.tolerance <= 0.0 {
            return Err(ParamsError::NotPositive(axis));
        }
        if self.tolerance >= self.deadband {
            return Err(ParamsError::ToleranceNotBelowDeadband {
                axis,
                tolerance: self.tolerance,
                deadband: self.deadband,
            });
        }

        check_clamp(axis, self.floor, self.ceiling)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_max_range_m() -> f64 {
    100.0
}

fn finite(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamsError::NonFinite(name))
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive(name))
    }
}

fn check_clamp(axis: &'static str, floor: f64, ceiling: f64) -> Result<(), ParamsError> {
    if !(floor.is_finite() && ceiling.is_finite()) {
        return Err(ParamsError::NonFinite(axis));
    }
    if floor < 0.0 || floor >= ceiling {
        return Err(ParamsError::InvalidClamp {
            axis,
            floor,
            ceiling,
        });
    }
    Ok(())
}
