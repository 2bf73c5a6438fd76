//! Two-threshold hysteresis gates
//!
//! Each axis is either settled or unsettled. An unsettled axis settles once its error is
//! within the tolerance, a settled axis only unsettles once its error is beyond the deadband.
//! Between the two thresholds the state is held.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;

use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The gate for one axis.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct AxisGate {
    settled: bool,

    /// Consecutive cycles a settled axis has been beyond its deadband
    out_count: u32,
}

/// The gates for both controlled axes.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct HysteresisState {
    pub rot: AxisGate,
    pub lat: AxisGate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AxisGate {
    /// Update the gate with the latest error.
    ///
    /// A settled gate unsettles once the error has been beyond the deadband for
    /// `unsettle_cycles` consecutive updates. Non-finite errors are ignored.
    ///
    /// Returns true if the state changed.
    pub fn update(
        &mut self,
        error: f64,
        tolerance: f64,
        deadband: f64,
        unsettle_cycles: u32,
    ) -> bool {
        if !error.is_finite() {
            return false;
        }

        if self.settled {
            if error.abs() > deadband {
                self.out_count += 1;
                if self.out_count >= unsettle_cycles {
                    self.settled = false;
                    self.out_count = 0;
                    return true;
                }
            } else {
                self.out_count = 0;
            }
        } else if error.abs() < tolerance {
            self.settled = true;
            self.out_count = 0;
            return true;
        }

        false
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl HysteresisState {
    /// Update both gates. Rotation error is in degrees, lateral in meters.
    pub fn update(&mut self, rotation_err_deg: f64, lateral_err_m: f64, params: &Params) {
        if self.rot.update(
            rotation_err_deg,
            params.rot.tolerance,
            params.rot.deadband,
            params.rot_unsettle_debounce_cycles,
        ) {
            debug!("Rotation settled: {}", self.rot.is_settled());
        }

        if self.lat.update(
            lateral_err_m,
            params.lat.tolerance,
            params.lat.deadband,
            1,
        ) {
            debug!("Lateral settled: {}", self.lat.is_settled());
        }
    }

    pub fn both_settled(&self) -> bool {
        self.rot.is_settled() && self.lat.is_settled()
    }

    /// Set both axes unsettled.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
