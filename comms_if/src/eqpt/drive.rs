//! # Chassis drive commands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command for the chassis drive subsystem.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub enum DriveCmd {
    /// Drive the chassis at the given velocity.
    Velocity {
        /// Speed along the chassis X+ (forwards) axis in meters/second.
        forward_ms: f64,

        /// Speed along the chassis Y+ (left) axis in meters/second.
        lateral_ms: f64,

        /// Rate of rotation about the chassis Z+ (upwards) axis in radians/second.
        ///
        /// Follows the right hand rule, so a positive rate turns the chassis to the left.
        rot_rads: f64,

        /// If true the speeds are expressed in the field frame rather than the chassis frame.
        field_relative: bool,
    },

    /// Hard stop, all drive outputs to zero.
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveCmd {
    /// A chassis-relative velocity command.
    pub fn body(forward_ms: f64, lateral_ms: f64, rot_rads: f64) -> Self {
        DriveCmd::Velocity {
            forward_ms,
            lateral_ms,
            rot_rads,
            field_relative: false,
        }
    }

    /// Returns true if this is a hard stop.
    pub fn is_stop(&self) -> bool {
        matches!(self, DriveCmd::Stop)
    }
}
