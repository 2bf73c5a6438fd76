//! # Chassis drive interface
//!
//! The alignment controller never talks to motor controllers directly, it emits
//! [`DriveCmd`]s which are applied to anything implementing [`ChassisDrive`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveCmd;

use crate::loc::Pose;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A holonomic chassis which can be driven with velocity demands.
pub trait ChassisDrive {
    /// Drive at the given speeds. With `field_relative` false the speeds are in the chassis
    /// frame.
    fn drive(&mut self, forward_ms: f64, lateral_ms: f64, rot_rads: f64, field_relative: bool);

    /// Set all drive outputs to zero immediately.
    fn stop(&mut self);

    /// The chassis pose in the field frame.
    fn current_pose(&self) -> Pose;
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply a drive command to the chassis.
pub fn apply<D: ChassisDrive + ?Sized>(chassis: &mut D, cmd: &DriveCmd) {
    match *cmd {
        DriveCmd::Velocity {
            forward_ms,
            lateral_ms,
            rot_rads,
            field_relative,
        } => chassis.drive(forward_ms, lateral_ms, rot_rads, field_relative),
        DriveCmd::Stop => chassis.stop(),
    }
}
