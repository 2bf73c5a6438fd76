//! Command synthesis
//!
//! Converts the smoothed and gated errors into clamped body velocity demands. Rotation is
//! corrected first, lateral corrections are only made once rotation is settled. Forward
//! motion continues until the target distance is reached, at half speed while the rotation
//! error is large.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveCmd;
use serde::Serialize;
use util::maths::clamp_magnitude;

use super::{ArbitratedTarget, HysteresisState, Params, Smoothed};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Body frame demands before output scaling.
///
/// Each non-zero demand has a magnitude between its axis' floor and ceiling.
#[derive(Debug, Copy, Clone, Default, Serialize, PartialEq)]
pub struct BodyVelCmd {
    pub forward: f64,
    pub lateral: f64,
    pub rotation: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BodyVelCmd {
    /// Apply the output scales to get the chassis drive command.
    pub fn to_drive_cmd(&self, params: &Params) -> DriveCmd {
        DriveCmd::body(
            self.forward * params.fwd_output_scale,
            self.lateral * params.lat_output_scale,
            self.rotation * params.rot_output_scale,
        )
    }

    pub fn is_zero(&self) -> bool {
        self.forward == 0.0 && self.lateral == 0.0 && self.rotation == 0.0
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the demands for this cycle.
///
/// Forward speed is halved whenever the smoothed rotation error is outside the rotation
/// deadband, whatever the state of the rotation gate. While the gate is debouncing an unsettle
/// the rotation demand is still zero but forward motion is already slowed.
pub fn synthesize(
    smoothed: &Smoothed,
    target: &ArbitratedTarget,
    gates: &HysteresisState,
    back_offset_m: f64,
    params: &Params,
) -> BodyVelCmd {
    let rot_err = smoothed.rotation_deg;
    let lat_err = smoothed.lateral_m + target.camera_offset_m;
    let distance = smoothed.forward_m - target.forward_offset_m;

    // ---- ROTATION ----

    let rotation = if gates.rot.is_settled() {
        0.0
    } else {
        clamp_magnitude(rot_err, params.rot.floor, params.rot.ceiling)
    };

    // ---- FORWARD ----

    let forward = if distance - back_offset_m <= params.end_distance_m {
        0.0
    } else if rot_err.abs() > params.rot.deadband {
        clamp_magnitude(distance / 2.0, params.fwd.floor, params.fwd.ceiling / 2.0)
    } else {
        clamp_magnitude(distance, params.fwd.floor, params.fwd.ceiling)
    };

    // ---- LATERAL ----

    let lateral = if gates.rot.is_settled() && !gates.lat.is_settled() {
        clamp_magnitude(lat_err, params.lat.floor, params.lat.ceiling)
    } else {
        0.0
    };

    BodyVelCmd {
        forward,
        lateral,
        rotation,
    }
}

/// Command used to look for a target when none is visible: rotate on the spot.
pub fn search_cmd(params: &Params) -> DriveCmd {
    DriveCmd::body(0.0, 0.0, params.search_rot_rate_rads)
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::vision::{CamId, Detection};

    fn target(camera_offset_m: f64) -> ArbitratedTarget {
        ArbitratedTarget {
            cam: CamId::Right,
            detection: Detection {
                marker_id: 1,
                forward_m: 0.0,
                lateral_m: 0.0,
                yaw_rad: 0.0,
                ambiguity: 0.0,
            },
            camera_offset_m,
            forward_offset_m: 0.0,
        }
    }

    fn smoothed(forward_m: f64, lateral_m: f64, rotation_deg: f64) -> Smoothed {
        Smoothed {
            forward_m,
            lateral_m,
            rotation_deg,
        }
    }

    #[test]
    fn test_large_rotation() {
        let p = Params::test_params();
        let gates = HysteresisState::default();

        let c = synthesize(&smoothed(2.0, 0.3, 30.0), &target(0.0), &gates, 0.2, &p);

        // Rotation at the ceiling, forward halved and capped at half the ceiling, no lateral
        assert_eq!(c.rotation, 20.0);
        assert_eq!(c.forward, 0.5);
        assert_eq!(c.lateral, 0.0);

        let c = synthesize(&smoothed(2.0, 0.3, -30.0), &target(0.0), &gates, 0.2, &p);
        assert_eq!(c.rotation, -20.0);
    }

    #[test]
    fn test_rotation_inside_band() {
        let p = Params::test_params();
        let gates = HysteresisState::default();

        // Unsettled but within the deadband, full forward clamp applies
        let c = synthesize(&smoothed(2.0, 0.0, 7.0), &target(0.0), &gates, 0.2, &p);
        assert_eq!(c.rotation, 7.0);
        assert_eq!(c.forward, 1.0);

        // Small errors are raised to the floor
        let c = synthesize(&smoothed(2.0, 0.0, -0.5), &target(0.0), &gates, 0.2, &p);
        assert_eq!(c.rotation, -1.0);
    }

    #[test]
    fn test_lateral_after_rotation() {
        let p = Params::test_params();
        let mut gates = HysteresisState::default();
        gates.update(0.0, 1.0, &p);
        assert!(gates.rot.is_settled());
        assert!(!gates.lat.is_settled());

        let c = synthesize(&smoothed(0.8, -0.3, 0.0), &target(0.1), &gates, 0.2, &p);
        assert_eq!(c.rotation, 0.0);
        assert!((c.lateral + 0.2).abs() < 1e-12);
        assert_eq!(c.forward, 0.8);

        // Small lateral errors are raised to the floor
        let c = synthesize(&smoothed(0.8, 0.01, 0.0), &target(0.0), &gates, 0.2, &p);
        assert_eq!(c.lateral, 0.05);
    }

    #[test]
    fn test_settled_and_reached_are_zero() {
        let p = Params::test_params();
        let mut gates = HysteresisState::default();
        gates.update(0.0, 0.0, &p);
        assert!(gates.both_settled());

        // 0.45 - 0.2 is within the end distance
        let c = synthesize(&smoothed(0.45, 0.0, 0.0), &target(0.0), &gates, 0.2, &p);
        assert!(c.is_zero());
    }

    #[test]
    fn test_clamp_invariant() {
        let p = Params::test_params();
        let gates = HysteresisState::default();

        for i in 0..200 {
            let x = (i as f64 - 100.0) * 0.37;
            let c = synthesize(&smoothed(x, x * 0.1, x), &target(0.0), &gates, 0.0, &p);

            if c.rotation != 0.0 {
                assert!(c.rotation.abs() >= p.rot.floor && c.rotation.abs() <= p.rot.ceiling);
            }
            if c.forward != 0.0 {
                assert!(c.forward.abs() >= p.fwd.floor && c.forward.abs() <= p.fwd.ceiling);
            }
        }

        // Rotation settled and lateral unsettled, so lateral demands are produced
        let mut gates = HysteresisState::default();
        gates.update(0.0, 1.0, &p);

        let mut num_lateral = 0;
        for i in 0..200 {
            let x = (i as f64 - 100.0) * 0.013;
            let c = synthesize(&smoothed(1.0, x, 0.0), &target(0.0), &gates, 0.0, &p);

            assert_eq!(c.rotation, 0.0);
            if c.lateral != 0.0 {
                num_lateral += 1;
                assert!(c.lateral.abs() >= p.lat.floor && c.lateral.abs() <= p.lat.ceiling);
            }
        }
        assert!(num_lateral > 0);
    }

    #[test]
    fn test_forward_halved_while_rotation_gate_settled() {
        let p = Params::test_params();
        let mut gates = HysteresisState::default();
        gates.update(0.0, 0.0, &p);

        // Above the deadband for one cycle, the gate is still debouncing
        gates.update(15.0, 0.0, &p);
        assert!(gates.rot.is_settled());

        let c = synthesize(&smoothed(2.0, 0.0, 15.0), &target(0.0), &gates, 0.2, &p);
        assert_eq!(c.rotation, 0.0);
        assert_eq!(c.forward, 0.5);
    }

    #[test]
    fn test_output_scaling() {
        let p = Params::test_params();
        let c = BodyVelCmd {
            forward: 0.5,
            lateral: -0.2,
            rotation: 20.0,
        };

        assert_eq!(c.to_drive_cmd(&p), DriveCmd::body(0.5, -0.2, -1.0));
        assert_eq!(search_cmd(&p), DriveCmd::body(0.0, 0.0, 0.5));
    }
}
