//! Target arbitration between cameras

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::{CamId, Detection};
use log::trace;
use serde::Serialize;
use std::f64::consts::PI;
use util::maths::sign;

use super::Params;
use crate::vision::acquirer::{get_closest_target, get_target_by_id};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// What one camera saw this cycle.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub struct CameraObservation {
    pub cam: CamId,

    /// True if the camera saw any detections at all
    pub has_targets: bool,

    /// The closest detection, re-resolved by its marker id
    pub target: Option<Detection>,
}

/// The single target used for control this cycle.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub struct ArbitratedTarget {
    /// Camera which saw the target
    pub cam: CamId,

    pub detection: Detection,

    /// Lateral offset to add to the detection's lateral position to get the lateral error.
    ///
    /// Units: meters
    pub camera_offset_m: f64,

    /// Forward mounting offset of the camera.
    ///
    /// Units: meters
    pub forward_offset_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CameraObservation {
    pub fn from_detections(cam: CamId, detections: &[Detection], max_range_m: f64) -> Self {
        let target = get_closest_target(detections, max_range_m)
            .and_then(|closest| get_target_by_id(detections, closest.marker_id))
            .copied();

        Self {
            cam,
            has_targets: !detections.is_empty(),
            target,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.has_targets && self.target.is_some()
    }
}

impl ArbitratedTarget {
    /// Rotation of the chassis away from squarely facing the target.
    ///
    /// Units: degrees
    pub fn rotation_error_deg(&self) -> f64 {
        rotation_error_deg(self.detection.yaw_rad)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Select the target for this cycle from the observations of each camera.
///
/// Observations shall be given in camera check order. The valid observation with the lowest
/// ambiguity is chosen, on a tie the earliest observation wins. Observations from cameras
/// without calibration parameters are ignored.
pub fn arbitrate(observations: &[CameraObservation], params: &Params) -> Option<ArbitratedTarget> {
    let mut best: Option<ArbitratedTarget> = None;

    for obs in observations.iter().filter(|o| o.is_valid()) {
        let (detection, cam_params) = match (obs.target, params.camera(obs.cam)) {
            (Some(d), Some(c)) => (d, c),
            _ => continue,
        };

        let better = match best {
            Some(ref b) => detection.ambiguity < b.detection.ambiguity,
            None => true,
        };

        if better {
            best = Some(ArbitratedTarget {
                cam: obs.cam,
                detection,
                camera_offset_m: cam_params.lateral_offset_m - params.target_lateral_offset_m,
                forward_offset_m: cam_params.forward_offset_m,
            });
        }
    }

    if let Some(ref b) = best {
        trace!(
            "Target {} from {:?} (ambiguity {:.3})",
            b.detection.marker_id,
            b.cam,
            b.detection.ambiguity
        );
    }

    best
}

/// Convert a camera-to-target yaw into a rotation error.
///
/// A marker squarely facing the camera has a yaw of +/- pi, which gives zero error.
pub fn rotation_error_deg(yaw_rad: f64) -> f64 {
    ((PI - yaw_rad.abs()) * sign(yaw_rad)).to_degrees()
}

#[cfg(test)]
mod test {
    use super::*;

    fn det(marker_id: i32, forward_m: f64, lateral_m: f64, ambiguity: f64) -> Detection {
        Detection {
            marker_id,
            forward_m,
            lateral_m,
            yaw_rad: PI,
            ambiguity,
        }
    }

    fn obs(cam: CamId, dets: &[Detection]) -> CameraObservation {
        CameraObservation::from_detections(cam, dets, 100.0)
    }

    #[test]
    fn test_observation() {
        let o = obs(CamId::Right, &[det(3, 2.0, 0.0, 0.1), det(4, 1.0, 0.1, 0.2)]);
        assert!(o.is_valid());
        assert_eq!(o.target.unwrap().marker_id, 4);

        let o = obs(CamId::Right, &[]);
        assert!(!o.has_targets);
        assert!(!o.is_valid());

        // Detections but all out of range
        let o = CameraObservation::from_detections(CamId::Left, &[det(1, 5.0, 0.0, 0.1)], 3.0);
        assert!(o.has_targets);
        assert!(!o.is_valid());
    }

    #[test]
    fn test_lower_ambiguity_wins() {
        let params = Params::test_params();

        let right = obs(CamId::Right, &[det(1, 1.2, -0.3, 0.05)]);
        let left = obs(CamId::Left, &[det(1, 1.1, 0.2, 0.01)]);

        let t = arbitrate(&[right, left], &params).unwrap();

        assert_eq!(t.cam, CamId::Left);
        assert_eq!(t.detection.forward_m, 1.1);
        assert_eq!(t.detection.lateral_m, 0.2);
        assert_eq!(t.camera_offset_m, 0.1);
        assert_eq!(t.forward_offset_m, 0.05);
    }

    #[test]
    fn test_tie_goes_to_first_camera() {
        let params = Params::test_params();

        let right = obs(CamId::Right, &[det(1, 1.2, -0.3, 0.05)]);
        let left = obs(CamId::Left, &[det(1, 1.1, 0.2, 0.05)]);

        for _ in 0..10 {
            let t = arbitrate(&[right, left], &params).unwrap();
            assert_eq!(t.cam, CamId::Right);
            assert_eq!(t.camera_offset_m, 0.0);
        }
    }

    #[test]
    fn test_single_and_no_camera() {
        let params = Params::test_params();

        let right = obs(CamId::Right, &[]);
        let left = obs(CamId::Left, &[det(2, 1.1, 0.2, 0.3)]);

        assert_eq!(arbitrate(&[right, left], &params).unwrap().cam, CamId::Left);
        assert!(arbitrate(&[right], &params).is_none());
        assert!(arbitrate(&[], &params).is_none());
    }

    #[test]
    fn test_rotation_error() {
        assert_eq!(rotation_error_deg(PI), 0.0);
        assert_eq!(rotation_error_deg(-PI), 0.0);
        assert_eq!(rotation_error_deg(0.0), 0.0);

        let e = rotation_error_deg(PI - 2f64.to_radians());
        assert!((e - 2.0).abs() < 1e-9);

        let e = rotation_error_deg(-(PI - 2f64.to_radians()));
        assert!((e + 2.0).abs() < 1e-9);
    }
}
