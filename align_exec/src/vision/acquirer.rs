//! # Observation acquirer
//!
//! Pulls the latest detections for a camera and picks out the closest target. Faults in the
//! detection source are folded into an empty detection set so the control loop never sees
//! them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::eqpt::vision::{CamId, Detection, DetectionSet};
use log::{debug, warn};

use super::DetectionSource;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the latest detection set for a camera.
///
/// If the source fails the error is logged and an empty set stamped with `now` is returned.
pub fn acquire<S: DetectionSource + ?Sized>(
    source: &mut S,
    cam: CamId,
    now: DateTime<Utc>,
) -> DetectionSet {
    match source.latest_detections(cam) {
        Ok(set) => set,
        Err(e) => {
            warn!("Could not acquire detections from {:?}: {}", cam, e);
            DetectionSet::empty(now)
        }
    }
}

/// Get the usable detections from a set.
///
/// A set older than `max_age_s`, or stamped more than `max_age_s` in the future, yields no
/// detections. Malformed detections are dropped.
pub fn sanitise(set: &DetectionSet, now: DateTime<Utc>, max_age_s: f64) -> Vec<Detection> {
    let age_s = set.age_s(now);
    if age_s > max_age_s {
        debug!("Detection set is stale ({:.3} s old)", age_s);
        return Vec::new();
    }
    if age_s < -max_age_s {
        debug!("Detection set is from the future ({:.3} s ahead)", -age_s);
        return Vec::new();
    }

    let detections: Vec<Detection> = set
        .detections
        .iter()
        .filter(|d| d.is_well_formed())
        .copied()
        .collect();

    if detections.len() != set.detections.len() {
        debug!(
            "Dropped {} malformed detection(s)",
            set.detections.len() - detections.len()
        );
    }

    detections
}

/// Get the detection with the smallest forward distance.
///
/// Detections at or beyond `max_range_m` are ignored. On equal distances the earliest
/// detection in the list is returned.
pub fn get_closest_target(detections: &[Detection], max_range_m: f64) -> Option<&Detection> {
    let mut closest_m = max_range_m;
    let mut target = None;

    for d in detections {
        if d.forward_m < closest_m {
            closest_m = d.forward_m;
            target = Some(d);
        }
    }

    target
}

/// Find the detection of the given marker, the first one if the marker was seen twice.
pub fn get_target_by_id(detections: &[Detection], marker_id: i32) -> Option<&Detection> {
    detections.iter().find(|d| d.marker_id == marker_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vision::SourceError;
    use chrono::{Duration, TimeZone};

    fn det(marker_id: i32, forward_m: f64) -> Detection {
        Detection {
            marker_id,
            forward_m,
            lateral_m: 0.0,
            yaw_rad: 3.1,
            ambiguity: 0.05,
        }
    }

    struct Broken;

    impl DetectionSource for Broken {
        fn latest_detections(&mut self, cam: CamId) -> Result<DetectionSet, SourceError> {
            Err(SourceError::NotConnected(cam))
        }
    }

    #[test]
    fn test_closest_target() {
        let dets = vec![det(1, 2.0), det(2, 0.8), det(3, 1.5)];
        assert_eq!(get_closest_target(&dets, 100.0).unwrap().marker_id, 2);

        // Ties go to the first in the list
        let dets = vec![det(5, 1.0), det(6, 1.0)];
        assert_eq!(get_closest_target(&dets, 100.0).unwrap().marker_id, 5);

        // Out of range
        let dets = vec![det(1, 120.0)];
        assert!(get_closest_target(&dets, 100.0).is_none());

        assert!(get_closest_target(&[], 100.0).is_none());
    }

    #[test]
    fn test_target_by_id() {
        let dets = vec![det(1, 2.0), det(2, 0.8)];
        assert_eq!(get_target_by_id(&dets, 2).unwrap().forward_m, 0.8);
        assert!(get_target_by_id(&dets, 3).is_none());
        assert!(get_target_by_id(&[], 1).is_none());
    }

    #[test]
    fn test_acquire_folds_errors() {
        let now = Utc.timestamp(50, 0);
        let set = acquire(&mut Broken, CamId::Left, now);
        assert!(set.is_empty());
        assert_eq!(set.timestamp, now);
    }

    #[test]
    fn test_sanitise() {
        let t0 = Utc.timestamp(100, 0);
        let mut bad = det(4, 1.0);
        bad.lateral_m = f64::NAN;

        let set = DetectionSet {
            timestamp: t0,
            detections: vec![det(1, 1.0), bad, det(2, 1.2)],
        };

        let good = sanitise(&set, t0 + Duration::milliseconds(100), 0.5);
        assert_eq!(good.len(), 2);
        assert!(good.iter().all(|d| d.marker_id != 4));

        // Stale
        assert!(sanitise(&set, t0 + Duration::seconds(2), 0.5).is_empty());

        // Stamped ahead of the cycle, small skews are tolerated
        assert_eq!(sanitise(&set, t0 - Duration::milliseconds(100), 0.5).len(), 2);
        assert!(sanitise(&set, t0 - Duration::seconds(3600), 0.5).is_empty());
    }
}
