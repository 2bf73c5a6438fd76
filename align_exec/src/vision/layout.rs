//! Field layout and layout-based detection source
//!
//! When the field poses of the markers are known the camera only needs to identify the marker,
//! the marker pose relative to the camera follows from the chassis pose and the camera mount.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::{BTreeMap, HashMap};

use comms_if::eqpt::vision::{CamId, Detection, DetectionSet};
use log::trace;
use serde::Deserialize;
use thiserror::Error;
use util::params;

use super::{DetectionSource, SourceError};
use crate::loc::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The pose of a single marker as written in the layout file.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerPose {
    pub id: i32,

    /// Units: meters, Frame: field
    pub position_m: [f64; 2],

    /// Direction the marker faces, i.e. its normal.
    ///
    /// Units: radians, Frame: field
    pub heading_rad: f64,
}

#[derive(Debug, Deserialize)]
struct LayoutFile {
    markers: Vec<MarkerPose>,
}

/// Known field poses of every marker.
#[derive(Debug, Clone, Default)]
pub struct FieldLayout {
    markers: BTreeMap<i32, Pose>,
}

/// Detection source which replaces camera-solved poses with ones derived from a field layout.
///
/// Markers not in the layout are dropped.
pub struct LayoutSource<S> {
    inner: S,
    layout: FieldLayout,
    mounts: HashMap<CamId, Pose>,
    chassis_pose: Option<Pose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Could not load the layout file: {0}")]
    LoadError(params::LoadError),

    #[error("Marker {0} appears more than once in the layout")]
    DuplicateId(i32),

    #[error("Marker {0} has a non-finite pose")]
    NonFinitePose(i32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FieldLayout {
    /// Load a layout from a file relative to the parameters directory.
    pub fn load(path: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile = params::load(path).map_err(LayoutError::LoadError)?;
        Self::from_markers(file.markers)
    }

    /// Parse a layout from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LayoutError> {
        let file: LayoutFile = params::from_str(s).map_err(LayoutError::LoadError)?;
        Self::from_markers(file.markers)
    }

    pub fn from_markers(markers: Vec<MarkerPose>) -> Result<Self, LayoutError> {
        let mut map = BTreeMap::new();

        for m in markers {
            if !(m.position_m[0].is_finite()
                && m.position_m[1].is_finite()
                && m.heading_rad.is_finite())
            {
                return Err(LayoutError::NonFinitePose(m.id));
            }

            let pose = Pose::new(m.position_m[0], m.position_m[1], m.heading_rad);
            if map.insert(m.id, pose).is_some() {
                return Err(LayoutError::DuplicateId(m.id));
            }
        }

        Ok(Self { markers: map })
    }

    /// Field pose of the given marker.
    pub fn marker_pose(&self, id: i32) -> Option<&Pose> {
        self.markers.get(&id)
    }

    /// Iterate over all markers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &Pose)> {
        self.markers.iter().map(|(id, p)| (*id, p))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl<S> LayoutSource<S> {
    /// Create a new layout source.
    ///
    /// `mounts` gives the pose of each camera in the chassis body frame.
    pub fn new(inner: S, layout: FieldLayout, mounts: HashMap<CamId, Pose>) -> Self {
        Self {
            inner,
            layout,
            mounts,
            chassis_pose: None,
        }
    }

    /// Set the chassis pose used for the next acquisitions.
    pub fn set_chassis_pose(&mut self, pose: Pose) {
        self.chassis_pose = Some(pose);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Pose of the marker in the camera frame, or `None` if the marker isn't in the layout.
    fn locate(&self, marker_id: i32, cam_pose_fld: &Pose) -> Option<Pose> {
        let marker = self.layout.marker_pose(marker_id)?;

        Some(Pose::from_isometry(
            &(cam_pose_fld.isometry().inverse() * marker.isometry()),
        ))
    }
}

impl<S: DetectionSource> DetectionSource for LayoutSource<S> {
    fn latest_detections(&mut self, cam: CamId) -> Result<DetectionSet, SourceError> {
        let chassis = self.chassis_pose.ok_or(SourceError::NoPose)?;
        let mount = *self.mounts.get(&cam).ok_or(SourceError::UnknownMount(cam))?;

        let raw = self.inner.latest_detections(cam)?;

        let cam_pose_fld = Pose::from_isometry(&(chassis.isometry() * mount.isometry()));

        let detections: Vec<Detection> = raw
            .detections
            .iter()
            .filter_map(|d| {
                let rel = match self.locate(d.marker_id, &cam_pose_fld) {
                    Some(r) => r,
                    None => {
                        trace!("Marker {} is not in the field layout, dropped", d.marker_id);
                        return None;
                    }
                };

                Some(Detection {
                    marker_id: d.marker_id,
                    forward_m: rel.position_m.x,
                    lateral_m: rel.position_m.y,
                    yaw_rad: rel.heading_rad,
                    ambiguity: d.ambiguity,
                })
            })
            .collect();

        Ok(DetectionSet {
            timestamp: raw.timestamp,
            detections,
        })
    }
}
