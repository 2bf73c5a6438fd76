//! # Simulation module
//!
//! A kinematic simulation of the chassis and its cameras. The simulated world is both the
//! [`ChassisDrive`] and the [`DetectionSource`] for the controller, which allows the whole
//! control loop to be run without hardware.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
pub use params::*;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use comms_if::eqpt::vision::{CamId, Detection, DetectionSet};
use log::trace;
use util::{maths::wrap_pi, time::seconds_to_duration};

use crate::{
    drive_if::ChassisDrive,
    loc::Pose,
    vision::{DetectionSource, FieldLayout, SourceError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated world.
pub struct SimWorld {
    params: SimParams,

    /// Markers in ascending id order
    markers: Vec<(i32, Pose)>,

    /// Chassis pose in the field frame
    pose: Pose,

    /// The velocity being driven
    vel: Velocity,

    /// Simulation clock
    time: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, Default)]
struct Velocity {
    forward_ms: f64,
    lateral_ms: f64,
    rot_rads: f64,
    field_relative: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimWorld {
    /// Create a new world with the chassis at its initial pose, stationary.
    pub fn new(params: SimParams, layout: &FieldLayout, start_time: DateTime<Utc>) -> Self {
        let pose = Pose::new(
            params.initial_position_m[0],
            params.initial_position_m[1],
            params.initial_heading_rad,
        );

        Self {
            markers: layout.iter().map(|(id, p)| (id, *p)).collect(),
            params,
            pose,
            vel: Velocity::default(),
            time: start_time,
        }
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        let v = self.vel;

        let (vx, vy) = if v.field_relative {
            (v.forward_ms, v.lateral_ms)
        } else {
            let (s, c) = self.pose.heading_rad.sin_cos();
            (
                v.forward_ms * c - v.lateral_ms * s,
                v.forward_ms * s + v.lateral_ms * c,
            )
        };

        self.pose.position_m.x += vx * dt_s;
        self.pose.position_m.y += vy * dt_s;
        self.pose.heading_rad = wrap_pi(self.pose.heading_rad + v.rot_rads * dt_s);

        self.time = self.time + seconds_to_duration(dt_s);

        trace!("Sim pose: {:?}", self.pose);
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Move the chassis, for example to start a new test.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Pose of each camera in the chassis body frame.
    pub fn mounts(&self) -> HashMap<CamId, Pose> {
        self.params
            .cameras
            .iter()
            .map(|c| {
                (
                    c.cam,
                    Pose::new(
                        c.mount_position_m[0],
                        c.mount_position_m[1],
                        c.mount_heading_rad,
                    ),
                )
            })
            .collect()
    }

    /// Detect a marker with a camera, `None` if the camera can't see it.
    fn observe(&self, cam: &SimCameraParams, marker_id: i32, marker: &Pose) -> Option<Detection> {
        let mount = Pose::new(
            cam.mount_position_m[0],
            cam.mount_position_m[1],
            cam.mount_heading_rad,
        );
        let cam_iso = self.pose.isometry() * mount.isometry();
        let rel = cam_iso.inverse() * marker.isometry();

        let t = rel.translation.vector;
        let range_m = t.norm();

        // In front of the lens, in range, and within the field of view
        if t.x <= 0.0 || range_m > cam.max_range_m || t.y.atan2(t.x).abs() > cam.half_fov_rad {
            return None;
        }

        // The camera must be on the printed side of the marker
        if rel.inverse().translation.vector.x <= 0.0 {
            return None;
        }

        Some(Detection {
            marker_id,
            forward_m: t.x,
            lateral_m: t.y,
            yaw_rad: rel.rotation.angle(),
            ambiguity: self.params.ambiguity_base + self.params.ambiguity_per_m * range_m,
        })
    }
}

impl ChassisDrive for SimWorld {
    fn drive(&mut self, forward_ms: f64, lateral_ms: f64, rot_rads: f64, field_relative: bool) {
        self.vel = Velocity {
            forward_ms,
            lateral_ms,
            rot_rads,
            field_relative,
        };
    }

    fn stop(&mut self) {
        self.vel = Velocity::default();
    }

    fn current_pose(&self) -> Pose {
        self.pose
    }
}

impl DetectionSource for SimWorld {
    fn latest_detections(&mut self, cam: CamId) -> Result<DetectionSet, SourceError> {
        let cam_params = self
            .params
            .cameras
            .iter()
            .find(|c| c.cam == cam)
            .ok_or(SourceError::NotConnected(cam))?;

        let detections = self
            .markers
            .iter()
            .filter_map(|(id, pose)| self.observe(cam_params, *id, pose))
            .collect();

        Ok(DetectionSet {
            timestamp: self.time,
            detections,
        })
    }
}
