//! Implementations for the AlignCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::{DateTime, Utc};
use comms_if::eqpt::{
    drive::DriveCmd,
    status::AlignStatus,
    vision::{CamId, DetectionSet},
};
use log::{trace, warn};
use serde::Serialize;
use std::sync::mpsc::Receiver;

// Internal
use super::*;
use crate::vision::acquirer;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Alignment control module state
#[derive(Default)]
pub struct AlignCtrl {
    params: Option<Params>,

    mnvr: Option<AlignMnvr>,

    publisher: StatusPublisher,

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to alignment control.
#[derive(Default, Debug, Clone)]
pub struct InputData {
    /// Command to execute this cycle, if any.
    pub cmd: Option<AlignCmd>,

    /// Latest detection set from each camera. Cameras without a frame are treated as seeing
    /// nothing.
    pub frames: Vec<(CamId, DetectionSet)>,

    /// Time of this cycle, used to reject stale frames. If `None` the system clock is used.
    pub cycle_time: Option<DateTime<Utc>>,
}

/// Output of alignment control.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct OutputData {
    /// Command for the chassis drive, `None` if alignment control isn't driving.
    pub drive_cmd: Option<DriveCmd>,
}

/// Status report for AlignCtrl processing.
#[derive(Default, Debug, Copy, Clone, Serialize)]
pub struct StatusReport {
    pub mode: AlignMode,
    pub abort_cause: Option<AbortCause>,
    pub status: AlignStatus,

    /// True if this cycle's command couldn't be executed
    pub cmd_rejected: bool,

    pub num_valid_cams: usize,
    pub target_cam: Option<CamId>,
    pub target_marker_id: Option<i32>,

    pub smoothed_forward_m: Option<f64>,
    pub smoothed_lateral_m: Option<f64>,
    pub smoothed_rotation_deg: Option<f64>,

    pub rot_settled: bool,
    pub lat_settled: bool,
    pub lost_target_count: u32,

    pub drive_forward_ms: Option<f64>,
    pub drive_lateral_ms: Option<f64>,
    pub drive_rot_rads: Option<f64>,
    pub drive_stop: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for AlignCtrl {
    type InitData = &'static str;
    type InitError = AlignCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = AlignCtrlError;

    /// Initialise the AlignCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(AlignCtrlError::ParamLoadError)?;
        self.configure(params)?;

        // Create the arch folder for align_ctrl
        std::fs::create_dir_all(session.arch_root.join("align_ctrl"))
            .map_err(|e| AlignCtrlError::ArchiveError(ArchiveError::FileError(e)))?;

        self.arch_report = Archiver::from_path(session, "align_ctrl/status_report.csv")
            .map_err(AlignCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform cyclic processing of alignment control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let (params, mnvr) = match (&self.params, &mut self.mnvr) {
            (Some(p), Some(m)) => (p, m),
            _ => return Err(AlignCtrlError::NotInit),
        };

        // Clear the status report
        self.report = StatusReport::default();

        let mut output = OutputData::default();

        // ---- COMMAND HANDLING ----

        match input_data.cmd {
            Some(AlignCmd::Schedule { back_offset_m }) => {
                if let Err(e) = mnvr.schedule(back_offset_m) {
                    warn!("Alignment schedule rejected: {}", e);
                    self.report.cmd_rejected = true;
                }
            }
            Some(AlignCmd::Cancel) => match mnvr.cancel() {
                Some(stop) => output.drive_cmd = Some(stop),
                None => self.report.cmd_rejected = true,
            },
            None => (),
        }

        // ---- OBSERVATIONS ----

        let now = input_data.cycle_time.unwrap_or_else(Utc::now);

        let observations: Vec<CameraObservation> = params
            .cameras
            .iter()
            .map(|c| {
                let detections = input_data
                    .frames
                    .iter()
                    .find(|(cam, _)| *cam == c.cam)
                    .map(|(_, set)| acquirer::sanitise(set, now, params.max_detection_age_s))
                    .unwrap_or_default();

                CameraObservation::from_detections(c.cam, &detections, params.max_range_m)
            })
            .collect();

        let target = arbitrate(&observations, params);

        // ---- MANOUVRE ----

        // A cancel stop takes priority, the cancelled manouvre won't emit anything anyway
        let step_cmd = mnvr.step(target.as_ref(), params);
        output.drive_cmd = output.drive_cmd.or(step_cmd);

        // ---- STATUS ----

        let status = derive_status(mnvr.gates());
        self.publisher.publish(status);

        // ---- REPORT ----

        let r = &mut self.report;
        r.mode = mnvr.mode();
        r.abort_cause = mnvr.abort_cause();
        r.status = status;
        r.num_valid_cams = observations.iter().filter(|o| o.is_valid()).count();
        r.target_cam = target.map(|t| t.cam);
        r.target_marker_id = target.map(|t| t.detection.marker_id);
        if let Some(s) = mnvr.smoothed() {
            r.smoothed_forward_m = Some(s.forward_m);
            r.smoothed_lateral_m = Some(s.lateral_m);
            r.smoothed_rotation_deg = Some(s.rotation_deg);
        }
        r.rot_settled = mnvr.gates().rot.is_settled();
        r.lat_settled = mnvr.gates().lat.is_settled();
        r.lost_target_count = mnvr.lost_target_count();
        match output.drive_cmd {
            Some(DriveCmd::Velocity {
                forward_ms,
                lateral_ms,
                rot_rads,
                ..
            }) => {
                r.drive_forward_ms = Some(forward_ms);
                r.drive_lateral_ms = Some(lateral_ms);
                r.drive_rot_rads = Some(rot_rads);
            }
            Some(DriveCmd::Stop) => r.drive_stop = true,
            None => (),
        }

        trace!("AlignCtrl report: {:?}", self.report);

        Ok((output, self.report))
    }
}

impl Archived for AlignCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(&self.report)
    }
}

impl AlignCtrl {
    /// Create the module directly from parameters, without archiving.
    pub fn from_params(params: Params) -> Result<Self, AlignCtrlError> {
        let mut ctrl = Self::default();
        ctrl.configure(params)?;
        Ok(ctrl)
    }

    /// Schedule an alignment outside of the cyclic processing.
    pub fn schedule(&mut self, back_offset_m: f64) -> Result<(), AlignCtrlError> {
        self.mnvr
            .as_mut()
            .ok_or(AlignCtrlError::NotInit)?
            .schedule(back_offset_m)
    }

    /// Returns true if the last manouvre has converged or been aborted.
    pub fn is_finished(&self) -> bool {
        self.mnvr.as_ref().map(|m| m.is_finished()).unwrap_or(false)
    }

    pub fn mode(&self) -> AlignMode {
        self.mnvr.as_ref().map(|m| m.mode()).unwrap_or_default()
    }

    pub fn abort_cause(&self) -> Option<AbortCause> {
        self.mnvr.as_ref().and_then(|m| m.abort_cause())
    }

    /// Get a handle to poll the alignment status.
    pub fn status_handle(&self) -> StatusHandle {
        self.publisher.handle()
    }

    /// Subscribe to alignment status changes.
    pub fn subscribe_status(&mut self) -> Receiver<AlignStatus> {
        self.publisher.subscribe()
    }

    fn configure(&mut self, params: Params) -> Result<(), AlignCtrlError> {
        params.validate().map_err(AlignCtrlError::InvalidParams)?;

        self.mnvr = Some(AlignMnvr::new(&params)?);
        self.params = Some(params);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        drive_if::{self, ChassisDrive},
        loc::Pose,
        sim::{SimCameraParams, SimParams, SimWorld},
        vision::{acquirer::acquire, FieldLayout, MarkerPose},
    };
    use chrono::{Duration, TimeZone};
    use comms_if::eqpt::vision::Detection;
    use std::f64::consts::PI;

    fn t(cycle: i64) -> DateTime<Utc> {
        Utc.timestamp(1_000, 0) + Duration::milliseconds(20 * cycle)
    }

    fn detection(forward_m: f64, lateral_m: f64, rot_err_deg: f64, ambiguity: f64) -> Detection {
        Detection {
            marker_id: 1,
            forward_m,
            lateral_m,
            yaw_rad: PI - rot_err_deg.to_radians(),
            ambiguity,
        }
    }

    fn input(cycle: i64, frames: Vec<(CamId, Detection)>) -> InputData {
        InputData {
            cmd: None,
            frames: frames
                .into_iter()
                .map(|(cam, d)| {
                    (
                        cam,
                        DetectionSet {
                            timestamp: t(cycle),
                            detections: vec![d],
                        },
                    )
                })
                .collect(),
            cycle_time: Some(t(cycle)),
        }
    }

    fn ctrl() -> AlignCtrl {
        AlignCtrl::from_params(Params::test_params()).unwrap()
    }

    #[test]
    fn test_not_init() {
        let mut c = AlignCtrl::default();
        assert!(matches!(
            c.proc(&InputData::default()),
            Err(AlignCtrlError::NotInit)
        ));
        assert!(matches!(c.schedule(0.2), Err(AlignCtrlError::NotInit)));
    }

    #[test]
    fn test_invalid_params_refused() {
        let mut p = Params::test_params();
        p.lat.deadband = 0.01;
        assert!(matches!(
            AlignCtrl::from_params(p),
            Err(AlignCtrlError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_idle_publishes_status_without_driving() {
        let mut c = ctrl();
        let (o, r) = c
            .proc(&input(0, vec![(CamId::Right, detection(0.5, 0.0, 2.0, 0.02))]))
            .unwrap();

        assert!(o.drive_cmd.is_none());
        assert_eq!(r.mode, AlignMode::Idle);
        assert_eq!(r.status, AlignStatus::NotCentered);
        assert_eq!(r.target_cam, Some(CamId::Right));
    }

    #[test]
    fn test_scenario_converges() {
        let mut c = ctrl();
        let handle = c.status_handle();
        let status_rx = c.subscribe_status();

        let mut converged_at = None;

        for i in 0..20 {
            let mut inp = input(i, vec![(CamId::Right, detection(0.5, 0.0, 2.0, 0.02))]);
            if i == 0 {
                inp.cmd = Some(AlignCmd::Schedule { back_offset_m: 0.2 });
            }

            let (o, r) = c.proc(&inp).unwrap();

            if r.mode == AlignMode::Converged && converged_at.is_none() {
                assert_eq!(o.drive_cmd, Some(DriveCmd::Stop));
                assert!(r.drive_stop);
                converged_at = Some(i);
            }
        }

        assert!(converged_at.is_some());
        assert!(c.is_finished());
        assert_eq!(handle.get(), AlignStatus::Centered);
        assert_eq!(status_rx.try_iter().last(), Some(AlignStatus::Centered));
    }

    #[test]
    fn test_scenario_lost_target_aborts() {
        let mut c = ctrl();
        c.schedule(0.2).unwrap();

        for i in 0..19 {
            let (o, r) = c.proc(&input(i, vec![])).unwrap();
            assert_eq!(o.drive_cmd, Some(search_cmd(&Params::test_params())));
            assert_eq!(r.mode, AlignMode::Aligning);
        }

        let (o, r) = c.proc(&input(19, vec![])).unwrap();
        assert_eq!(o.drive_cmd, Some(DriveCmd::Stop));
        assert_eq!(r.mode, AlignMode::Aborted);
        assert_eq!(r.abort_cause, Some(AbortCause::TargetLost));
        assert_eq!(r.status, AlignStatus::NotCentered);
        assert!(c.is_finished());
    }

    #[test]
    fn test_scenario_ambiguity_arbitration() {
        let mut c = ctrl();
        c.schedule(0.2).unwrap();

        let (_, r) = c
            .proc(&input(
                0,
                vec![
                    (CamId::Left, detection(1.1, 0.2, 30.0, 0.01)),
                    (CamId::Right, detection(1.2, -0.3, 30.0, 0.05)),
                ],
            ))
            .unwrap();

        assert_eq!(r.num_valid_cams, 2);
        assert_eq!(r.target_cam, Some(CamId::Left));
        assert_eq!(r.smoothed_forward_m, Some(1.1));
        assert_eq!(r.smoothed_lateral_m, Some(0.2));
    }

    #[test]
    fn test_stale_frames_ignored() {
        let mut c = ctrl();
        c.schedule(0.2).unwrap();

        let mut inp = input(0, vec![(CamId::Right, detection(1.0, 0.0, 30.0, 0.02))]);
        inp.cycle_time = Some(t(100));

        let (o, r) = c.proc(&inp).unwrap();
        assert_eq!(r.target_cam, None);
        assert_eq!(r.lost_target_count, 1);
        assert_eq!(o.drive_cmd, Some(search_cmd(&Params::test_params())));
    }

    #[test]
    fn test_cancel_and_reject() {
        let mut c = ctrl();
        c.schedule(0.2).unwrap();

        let frame = vec![(CamId::Right, detection(2.0, 0.4, 30.0, 0.02))];

        // Scheduling again is rejected but the manouvre carries on
        let mut inp = input(0, frame.clone());
        inp.cmd = Some(AlignCmd::Schedule { back_offset_m: 1.0 });
        let (o, r) = c.proc(&inp).unwrap();
        assert!(r.cmd_rejected);
        assert_eq!(r.mode, AlignMode::Aligning);
        assert!(matches!(o.drive_cmd, Some(DriveCmd::Velocity { .. })));

        let mut inp = input(1, frame.clone());
        inp.cmd = Some(AlignCmd::Cancel);
        let (o, r) = c.proc(&inp).unwrap();
        assert_eq!(o.drive_cmd, Some(DriveCmd::Stop));
        assert_eq!(r.mode, AlignMode::Aborted);
        assert_eq!(r.abort_cause, Some(AbortCause::Cancelled));

        // Nothing emitted once cancelled
        let (o, _) = c.proc(&input(2, frame)).unwrap();
        assert!(o.drive_cmd.is_none());
    }

    #[test]
    fn test_closed_loop_sim() {
        let layout = FieldLayout::from_markers(vec![MarkerPose {
            id: 1,
            position_m: [2.0, 0.0],
            heading_rad: PI,
        }])
        .unwrap();

        let sim_params = SimParams {
            initial_position_m: [0.0, 0.1],
            initial_heading_rad: 0.2,
            cameras: vec![SimCameraParams {
                cam: CamId::Right,
                mount_position_m: [0.0, 0.0],
                mount_heading_rad: 0.0,
                half_fov_rad: 0.6,
                max_range_m: 6.0,
            }],
            ambiguity_base: 0.01,
            ambiguity_per_m: 0.01,
        };

        let mut world = SimWorld::new(sim_params, &layout, t(0));
        let mut c = ctrl();
        c.schedule(0.2).unwrap();

        for _ in 0..500 {
            let now = world.time();
            let inp = InputData {
                cmd: None,
                frames: vec![(CamId::Right, acquire(&mut world, CamId::Right, now))],
                cycle_time: Some(now),
            };

            let (o, _) = c.proc(&inp).unwrap();
            if let Some(cmd) = o.drive_cmd {
                drive_if::apply(&mut world, &cmd);
            }

            if c.is_finished() {
                break;
            }

            world.step(0.02);
        }

        assert_eq!(c.mode(), AlignMode::Converged);

        let pose: Pose = world.current_pose();
        assert!(pose.heading_rad.abs() < 5f64.to_radians());
        assert!(pose.position_m.y.abs() < 0.1);
        assert!(pose.position_m.x < 2.0);
    }
}
