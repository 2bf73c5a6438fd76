//! Alignment manouvre lifecycle
//!
//! The manouvre is a small state machine stepped once per cycle. Each mode is handled by a
//! `mode_xyz` function.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveCmd;
use log::{info, trace, warn};
use serde::Serialize;

use super::{
    cmd_synth, AlignCtrlError, ArbitratedTarget, BodyVelCmd, HysteresisState, Params,
    ParamsError, Smoothed, SmoothedErrors,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An alignment manouvre.
#[derive(Debug, Clone)]
pub struct AlignMnvr {
    mode: AlignMode,
    abort_cause: Option<AbortCause>,

    /// Extra distance to hold back from the end distance
    back_offset_m: f64,

    /// Consecutive cycles without a target
    lost_target_count: u32,

    smoothing: SmoothedErrors,
    gates: HysteresisState,

    /// Demands calculated on the last cycle with a target
    last_demands: Option<BodyVelCmd>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Modes of the manouvre.
#[derive(Debug, Copy, Clone, Serialize, Eq, PartialEq)]
pub enum AlignMode {
    /// Nothing scheduled yet
    Idle,

    /// Driving towards the target
    Aligning,

    /// Rotation and lateral are both settled
    Converged,

    /// Ended without converging, see [`AbortCause`]
    Aborted,
}

/// Why a manouvre was aborted.
#[derive(Debug, Copy, Clone, Serialize, Eq, PartialEq)]
pub enum AbortCause {
    /// No target was seen for too many consecutive cycles
    TargetLost,

    /// The manouvre was cancelled by the operator
    Cancelled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AlignMode {
    fn default() -> Self {
        AlignMode::Idle
    }
}

impl AlignMnvr {
    /// Create a new idle manouvre.
    pub fn new(params: &Params) -> Result<Self, AlignCtrlError> {
        let smoothing = SmoothedErrors::new(params.window_len).ok_or(
            AlignCtrlError::InvalidParams(ParamsError::NotPositive("window_len")),
        )?;

        Ok(Self {
            mode: AlignMode::Idle,
            abort_cause: None,
            back_offset_m: 0.0,
            lost_target_count: 0,
            smoothing,
            gates: HysteresisState::default(),
            last_demands: None,
        })
    }

    /// Schedule a new manouvre, which begins on the next call to `step`.
    ///
    /// Scheduling while a manouvre is executing is rejected and the executing manouvre carries
    /// on, as is a non-finite back offset. Scheduling from a finished manouvre starts a fresh
    /// one.
    pub fn schedule(&mut self, back_offset_m: f64) -> Result<(), AlignCtrlError> {
        if self.mode == AlignMode::Aligning {
            return Err(AlignCtrlError::MnvrActive);
        }
        if !back_offset_m.is_finite() {
            return Err(AlignCtrlError::InvalidBackOffset(back_offset_m));
        }

        self.back_offset_m = back_offset_m;
        self.start();

        info!("Alignment scheduled with back offset {:.3} m", back_offset_m);

        Ok(())
    }

    /// Cancel the executing manouvre.
    ///
    /// Returns the stop command if a manouvre was cancelled, or `None` if there was nothing to
    /// cancel.
    pub fn cancel(&mut self) -> Option<DriveCmd> {
        if self.mode != AlignMode::Aligning {
            warn!("Cancel requested but no alignment is executing");
            return None;
        }

        self.end(AlignMode::Aborted, Some(AbortCause::Cancelled));
        Some(DriveCmd::Stop)
    }

    /// Run one cycle of the manouvre.
    ///
    /// Returns the drive command to apply this cycle, or `None` if idle or finished.
    pub fn step(&mut self, target: Option<&ArbitratedTarget>, params: &Params) -> Option<DriveCmd> {
        match self.mode {
            AlignMode::Aligning => self.mode_aligning(target, params),
            AlignMode::Idle | AlignMode::Converged | AlignMode::Aborted => None,
        }
    }

    /// Returns true if the manouvre has reached a terminal mode.
    pub fn is_finished(&self) -> bool {
        matches!(self.mode, AlignMode::Converged | AlignMode::Aborted)
    }

    pub fn is_active(&self) -> bool {
        self.mode == AlignMode::Aligning
    }

    pub fn mode(&self) -> AlignMode {
        self.mode
    }

    pub fn abort_cause(&self) -> Option<AbortCause> {
        self.abort_cause
    }

    pub fn gates(&self) -> &HysteresisState {
        &self.gates
    }

    pub fn smoothed(&self) -> Option<Smoothed> {
        self.smoothing.smoothed()
    }

    pub fn lost_target_count(&self) -> u32 {
        self.lost_target_count
    }

    pub fn last_demands(&self) -> Option<BodyVelCmd> {
        self.last_demands
    }

    /// Reset all per-manouvre state and begin aligning.
    fn start(&mut self) {
        self.mode = AlignMode::Aligning;
        self.abort_cause = None;
        self.lost_target_count = 0;
        self.smoothing.clear();
        self.gates.reset();
        self.last_demands = None;
    }

    /// Move into a terminal mode.
    fn end(&mut self, mode: AlignMode, cause: Option<AbortCause>) {
        self.mode = mode;
        self.abort_cause = cause;

        match cause {
            Some(c) => info!("Alignment aborted: {:?}", c),
            None => info!("Alignment converged"),
        }
    }

    /// Mode aligning.
    ///
    /// With a target the errors are smoothed, gated and turned into demands. Without one the
    /// chassis rotates to search for it.
    fn mode_aligning(
        &mut self,
        target: Option<&ArbitratedTarget>,
        params: &Params,
    ) -> Option<DriveCmd> {
        let target = match target {
            Some(t) => t,
            None => return self.target_missing(params),
        };

        // Reacquired, the loss count only tracks consecutive misses
        self.lost_target_count = 0;

        self.smoothing.push(
            target.detection.forward_m,
            target.detection.lateral_m,
            target.rotation_error_deg(),
        );

        // Always Some after a push
        let smoothed = self.smoothing.smoothed()?;

        self.gates.update(
            smoothed.rotation_deg,
            smoothed.lateral_m + target.camera_offset_m,
            params,
        );

        if self.gates.both_settled() {
            self.last_demands = Some(BodyVelCmd::default());
            self.end(AlignMode::Converged, None);
            return Some(DriveCmd::Stop);
        }

        let demands =
            cmd_synth::synthesize(&smoothed, target, &self.gates, self.back_offset_m, params);

        trace!(
            "AlignMnvr smoothed: {:?}, demands: {:?}",
            smoothed,
            demands
        );

        self.last_demands = Some(demands);

        Some(demands.to_drive_cmd(params))
    }

    fn target_missing(&mut self, params: &Params) -> Option<DriveCmd> {
        self.lost_target_count += 1;

        if self.lost_target_count >= params.lost_target_debounce_cycles {
            self.end(AlignMode::Aborted, Some(AbortCause::TargetLost));
            return Some(DriveCmd::Stop);
        }

        trace!("No target ({} cycles), searching", self.lost_target_count);

        Some(cmd_synth::search_cmd(params))
    }
}
