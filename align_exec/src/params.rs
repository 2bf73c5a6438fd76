//! # Executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::CamId;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the alignment executable.
#[derive(Debug, Clone, Deserialize)]
pub struct AlignExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Cameras to acquire detections from each cycle
    pub cameras: Vec<CamId>,

    /// How marker poses are obtained
    pub vision_backend: VisionBackend,

    /// Number of consecutive overruns after which a warning is raised as an error
    pub max_consec_cycle_overruns: u64,

    /// Parameter file for AlignCtrl
    pub align_ctrl_params: String,

    /// Parameter file for the simulation
    pub sim_params: String,

    /// Layout file giving the field pose of each marker
    pub field_layout: String,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, Deserialize, Eq, PartialEq)]
pub enum VisionBackend {
    /// Cameras solve the marker pose themselves
    PoseCamera,

    /// Marker poses are derived from the field layout and the chassis pose
    FieldLayout,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_params_file() {
        let p: AlignExecParams =
            util::params::from_str(include_str!("../../params/align_exec.toml")).unwrap();

        assert!(p.cycle_period_s > 0.0);
        assert!(!p.cameras.is_empty());
    }
}
