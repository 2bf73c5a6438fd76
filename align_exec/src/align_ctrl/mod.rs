//! # Alignment control module
//!
//! Alignment control drives the chassis into a fixed pose relative to a fiducial marker. Each
//! cycle it:
//!
//!  1. Picks the closest marker seen by each camera,
//!  2. Arbitrates between the cameras, the detection with the lowest pose ambiguity wins,
//!  3. Smooths the distance, lateral and rotation errors over a sliding window,
//!  4. Updates the rotation and lateral hysteresis gates,
//!  5. Synthesizes a clamped body velocity command.
//!
//! Rotation is corrected first. Lateral corrections are only made once rotation has settled.
//! The manouvre converges when both gates are settled, and aborts if the target is lost for too
//! many consecutive cycles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arbiter;
mod cmd;
mod cmd_synth;
mod hysteresis;
mod mnvr;
mod params;
mod smoothing;
mod state;
mod status;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use arbiter::*;
pub use cmd::*;
pub use cmd_synth::*;
pub use hysteresis::*;
pub use mnvr::*;
pub use params::*;
pub use smoothing::*;
pub use state::*;
pub use status::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during AlignCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum AlignCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(ParamsError),

    #[error("Could not create the archives: {0}")]
    ArchiveError(util::archive::ArchiveError),

    #[error("AlignCtrl has not been initialised")]
    NotInit,

    #[error("An alignment manouvre is already executing")]
    MnvrActive,

    #[error("Back offset must be finite, found {0}")]
    InvalidBackOffset(f64),
}
