//! Detection source trait

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::vision::{CamId, DetectionSet};
use thiserror::Error;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Anything which can provide the latest detections seen by a camera.
pub trait DetectionSource {
    /// Get the most recent detection set for the given camera.
    ///
    /// This must not block, if no new frame is available the last one shall be returned.
    fn latest_detections(&mut self, cam: CamId) -> Result<DetectionSet, SourceError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Camera {0:?} is not connected")]
    NotConnected(CamId),

    #[error("No mount pose is known for camera {0:?}")]
    UnknownMount(CamId),

    #[error("The chassis pose is required to locate markers but has not been set")]
    NoPose,
}
