//! # Vision module
//!
//! Acquisition of fiducial detections from the cameras. Detections come from a
//! [`DetectionSource`], which is either a camera that solves the marker pose itself or a
//! [`LayoutSource`] that recovers it from a known field layout.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod acquirer;
mod layout;
mod source;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use layout::*;
pub use source::*;
