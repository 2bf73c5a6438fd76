//! # Alignment Library
//!
//! This library allows other crates to access the modules of the alignment executable, for
//! example the benchmarks.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Fiducial alignment controller
pub mod align_ctrl;

/// Global data store for the executable
pub mod data_store;

/// Chassis drive interface
pub mod drive_if;

/// Poses and frames
pub mod loc;

/// Executable parameters
pub mod params;

/// Kinematic simulation of the chassis and cameras
pub mod sim;

/// Fiducial detection acquisition
pub mod vision;
