//! # Communications interface crate.
//!
//! Provides the interface types shared between the alignment controller and the equipment around
//! it: the detection pipeline, the chassis drive, and whoever commands the controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions
pub mod tc;

/// Command and response definitions for equipment (cameras, chassis, status indicators)
pub mod eqpt;
