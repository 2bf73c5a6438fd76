//! Alignment control commands

use serde::Serialize;

/// A command to the alignment controller, executed at the start of the next cycle.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub enum AlignCmd {
    /// Begin aligning, stopping `back_offset_m` further from the target than the end distance.
    Schedule { back_offset_m: f64 },

    /// Abort the manouvre in progress.
    Cancel,
}
