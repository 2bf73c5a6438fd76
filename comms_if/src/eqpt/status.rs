//! # Alignment status
//!
//! The status is read by anything which needs to know how well the robot is lined up with the
//! target, for example the indicator lights.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How well the robot is aligned with the target.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum AlignStatus {
    /// Rotation is not settled
    NotCentered,

    /// Rotation is settled but lateral is not
    Partial,

    /// Both rotation and lateral are settled
    Centered,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AlignStatus {
    /// Compact representation used to share the status through an atomic.
    pub fn as_u8(self) -> u8 {
        match self {
            AlignStatus::NotCentered => 0,
            AlignStatus::Partial => 1,
            AlignStatus::Centered => 2,
        }
    }

    /// Inverse of [`AlignStatus::as_u8`]. Unknown values read as `NotCentered`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => AlignStatus::Partial,
            2 => AlignStatus::Centered,
            _ => AlignStatus::NotCentered,
        }
    }
}

impl Default for AlignStatus {
    fn default() -> Self {
        AlignStatus::NotCentered
    }
}
