//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications interface.
//!
//! Telecommands are JSON objects with a `type` and an optional `payload`, for example:
//!
//! ```json
//! {"type": "ALIGN", "payload": {"back_offset_m": 0.2}}
//! {"type": "ABORT"}
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the robot by the operator or a script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tc {
    /// Keep-alive, no action.
    Heartbeat,

    /// Begin an alignment manouvre with the target.
    Align {
        /// Distance to hold back from the target, in meters.
        back_offset_m: f64,
    },

    /// Cancel the alignment manouvre currently executing.
    Abort,

    /// Stop the executable.
    Shutdown,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON or an unknown type: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Align TC has an invalid back offset ({0})")]
    InvalidBackOffset(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        let tc: Tc = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        // Payload values that serde can't check
        if let Tc::Align { back_offset_m } = tc {
            if !back_offset_m.is_finite() {
                return Err(TcParseError::InvalidBackOffset(back_offset_m));
            }
        }

        Ok(tc)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(
            Tc::from_json(r#"{"type": "ALIGN", "payload": {"back_offset_m": 0.25}}"#).unwrap(),
            Tc::Align {
                back_offset_m: 0.25
            }
        );
        assert_eq!(Tc::from_json(r#"{"type": "ABORT"}"#).unwrap(), Tc::Abort);
        assert_eq!(
            Tc::from_json(r#"{"type": "SHUTDOWN"}"#).unwrap(),
            Tc::Shutdown
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "HEARTBEAT"}"#).unwrap(),
            Tc::Heartbeat
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Tc::from_json(r#"{"type": "DANCE"}"#),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "ALIGN"}"#),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json("not json"),
            Err(TcParseError::InvalidJson(_))
        ));
    }
}
