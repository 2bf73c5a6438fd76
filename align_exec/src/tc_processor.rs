//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};

// Internal
use align_lib::{align_ctrl::AlignCmd, data_store::DataStore};
use comms_if::tc::Tc;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    match tc {
        Tc::Heartbeat => trace!("Recieved Heartbeat"),
        Tc::Align { back_offset_m } => {
            debug!("Recieved Align command");
            set_cmd(
                ds,
                AlignCmd::Schedule {
                    back_offset_m: *back_offset_m,
                },
            );
        }
        Tc::Abort => {
            debug!("Recieved Abort command");
            set_cmd(ds, AlignCmd::Cancel);
        }
        Tc::Shutdown => {
            info!("Shutdown requested");
            ds.shutdown = true;
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Only one command is executed per cycle, the latest one wins.
fn set_cmd(ds: &mut DataStore, cmd: AlignCmd) {
    if let Some(prev) = ds.align_ctrl_input.cmd.replace(cmd) {
        warn!("{:?} replaced by {:?} in the same cycle", prev, cmd);
    }
}
