//! Alignment status publishing
//!
//! The status can be polled from any thread through a [`StatusHandle`], or received as it
//! changes by subscribing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::status::AlignStatus;
use log::debug;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    mpsc::{channel, Receiver, Sender},
    Arc,
};

use super::HysteresisState;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Publishes the alignment status to handles and subscribers.
#[derive(Debug)]
pub struct StatusPublisher {
    current: Arc<AtomicU8>,
    subscribers: Vec<Sender<AlignStatus>>,
}

/// A read-only view of the published status.
#[derive(Debug, Clone)]
pub struct StatusHandle {
    current: Arc<AtomicU8>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU8::new(AlignStatus::default().as_u8())),
            subscribers: Vec::new(),
        }
    }

    /// Get a handle which can be used to poll the status.
    pub fn handle(&self) -> StatusHandle {
        StatusHandle {
            current: self.current.clone(),
        }
    }

    /// Subscribe to status changes. Only changes are sent, not the current value.
    pub fn subscribe(&mut self) -> Receiver<AlignStatus> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Publish the status, notifying subscribers if it has changed.
    ///
    /// Returns true if the status changed.
    pub fn publish(&mut self, status: AlignStatus) -> bool {
        let prev = AlignStatus::from_u8(self.current.swap(status.as_u8(), Ordering::Relaxed));

        if prev == status {
            return false;
        }

        debug!("Alignment status changed from {:?} to {:?}", prev, status);

        // Drop any subscribers which have hung up
        self.subscribers.retain(|s| s.send(status).is_ok());

        true
    }

    pub fn current(&self) -> AlignStatus {
        AlignStatus::from_u8(self.current.load(Ordering::Relaxed))
    }

    pub fn num_subscribers(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHandle {
    pub fn get(&self) -> AlignStatus {
        AlignStatus::from_u8(self.current.load(Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Derive the status from the hysteresis gates.
pub fn derive_status(gates: &HysteresisState) -> AlignStatus {
    match (gates.rot.is_settled(), gates.lat.is_settled()) {
        (true, true) => AlignStatus::Centered,
        (true, false) => AlignStatus::Partial,
        (false, _) => AlignStatus::NotCentered,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::align_ctrl::Params;

    #[test]
    fn test_derive_status() {
        let p = Params::test_params();
        let mut gates = HysteresisState::default();
        assert_eq!(derive_status(&gates), AlignStatus::NotCentered);

        // Lateral settled alone isn't partial
        gates.update(30.0, 0.0, &p);
        assert_eq!(derive_status(&gates), AlignStatus::NotCentered);

        gates.update(0.0, 0.5, &p);
        assert_eq!(derive_status(&gates), AlignStatus::Partial);

        gates.update(0.0, 0.0, &p);
        assert_eq!(derive_status(&gates), AlignStatus::Centered);
    }

    #[test]
    fn test_publish_on_change() {
        let mut publisher = StatusPublisher::new();
        let handle = publisher.handle();
        let rx = publisher.subscribe();

        assert_eq!(handle.get(), AlignStatus::NotCentered);

        assert!(!publisher.publish(AlignStatus::NotCentered));
        assert!(publisher.publish(AlignStatus::Partial));
        assert!(!publisher.publish(AlignStatus::Partial));
        assert!(publisher.publish(AlignStatus::Centered));

        assert_eq!(handle.get(), AlignStatus::Centered);
        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![AlignStatus::Partial, AlignStatus::Centered]
        );
    }

    #[test]
    fn test_handle_across_threads() {
        let mut publisher = StatusPublisher::new();
        let handle = publisher.handle();

        publisher.publish(AlignStatus::Partial);

        let read = std::thread::spawn(move || handle.get()).join().unwrap();
        assert_eq!(read, AlignStatus::Partial);
    }

    #[test]
    fn test_dropped_subscribers_pruned() {
        let mut publisher = StatusPublisher::new();
        let rx = publisher.subscribe();
        let _keep = publisher.subscribe();
        drop(rx);

        publisher.publish(AlignStatus::Centered);
        assert_eq!(publisher.num_subscribers(), 1);
    }
}
