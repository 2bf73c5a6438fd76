//! Sliding window smoothing of the alignment errors

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A FIFO of at most `capacity` samples.
///
/// Pushing onto a full window evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

/// Smoothing windows for each of the alignment errors.
#[derive(Debug, Clone)]
pub struct SmoothedErrors {
    forward_m: SlidingWindow,
    lateral_m: SlidingWindow,
    rotation_deg: SlidingWindow,
}

/// Current means of the smoothing windows.
#[derive(Debug, Copy, Clone, Serialize, PartialEq)]
pub struct Smoothed {
    /// Forward distance from the camera to the target
    pub forward_m: f64,

    /// Lateral offset of the target from the camera, without the camera offset
    pub lateral_m: f64,

    /// Rotation error
    pub rotation_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SlidingWindow {
    /// Create a new empty window, a capacity of zero is rejected.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }

        Some(Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Mean of the samples, `None` if there are no samples.
    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl SmoothedErrors {
    pub fn new(window_len: usize) -> Option<Self> {
        Some(Self {
            forward_m: SlidingWindow::new(window_len)?,
            lateral_m: SlidingWindow::new(window_len)?,
            rotation_deg: SlidingWindow::new(window_len)?,
        })
    }

    /// Add one cycle's observation to all windows.
    pub fn push(&mut self, forward_m: f64, lateral_m: f64, rotation_deg: f64) {
        self.forward_m.push(forward_m);
        self.lateral_m.push(lateral_m);
        self.rotation_deg.push(rotation_deg);
    }

    /// The smoothed errors, or `None` before the first observation.
    pub fn smoothed(&self) -> Option<Smoothed> {
        Some(Smoothed {
            forward_m: self.forward_m.mean()?,
            lateral_m: self.lateral_m.mean()?,
            rotation_deg: self.rotation_deg.mean()?,
        })
    }

    pub fn len(&self) -> usize {
        self.forward_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward_m.is_empty()
    }

    pub fn clear(&mut self) {
        self.forward_m.clear();
        self.lateral_m.clear();
        self.rotation_deg.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(SlidingWindow::new(0).is_none());
        assert!(SmoothedErrors::new(0).is_none());
    }

    #[test]
    fn test_fifo_eviction() {
        let mut w = SlidingWindow::new(3).unwrap();
        assert_eq!(w.mean(), None);

        for s in &[1.0, 2.0, 3.0] {
            w.push(*s);
        }
        assert_eq!(w.mean(), Some(2.0));

        // 1.0 is evicted
        w.push(7.0);
        assert_eq!(w.len(), 3);
        assert_eq!(w.mean(), Some(4.0));

        for i in 0..100 {
            w.push(i as f64);
            assert!(w.len() <= w.capacity());
        }
        assert_eq!(w.mean(), Some(98.0));

        w.clear();
        assert!(w.is_empty());
    }

    #[test]
    fn test_smoothed_errors() {
        let mut s = SmoothedErrors::new(2).unwrap();
        assert!(s.smoothed().is_none());

        s.push(1.0, 0.2, 4.0);
        s.push(2.0, 0.4, 2.0);
        s.push(3.0, 0.6, 0.0);

        let m = s.smoothed().unwrap();
        assert_eq!(m.forward_m, 2.5);
        assert!((m.lateral_m - 0.5).abs() < 1e-12);
        assert_eq!(m.rotation_deg, 1.0);
        assert_eq!(s.len(), 2);

        s.clear();
        assert!(s.is_empty());
        assert!(s.smoothed().is_none());
    }
}
