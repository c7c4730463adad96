//! Shared view of the monitor for the front-end, including the diagnostic
//! markers verification hooks read.

use std::collections::BTreeSet;

use crate::notify::Severity;
use crate::overlay::Overlay;
use crate::types::{TileCoord, VisibilityState};

/// Completed detections kept for the history panel.
pub const HISTORY_CAP: usize = 50;

/// One completed detection sequence.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    pub percent: f64,
    pub changed_tiles: usize,
    /// Which pass the reported result came from.
    pub pass: &'static str,
    pub at_ms: u64,
}

/// Everything the front-end renders. Written by the controller and the
/// notification sink, read under the shared lock.
pub struct MonitorStatus {
    /// Set once when the controller is constructed.
    pub installed: bool,
    /// Set after every completed detection sequence.
    pub detected: bool,
    pub visibility: VisibilityState,
    pub heartbeat_active: bool,
    pub baseline_at_ms: Option<u64>,
    pub severity: Severity,
    /// Badge label, empty when severity is none.
    pub badge: String,
    pub title: String,
    pub overlay: Option<Overlay>,
    /// Tile grid of the last diff, for the map widget.
    pub grid: (u32, u32),
    pub changed: BTreeSet<TileCoord>,
    pub last: Option<DetectionEvent>,
    pub history: Vec<DetectionEvent>,
}

impl MonitorStatus {
    pub fn new(visibility: VisibilityState) -> Self {
        Self {
            installed: false,
            detected: false,
            visibility,
            heartbeat_active: false,
            baseline_at_ms: None,
            severity: Severity::None,
            badge: String::new(),
            title: String::new(),
            overlay: None,
            grid: (0, 0),
            changed: BTreeSet::new(),
            last: None,
            history: Vec::new(),
        }
    }

    pub fn push_detection(&mut self, event: DetectionEvent) {
        self.detected = true;
        self.last = Some(event.clone());
        self.history.push(event);
        if self.history.len() > HISTORY_CAP {
            self.history.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_detection_sets_marker_and_caps_history() {
        let mut status = MonitorStatus::new(VisibilityState::Hidden);
        assert!(!status.detected);
        for i in 0..(HISTORY_CAP + 10) {
            status.push_detection(DetectionEvent {
                percent: i as f64,
                changed_tiles: i,
                pass: "pass1",
                at_ms: i as u64,
            });
        }
        assert!(status.detected);
        assert_eq!(status.history.len(), HISTORY_CAP);
        // oldest entries were dropped
        assert_eq!(status.history[0].changed_tiles, 10);
        assert_eq!(status.last.as_ref().map(|e| e.changed_tiles), Some(HISTORY_CAP + 9));
    }
}
