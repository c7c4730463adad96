//! Severity mapping and the notification collaborator the controller
//! reports each completed detection to.

use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::logger;
use crate::status::MonitorStatus;

/// Three-way severity derived from the aggregate percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    None,
    Warn,
    Alert,
}

/// The integer percent the badge shows: rounded, clamped to 0..=100.
pub fn badge_percent(percent: f64) -> u32 {
    percent.round().clamp(0.0, 100.0) as u32
}

/// Tier mapping with inclusive lower bounds: `p >= alert` alerts,
/// `p >= warn` warns, anything below is quiet.
pub fn classify(percent: f64, cfg: &Config) -> Severity {
    let p = badge_percent(percent) as f64;
    if p >= cfg.alert_percent {
        Severity::Alert
    } else if p >= cfg.warn_percent {
        Severity::Warn
    } else {
        Severity::None
    }
}

/// Badge label: `"<p>%"` when non-none, empty otherwise.
pub fn badge_label(percent: f64, cfg: &Config) -> String {
    match classify(percent, cfg) {
        Severity::None => String::new(),
        _ => format!("{}%", badge_percent(percent)),
    }
}

pub fn badge_title(percent: f64, cfg: &Config) -> String {
    match classify(percent, cfg) {
        Severity::None => "No significant change detected".to_string(),
        _ => format!("Tab changed by ~{}% since last focus", badge_percent(percent)),
    }
}

/// Consumes the chosen pass's percent after each detection sequence.
/// Overwrite-only: a call replaces whatever the previous call surfaced.
pub trait NotificationSink: Send {
    fn notify(&mut self, percent: f64);
}

/// Reference sink: overwrites the shared badge state, reading thresholds
/// from the live config on every call so hot reloads apply immediately.
pub struct StatusSink {
    status: Arc<Mutex<MonitorStatus>>,
    cfg: Arc<Mutex<Config>>,
}

impl StatusSink {
    pub fn new(status: Arc<Mutex<MonitorStatus>>, cfg: Arc<Mutex<Config>>) -> Self {
        Self { status, cfg }
    }
}

impl NotificationSink for StatusSink {
    fn notify(&mut self, percent: f64) {
        let cfg = self.cfg.lock().unwrap().clone();
        let severity = classify(percent, &cfg);
        let label = badge_label(percent, &cfg);
        logger::info_p(
            "sched",
            &format!(
                "badge {:?}{}",
                severity,
                if label.is_empty() { String::new() } else { format!(" {}", label) }
            ),
        );
        let mut status = self.status.lock().unwrap();
        status.severity = severity;
        status.badge = label;
        status.title = badge_title(percent, &cfg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisibilityState;

    #[test]
    fn tier_boundaries_are_inclusive() {
        let cfg = Config::default(); // warn 2, alert 10
        assert_eq!(classify(1.0, &cfg), Severity::None);
        assert_eq!(classify(2.0, &cfg), Severity::Warn);
        assert_eq!(classify(5.0, &cfg), Severity::Warn);
        assert_eq!(classify(10.0, &cfg), Severity::Alert);
        assert_eq!(classify(15.0, &cfg), Severity::Alert);
    }

    #[test]
    fn percent_is_rounded_before_comparison() {
        let cfg = Config::default();
        assert_eq!(classify(1.6, &cfg), Severity::Warn); // rounds to 2
        assert_eq!(classify(1.4, &cfg), Severity::None);
        assert_eq!(classify(9.5, &cfg), Severity::Alert); // rounds to 10
    }

    #[test]
    fn badge_label_only_for_non_none() {
        let cfg = Config::default();
        assert_eq!(badge_label(0.4, &cfg), "");
        assert_eq!(badge_label(3.2, &cfg), "3%");
        assert_eq!(badge_label(250.0, &cfg), "100%");
    }

    #[test]
    fn titles_match_tiers() {
        let cfg = Config::default();
        assert_eq!(badge_title(0.0, &cfg), "No significant change detected");
        assert_eq!(badge_title(12.0, &cfg), "Tab changed by ~12% since last focus");
    }

    #[test]
    fn status_sink_overwrites() {
        let status = Arc::new(Mutex::new(MonitorStatus::new(VisibilityState::Visible)));
        let cfg = Arc::new(Mutex::new(Config::default()));
        let mut sink = StatusSink::new(Arc::clone(&status), cfg);
        sink.notify(20.0);
        assert_eq!(status.lock().unwrap().severity, Severity::Alert);
        assert_eq!(status.lock().unwrap().badge, "20%");
        sink.notify(0.0);
        assert_eq!(status.lock().unwrap().severity, Severity::None);
        assert_eq!(status.lock().unwrap().badge, "");
    }
}
