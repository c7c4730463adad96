//! The visibility/heartbeat state machine: decides when to capture, how
//! many detection passes to run, and when the baseline refreshes.
//!
//! The controller is purely event-driven (visibility signals, timer
//! fires, config swaps), so tests drive it synchronously with a manual
//! clock while `run` drives it from an mpsc channel on a background
//! thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::baseline::BaselineStore;
use crate::capture::CaptureService;
use crate::config::Config;
use crate::diff;
use crate::logger;
use crate::notify::NotificationSink;
use crate::overlay::OverlayRenderer;
use crate::status::{DetectionEvent, MonitorStatus};
use crate::timer::{Clock, TimerKind, Timers};
use crate::types::{DiffResult, Screenshot, VisibilityState};

/// Heartbeats never fire faster than this, whatever the configured
/// interval says.
pub const HEARTBEAT_FLOOR_MS: u64 = 400;

/// Poll granularity of the driver loop when no timer is close.
const IDLE_POLL_MS: u64 = 100;

/// External signals driving the controller.
pub enum Event {
    Visibility(VisibilityState),
    Timer(TimerKind),
    ConfigChanged(Config),
    Shutdown,
}

/// One capture-and-diff cycle.
struct Pass {
    label: &'static str,
    result: DiffResult,
    shot: Option<Screenshot>,
}

/// Where the current detection sequence stands.
enum Sequence {
    /// Waiting out the post-reveal settle delay.
    Settling,
    /// Pass 1 came in under the warn threshold; waiting to confirm.
    AwaitSecondPass { pass1: Pass },
}

pub struct ScheduleController {
    cfg: Config,
    state: VisibilityState,
    baseline: BaselineStore,
    capture: Box<dyn CaptureService>,
    sink: Box<dyn NotificationSink>,
    overlay: OverlayRenderer,
    status: Arc<Mutex<MonitorStatus>>,
    clock: Arc<dyn Clock>,
    timers: Timers,
    sequence: Option<Sequence>,
}

impl ScheduleController {
    pub fn new(
        cfg: Config,
        initial: VisibilityState,
        capture: Box<dyn CaptureService>,
        sink: Box<dyn NotificationSink>,
        overlay: OverlayRenderer,
        status: Arc<Mutex<MonitorStatus>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut ctrl = Self {
            cfg: cfg.normalized(),
            state: initial,
            baseline: BaselineStore::new(),
            capture,
            sink,
            overlay,
            status,
            clock,
            timers: Timers::new(),
            sequence: None,
        };
        {
            let mut status = ctrl.status.lock().unwrap();
            status.installed = true;
            status.visibility = initial;
        }
        if initial == VisibilityState::Visible {
            ctrl.start_heartbeat();
        }
        ctrl
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Visibility(v) => self.on_visibility(v),
            Event::Timer(kind) => self.on_timer(kind),
            Event::ConfigChanged(cfg) => {
                self.cfg = cfg.normalized();
                logger::info_p("sched", "config updated");
            }
            Event::Shutdown => {}
        }
    }

    /// Fire and handle every due timer.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        for kind in self.timers.take_due(now) {
            self.on_timer(kind);
        }
    }

    /// Milliseconds until the next pending timer, if any.
    pub fn until_next_timer(&self) -> Option<u64> {
        self.timers.until_next(self.clock.now_ms())
    }

    fn on_visibility(&mut self, next: VisibilityState) {
        if next == self.state {
            return;
        }
        self.state = next;
        self.status.lock().unwrap().visibility = next;
        match next {
            VisibilityState::Hidden => {
                // Only the heartbeat stops; an in-flight detection
                // sequence keeps its timers and runs to completion, its
                // result superseded by whatever baseline exists then.
                self.stop_heartbeat();
            }
            VisibilityState::Visible => {
                if self.sequence.is_some() {
                    // Single-flight: one detection sequence at a time.
                    logger::debug_p("sched", "detection in flight, dropping reveal trigger");
                    return;
                }
                self.sequence = Some(Sequence::Settling);
                self.timers.arm(
                    TimerKind::Settle,
                    self.clock.now_ms(),
                    self.cfg.visible_capture_delay_ms,
                );
            }
        }
    }

    fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Settle => self.on_settle(),
            TimerKind::SecondPass => self.on_second_pass(),
            TimerKind::Heartbeat => self.on_heartbeat(),
            TimerKind::OverlayHide => {
                self.overlay.expire(self.clock.now_ms());
                self.status.lock().unwrap().overlay = self.overlay.current().cloned();
            }
        }
    }

    fn on_settle(&mut self) {
        if !matches!(self.sequence, Some(Sequence::Settling)) {
            return;
        }
        let pass1 = self.run_pass("pass1");
        if pass1.result.percent < self.cfg.warn_percent {
            self.timers.arm(
                TimerKind::SecondPass,
                self.clock.now_ms(),
                self.cfg.second_pass_delay_ms,
            );
            self.sequence = Some(Sequence::AwaitSecondPass { pass1 });
        } else {
            self.finish(pass1);
        }
    }

    fn on_second_pass(&mut self) {
        let pass1 = match self.sequence.take() {
            Some(Sequence::AwaitSecondPass { pass1 }) => pass1,
            other => {
                self.sequence = other;
                return;
            }
        };
        let pass2 = self.run_pass("pass2");
        // Never prefer the earlier, lower reading: a slow morph may not
        // have finished changing at pass-1 time.
        let chosen = if pass2.result.percent > pass1.result.percent {
            pass2
        } else {
            pass1
        };
        self.finish(chosen);
    }

    fn on_heartbeat(&mut self) {
        if self.state != VisibilityState::Visible {
            return;
        }
        match self.capture.capture() {
            Ok(shot) => self.replace_baseline(shot),
            Err(e) => logger::warn_p("capture", &format!("heartbeat: {}", e)),
        }
        self.timers.arm(
            TimerKind::Heartbeat,
            self.clock.now_ms(),
            self.heartbeat_interval(),
        );
    }

    fn heartbeat_interval(&self) -> u64 {
        self.cfg.baseline_interval_ms.max(HEARTBEAT_FLOOR_MS)
    }

    /// One capture-and-diff cycle against the current baseline. A missing
    /// baseline or a failed capture degrades to an empty result.
    fn run_pass(&mut self, label: &'static str) -> Pass {
        if self.baseline.get().is_none() {
            logger::debug_p("diff", &format!("{}: no baseline yet", label));
            return Pass { label, result: DiffResult::default(), shot: None };
        }
        let shot = match self.capture.capture() {
            Ok(shot) => shot,
            Err(e) => {
                logger::warn_p("capture", &format!("{}: {}", label, e));
                return Pass { label, result: DiffResult::default(), shot: None };
            }
        };
        let result = match self.baseline.get() {
            Some(base) => {
                let normalized = shot.resample(base.width, base.height);
                diff::diff(base, &normalized, &self.cfg)
            }
            None => DiffResult::default(),
        };
        logger::info_p(
            "diff",
            &format!(
                "{}: {:.1}% ({} tiles)",
                label,
                result.percent,
                result.changed_tiles.len()
            ),
        );
        Pass { label, result, shot: Some(shot) }
    }

    fn finish(&mut self, pass: Pass) {
        self.sequence = None;
        let now = self.clock.now_ms();

        if let Some((bw, bh)) = self.baseline.dims() {
            self.overlay.render(
                bw,
                bh,
                &pass.result.changed_tiles,
                self.cfg.tile_size,
                self.cfg.overlay_auto_hide_ms,
                now,
            );
            if self
                .overlay
                .current()
                .is_some_and(|o| o.expires_at_ms.is_some())
            {
                self.timers
                    .arm(TimerKind::OverlayHide, now, self.cfg.overlay_auto_hide_ms);
            }
        }

        self.sink.notify(pass.result.percent);
        logger::info_p(
            "sched",
            &format!("detection complete: {:.1}% via {}", pass.result.percent, pass.label),
        );

        {
            let mut status = self.status.lock().unwrap();
            status.overlay = self.overlay.current().cloned();
            status.grid = self.grid_dims();
            status.changed = pass.result.changed_tiles.clone();
            status.push_detection(DetectionEvent {
                percent: pass.result.percent,
                changed_tiles: pass.result.changed_tiles.len(),
                pass: pass.label,
                at_ms: now,
            });
        }

        #[cfg(feature = "debug-dump")]
        if let Some(shot) = &pass.shot {
            crate::dump::dump_png(
                shot,
                &std::env::temp_dir().join(format!("tabnab-{}-{}.png", pass.label, now)),
            );
        }

        if let Some(shot) = pass.shot {
            self.replace_baseline(shot);
        }

        if self.state == VisibilityState::Visible {
            self.start_heartbeat();
        }
    }

    fn grid_dims(&self) -> (u32, u32) {
        match self.baseline.dims() {
            Some((w, h)) => (w.div_ceil(self.cfg.tile_size), h.div_ceil(self.cfg.tile_size)),
            None => (0, 0),
        }
    }

    fn replace_baseline(&mut self, shot: Screenshot) {
        self.status.lock().unwrap().baseline_at_ms = Some(shot.captured_at_ms);
        self.baseline.replace(shot);
    }

    fn start_heartbeat(&mut self) {
        if self.timers.is_armed(TimerKind::Heartbeat) {
            return;
        }
        logger::info_p("sched", "heartbeat start");
        // Seed immediately so the baseline exists before the first tick.
        match self.capture.capture() {
            Ok(shot) => self.replace_baseline(shot),
            Err(e) => logger::warn_p("capture", &format!("heartbeat seed: {}", e)),
        }
        self.timers.arm(
            TimerKind::Heartbeat,
            self.clock.now_ms(),
            self.heartbeat_interval(),
        );
        self.status.lock().unwrap().heartbeat_active = true;
    }

    fn stop_heartbeat(&mut self) {
        if self.timers.cancel(TimerKind::Heartbeat) {
            logger::info_p("sched", "heartbeat stop");
        }
        self.status.lock().unwrap().heartbeat_active = false;
    }
}

/// Drive a controller from an event channel on the current thread, firing
/// due timers between polls. Returns on `Shutdown` or when every sender
/// hangs up.
pub fn run(mut ctrl: ScheduleController, events: mpsc::Receiver<Event>) {
    loop {
        ctrl.tick();
        let wait = ctrl.until_next_timer().unwrap_or(IDLE_POLL_MS).clamp(1, IDLE_POLL_MS);
        match events.recv_timeout(Duration::from_millis(wait)) {
            Ok(Event::Shutdown) => {
                logger::info_p("sched", "shutting down");
                return;
            }
            Ok(event) => ctrl.handle(event),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureError;
    use crate::testutil::{paint, solid};
    use crate::timer::ManualClock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const GRAY: (u8, u8, u8) = (200, 200, 200);

    struct PageCapture {
        page: Arc<Mutex<Screenshot>>,
        fail: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
        clock: Arc<ManualClock>,
    }

    impl CaptureService for PageCapture {
        fn capture(&mut self) -> Result<Screenshot, CaptureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(CaptureError::new("scripted failure"));
            }
            let mut shot = self.page.lock().unwrap().clone();
            shot.captured_at_ms = self.clock.now_ms();
            Ok(shot)
        }
    }

    struct RecordingSink(Arc<Mutex<Vec<f64>>>);

    impl NotificationSink for RecordingSink {
        fn notify(&mut self, percent: f64) {
            self.0.lock().unwrap().push(percent);
        }
    }

    struct Harness {
        ctrl: ScheduleController,
        clock: Arc<ManualClock>,
        page: Arc<Mutex<Screenshot>>,
        fail: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
        notified: Arc<Mutex<Vec<f64>>>,
        status: Arc<Mutex<MonitorStatus>>,
    }

    impl Harness {
        /// 100x100 page with tileSize 10 -> 100 tiles, so a changed tile
        /// count reads directly as a percent.
        fn new(cfg: Config, initial: VisibilityState) -> Self {
            let clock = Arc::new(ManualClock::new());
            let page = Arc::new(Mutex::new(solid(100, 100, GRAY)));
            let fail = Arc::new(AtomicBool::new(false));
            let calls = Arc::new(AtomicUsize::new(0));
            let notified = Arc::new(Mutex::new(Vec::new()));
            let status = Arc::new(Mutex::new(MonitorStatus::new(initial)));
            let capture = PageCapture {
                page: Arc::clone(&page),
                fail: Arc::clone(&fail),
                calls: Arc::clone(&calls),
                clock: Arc::clone(&clock),
            };
            let ctrl = ScheduleController::new(
                cfg,
                initial,
                Box::new(capture),
                Box::new(RecordingSink(Arc::clone(&notified))),
                OverlayRenderer::new(100, 100),
                Arc::clone(&status),
                Arc::clone(&clock) as Arc<dyn Clock>,
            );
            Self { ctrl, clock, page, fail, calls, notified, status }
        }

        /// Advance in 50 ms steps, firing timers the way the driver loop
        /// would.
        fn advance(&mut self, ms: u64) {
            let mut remaining = ms;
            while remaining > 0 {
                let step = remaining.min(50);
                self.clock.advance(step);
                self.ctrl.tick();
                remaining -= step;
            }
        }

        /// Blacken the first `tiles` tiles in row-major order.
        fn morph_tiles(&self, tiles: u32) {
            *self.page.lock().unwrap() = paint(100, 100, move |x, y| {
                if (y / 10) * 10 + x / 10 < tiles {
                    (0, 0, 0)
                } else {
                    GRAY
                }
            });
        }

        fn restore_page(&self) {
            *self.page.lock().unwrap() = solid(100, 100, GRAY);
        }

        fn captures(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn notifications(&self) -> Vec<f64> {
            self.notified.lock().unwrap().clone()
        }
    }

    #[test]
    fn startup_visible_seeds_baseline_and_sets_installed() {
        let h = Harness::new(Config::default(), VisibilityState::Visible);
        assert_eq!(h.captures(), 1);
        let status = h.status.lock().unwrap();
        assert!(status.installed);
        assert!(status.heartbeat_active);
        assert!(status.baseline_at_ms.is_some());
    }

    #[test]
    fn startup_hidden_never_captures() {
        let mut h = Harness::new(Config::default(), VisibilityState::Hidden);
        h.advance(10_000);
        assert_eq!(h.captures(), 0);
        assert!(!h.status.lock().unwrap().heartbeat_active);
    }

    #[test]
    fn heartbeat_fires_at_interval_and_stops_on_hidden() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        assert_eq!(h.captures(), 1); // seed
        h.advance(3000); // default interval 1000 ms
        assert_eq!(h.captures(), 4);

        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        let before = h.captures();
        h.advance(5000);
        assert_eq!(h.captures(), before, "no captures after hidden");
        assert!(!h.status.lock().unwrap().heartbeat_active);
    }

    #[test]
    fn heartbeat_interval_has_a_floor() {
        let cfg = Config { baseline_interval_ms: 100, ..Config::default() };
        let mut h = Harness::new(cfg, VisibilityState::Visible);
        assert_eq!(h.captures(), 1);
        h.advance(1200); // floored to 400 ms -> 3 ticks
        assert_eq!(h.captures(), 4);
    }

    #[test]
    fn reveal_with_big_change_reports_on_first_pass() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5); // 5%, above warn=2
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500); // settle delay
        assert_eq!(h.notifications(), vec![5.0]);
        let status = h.status.lock().unwrap();
        assert!(status.detected);
        assert_eq!(status.last.as_ref().map(|e| e.pass), Some("pass1"));
        assert_eq!(status.changed.len(), 5);
    }

    #[test]
    fn second_pass_escalates_a_slow_morph() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500); // pass1: page unchanged -> 0% < warn
        assert!(h.notifications().is_empty(), "second pass still pending");
        h.morph_tiles(25); // the morph lands between the passes
        h.advance(800); // pass2
        assert_eq!(h.notifications(), vec![25.0]);
        assert_eq!(
            h.status.lock().unwrap().last.as_ref().map(|e| e.pass),
            Some("pass2")
        );
    }

    #[test]
    fn lower_second_pass_keeps_the_first_reading() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(1); // 1%, below warn
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500); // pass1: 1%
        h.restore_page(); // pass2 will read 0%
        h.advance(800);
        assert_eq!(h.notifications(), vec![1.0]);
        assert_eq!(
            h.status.lock().unwrap().last.as_ref().map(|e| e.pass),
            Some("pass1")
        );
    }

    #[test]
    fn baseline_becomes_the_chosen_pass_capture() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        assert_eq!(h.notifications(), vec![5.0]);

        // The morphed page is now the baseline: a second hide/show cycle
        // with no further change stays quiet.
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500 + 800 + 100);
        let notes = h.notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1], 0.0);
    }

    #[test]
    fn capture_failure_degrades_the_pass_and_keeps_going() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(20);
        h.fail.store(true, Ordering::SeqCst);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500 + 800 + 100); // both passes fail
        assert_eq!(h.notifications(), vec![0.0]);

        // The schedule is still alive: captures resume and the next cycle
        // detects against the untouched baseline.
        h.fail.store(false, Ordering::SeqCst);
        h.advance(1000); // heartbeat replaces baseline with morphed page
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.restore_page();
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        let notes = h.notifications();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1], 20.0);
    }

    #[test]
    fn no_baseline_first_reveal_reports_zero_then_seeds() {
        let mut h = Harness::new(Config::default(), VisibilityState::Hidden);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500 + 800 + 100);
        // Degraded passes never captured; the heartbeat seed did.
        assert_eq!(h.notifications(), vec![0.0]);
        assert_eq!(h.captures(), 1);
        assert!(h.status.lock().unwrap().baseline_at_ms.is_some());
    }

    #[test]
    fn reveal_trigger_during_pending_sequence_is_dropped() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(100); // still settling
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500 + 800 + 100);
        // one sequence, one report
        assert_eq!(h.notifications().len(), 1);
    }

    #[test]
    fn duplicate_visible_signal_is_ignored() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(2000);
        assert!(h.notifications().is_empty());
    }

    #[test]
    fn sequence_finishing_after_hidden_skips_heartbeat_restart() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500); // pass1 done, second pass pending
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.advance(800); // in-flight pass2 completes
        assert_eq!(h.notifications().len(), 1);
        assert!(!h.status.lock().unwrap().heartbeat_active);
        let before = h.captures();
        h.advance(5000);
        assert_eq!(h.captures(), before, "heartbeat must not restart while hidden");
    }

    #[test]
    fn overlay_follows_detection_and_auto_hides() {
        let cfg = Config { overlay_auto_hide_ms: 2000, ..Config::default() };
        let mut h = Harness::new(cfg, VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        {
            let status = h.status.lock().unwrap();
            let overlay = status.overlay.as_ref().expect("overlay after detection");
            assert_eq!(overlay.blocks.len(), 5);
        }
        h.advance(2000);
        assert!(h.status.lock().unwrap().overlay.is_none());
    }

    #[test]
    fn overlay_persists_when_auto_hide_is_zero() {
        let cfg = Config { overlay_auto_hide_ms: 0, ..Config::default() };
        let mut h = Harness::new(cfg, VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        h.advance(60_000);
        assert!(h.status.lock().unwrap().overlay.is_some());
    }

    #[test]
    fn quiet_reveal_clears_a_previous_overlay() {
        let cfg = Config { overlay_auto_hide_ms: 0, ..Config::default() };
        let mut h = Harness::new(cfg, VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        assert!(h.status.lock().unwrap().overlay.is_some());

        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500 + 800 + 100); // nothing changed -> empty result
        assert!(h.status.lock().unwrap().overlay.is_none());
    }

    #[test]
    fn config_swap_applies_without_restart() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::ConfigChanged(Config {
            warn_percent: 0.0,
            ..Config::default()
        }));
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        // warn=0 means pass1 (0%) is never below warn: no second pass
        assert_eq!(h.notifications(), vec![0.0]);
        assert_eq!(
            h.status.lock().unwrap().last.as_ref().map(|e| e.pass),
            Some("pass1")
        );
    }

    #[test]
    fn stray_timer_events_are_harmless() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Timer(TimerKind::SecondPass));
        h.ctrl.handle(Event::Timer(TimerKind::OverlayHide));
        assert!(h.notifications().is_empty());

        // A stray second-pass fire must not cancel a settling sequence.
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(5);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.ctrl.handle(Event::Timer(TimerKind::SecondPass));
        h.advance(500);
        assert_eq!(h.notifications(), vec![5.0]);
    }

    #[test]
    fn detection_event_carries_percent_and_time() {
        let mut h = Harness::new(Config::default(), VisibilityState::Visible);
        h.ctrl.handle(Event::Visibility(VisibilityState::Hidden));
        h.morph_tiles(12);
        h.ctrl.handle(Event::Visibility(VisibilityState::Visible));
        h.advance(500);
        let status = h.status.lock().unwrap();
        let last = status.last.as_ref().unwrap();
        assert_eq!(last.percent, 12.0);
        assert_eq!(last.changed_tiles, 12);
        assert_eq!(last.at_ms, h.clock.now_ms());
        assert_eq!(status.history.len(), 1);
    }
}
