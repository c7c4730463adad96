use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};

use tabnab_core::config::Config;
use tabnab_core::logger;
use tabnab_core::schedule::Event;
use tabnab_core::status::MonitorStatus;
use tabnab_core::types::VisibilityState;

use crate::confirm::ConfirmDialog;

/// Simulation commands the TUI runs against the hosted page. The binary
/// wires its synthetic page behind this so the TUI stays ignorant of it.
pub trait Workbench: Send {
    /// Rewrite most of the page, the tabnabbing move.
    fn morph(&mut self);
    /// Benign single-widget update.
    fn benign_update(&mut self);
    /// Toggle sub-threshold sensor noise. Returns the new state.
    fn toggle_noise(&mut self) -> bool;
    /// Toggle capture failures. Returns the new state.
    fn toggle_failures(&mut self) -> bool;
    /// Restore the pristine page content.
    fn restore(&mut self);
}

pub struct App {
    pub status: Arc<Mutex<MonitorStatus>>,
    pub workbench: Box<dyn Workbench>,
    pub events_tx: mpsc::Sender<Event>,
    pub log_rx: mpsc::Receiver<String>,
    pub log_messages: Vec<String>,
    pub log_visible: bool,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub noise_on: bool,
    pub failures_on: bool,
    pub confirm: Option<ConfirmDialog>,
    pub should_quit: bool,
    cfg: Arc<Mutex<Config>>,
    config_path: PathBuf,
}

impl App {
    pub fn new(
        status: Arc<Mutex<MonitorStatus>>,
        workbench: Box<dyn Workbench>,
        events_tx: mpsc::Sender<Event>,
        log_rx: mpsc::Receiver<String>,
        cfg: Arc<Mutex<Config>>,
        config_path: PathBuf,
    ) -> Self {
        Self {
            status,
            workbench,
            events_tx,
            log_rx,
            log_messages: Vec::new(),
            log_visible: true,
            log_scroll: 0,
            noise_on: false,
            failures_on: false,
            confirm: None,
            should_quit: false,
            cfg,
            config_path,
        }
    }

    pub fn drain_logs(&mut self) {
        while let Ok(msg) = self.log_rx.try_recv() {
            self.log_messages.push(msg);
        }
    }

    /// Flip the simulated page between hidden and visible.
    pub fn toggle_visibility(&mut self) {
        let next = match self.status.lock().unwrap().visibility {
            VisibilityState::Visible => VisibilityState::Hidden,
            VisibilityState::Hidden => VisibilityState::Visible,
        };
        self.events_tx.send(Event::Visibility(next)).ok();
    }

    pub fn morph_page(&mut self) {
        self.workbench.morph();
    }

    pub fn benign_update(&mut self) {
        self.workbench.benign_update();
    }

    pub fn restore_page(&mut self) {
        self.workbench.restore();
    }

    pub fn toggle_noise(&mut self) {
        self.noise_on = self.workbench.toggle_noise();
    }

    pub fn toggle_failures(&mut self) {
        self.failures_on = self.workbench.toggle_failures();
    }

    /// Re-read the options file and push the result to the controller.
    pub fn reload_config(&mut self) {
        match Config::reload(&self.config_path) {
            Ok(cfg) => {
                *self.cfg.lock().unwrap() = cfg.clone();
                self.events_tx.send(Event::ConfigChanged(cfg)).ok();
            }
            Err(e) => logger::error(&format!("config reload: {:#}", e)),
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    pub fn request_quit(&mut self) {
        self.confirm = Some(ConfirmDialog::new("Quit the monitor?"));
    }

    pub fn quit(&mut self) {
        self.events_tx.send(Event::Shutdown).ok();
        self.should_quit = true;
    }
}
