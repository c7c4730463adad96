use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use tabnab_core::capture::RetryOnce;
use tabnab_core::config::Config;
use tabnab_core::logger;
use tabnab_core::notify::StatusSink;
use tabnab_core::overlay::OverlayRenderer;
use tabnab_core::schedule::{self, Event, ScheduleController};
use tabnab_core::status::MonitorStatus;
use tabnab_core::timer::{Clock, SystemClock};
use tabnab_core::types::VisibilityState;

mod sim;
use sim::{SimCapture, SimWorkbench, SyntheticPage, PAGE_H, PAGE_W};

fn main() -> Result<()> {
    let debug = std::env::args().any(|a| a == "--debug");
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Init logger
    logger::init(&cwd.join("logs"));
    logger::set_debug(debug);
    logger::register_prefix("sched", logger::COLOR_BLUE);
    logger::register_prefix("diff", logger::COLOR_CYAN);
    logger::register_prefix("capture", logger::COLOR_GRAY);
    logger::register_prefix("sim", logger::COLOR_GRAY);

    // Load options, then write them back so the file carries every key.
    let config_path = cwd.join("tabnab.json");
    let cfg = Config::load(&config_path);
    cfg.save(&config_path);
    let live_cfg = Arc::new(Mutex::new(cfg.clone()));

    // Shared state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let page = Arc::new(Mutex::new(SyntheticPage::new()));
    let fail = Arc::new(AtomicBool::new(false));
    let status = Arc::new(Mutex::new(MonitorStatus::new(VisibilityState::Visible)));

    // Channels
    let (log_tx, log_rx) = mpsc::channel::<String>();
    let (event_tx, event_rx) = mpsc::channel::<Event>();

    // Wire logger to TUI
    logger::set_tui_sender(log_tx);
    logger::info("tabnab monitor started");

    // Controller with its collaborators, driven on a background thread
    let capture = RetryOnce::new(SimCapture::new(
        Arc::clone(&page),
        Arc::clone(&fail),
        Arc::clone(&clock),
    ));
    let sink = StatusSink::new(Arc::clone(&status), Arc::clone(&live_cfg));
    let controller = ScheduleController::new(
        cfg,
        VisibilityState::Visible,
        Box::new(capture),
        Box::new(sink),
        OverlayRenderer::new(PAGE_W, PAGE_H),
        Arc::clone(&status),
        Arc::clone(&clock),
    );
    thread::spawn(move || schedule::run(controller, event_rx));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create TUI app
    let workbench = SimWorkbench::new(Arc::clone(&page), Arc::clone(&fail));
    let mut app = tabnab_tui::App::new(
        status,
        Box::new(workbench),
        event_tx,
        log_rx,
        live_cfg,
        config_path,
    );

    // Run TUI event loop on the main thread
    let result = tabnab_tui::event::run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}
