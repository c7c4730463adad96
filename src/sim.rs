//! Synthetic page behind the capture boundary: deterministic painted
//! content that can morph into an attack rendition, tick a small widget,
//! carry sub-threshold sensor noise, or fail capture on demand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rand::Rng;

use tabnab_core::capture::{CaptureError, CaptureService};
use tabnab_core::logger;
use tabnab_core::timer::Clock;
use tabnab_core::types::Screenshot;
use tabnab_tui::Workbench;

pub const PAGE_W: u32 = 480;
pub const PAGE_H: u32 = 320;

const BG: (u8, u8, u8) = (246, 246, 242);
const HEADER: (u8, u8, u8) = (38, 70, 120);
const TEXT: (u8, u8, u8) = (70, 70, 74);
const ATTACK_BG: (u8, u8, u8) = (252, 240, 210);
const ATTACK_PANEL: (u8, u8, u8) = (180, 40, 40);

pub struct SyntheticPage {
    morphed: bool,
    ticks: u32,
    noise: bool,
}

impl SyntheticPage {
    pub fn new() -> Self {
        Self { morphed: false, ticks: 0, noise: false }
    }

    pub fn morph(&mut self) {
        self.morphed = true;
    }

    pub fn restore(&mut self) {
        self.morphed = false;
        self.ticks = 0;
    }

    pub fn benign_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
    }

    pub fn set_noise(&mut self, on: bool) {
        self.noise = on;
    }

    /// Paint the page into an RGBA screenshot.
    pub fn render(&self, captured_at_ms: u64) -> Screenshot {
        let mut px = vec![0u8; (PAGE_W * PAGE_H * 4) as usize];
        fill(&mut px, 0, 0, PAGE_W, PAGE_H, BG);
        fill(&mut px, 0, 0, PAGE_W, 40, HEADER);

        // body "text" lines
        for row in 0..9 {
            let width = 360 + (row % 3) * 40;
            fill(&mut px, 24, 64 + row * 26, width, 10, TEXT);
        }

        // small live widget in the header corner; color tracks the ticks
        let tick_color = (
            60,
            (120 + (self.ticks * 37) % 120) as u8,
            (80 + (self.ticks * 61) % 150) as u8,
        );
        fill(&mut px, PAGE_W - 28, 8, 20, 20, tick_color);

        if self.morphed {
            // the tabnabbing rewrite: new palette, fake login panel
            fill(&mut px, 0, 40, PAGE_W, PAGE_H - 40, ATTACK_BG);
            fill(&mut px, 80, 90, PAGE_W - 160, 150, ATTACK_PANEL);
            fill(&mut px, 110, 130, PAGE_W - 220, 18, BG);
            fill(&mut px, 110, 170, PAGE_W - 220, 18, BG);
        }

        if self.noise {
            // +/-2 per channel, safely below the default pixel threshold
            let mut rng = rand::thread_rng();
            for chunk in px.chunks_exact_mut(4) {
                for channel in chunk.iter_mut().take(3) {
                    let wiggle: i16 = rng.gen_range(-2..=2);
                    *channel = (*channel as i16 + wiggle).clamp(0, 255) as u8;
                }
            }
        }

        Screenshot::new(px, PAGE_W, PAGE_H, captured_at_ms)
    }
}

fn fill(px: &mut [u8], x0: u32, y0: u32, w: u32, h: u32, (r, g, b): (u8, u8, u8)) {
    for y in y0..(y0 + h).min(PAGE_H) {
        for x in x0..(x0 + w).min(PAGE_W) {
            let i = ((y * PAGE_W + x) * 4) as usize;
            px[i] = r;
            px[i + 1] = g;
            px[i + 2] = b;
            px[i + 3] = 255;
        }
    }
}

/// Capture service over the synthetic page.
pub struct SimCapture {
    page: Arc<Mutex<SyntheticPage>>,
    fail: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl SimCapture {
    pub fn new(page: Arc<Mutex<SyntheticPage>>, fail: Arc<AtomicBool>, clock: Arc<dyn Clock>) -> Self {
        Self { page, fail, clock }
    }
}

impl CaptureService for SimCapture {
    fn capture(&mut self) -> Result<Screenshot, CaptureError> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(CaptureError::new("simulated capture outage"));
        }
        Ok(self.page.lock().unwrap().render(self.clock.now_ms()))
    }
}

/// TUI-side handle that mutates the page and the failure switch.
pub struct SimWorkbench {
    page: Arc<Mutex<SyntheticPage>>,
    fail: Arc<AtomicBool>,
    noise: bool,
}

impl SimWorkbench {
    pub fn new(page: Arc<Mutex<SyntheticPage>>, fail: Arc<AtomicBool>) -> Self {
        Self { page, fail, noise: false }
    }
}

impl Workbench for SimWorkbench {
    fn morph(&mut self) {
        self.page.lock().unwrap().morph();
        logger::info_p("sim", "page morphed");
    }

    fn benign_update(&mut self) {
        self.page.lock().unwrap().benign_tick();
        logger::info_p("sim", "widget ticked");
    }

    fn toggle_noise(&mut self) -> bool {
        self.noise = !self.noise;
        self.page.lock().unwrap().set_noise(self.noise);
        logger::info_p("sim", if self.noise { "noise on" } else { "noise off" });
        self.noise
    }

    fn toggle_failures(&mut self) -> bool {
        let next = !self.fail.load(Ordering::Relaxed);
        self.fail.store(next, Ordering::Relaxed);
        logger::info_p("sim", if next { "captures failing" } else { "captures healthy" });
        next
    }

    fn restore(&mut self) {
        self.page.lock().unwrap().restore();
        logger::info_p("sim", "page restored");
    }
}
