//! Projects changed tiles onto viewport coordinates for visualization.

use std::collections::BTreeSet;

use rand::Rng;

use crate::types::TileCoord;

/// One highlight block in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayBlock {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// A live overlay instance.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub id: String,
    pub blocks: Vec<OverlayBlock>,
    /// Absolute expiry; `None` means the overlay persists until replaced.
    pub expires_at_ms: Option<u64>,
}

/// Owns at most one overlay at a time; rendering again replaces it.
pub struct OverlayRenderer {
    viewport_w: u32,
    viewport_h: u32,
    current: Option<Overlay>,
}

impl OverlayRenderer {
    pub fn new(viewport_w: u32, viewport_h: u32) -> Self {
        Self { viewport_w, viewport_h, current: None }
    }

    pub fn set_viewport(&mut self, w: u32, h: u32) {
        self.viewport_w = w;
        self.viewport_h = h;
    }

    /// Replace any prior overlay with highlight blocks for `tiles`. An
    /// empty set clears without creating a new instance.
    pub fn render(
        &mut self,
        base_w: u32,
        base_h: u32,
        tiles: &BTreeSet<TileCoord>,
        tile_size: u32,
        auto_hide_ms: u64,
        now_ms: u64,
    ) -> Option<&Overlay> {
        self.clear();
        if tiles.is_empty() || base_w == 0 || base_h == 0 {
            return None;
        }
        let scale_x = self.viewport_w as f64 / base_w as f64;
        let scale_y = self.viewport_h as f64 / base_h as f64;
        // Floor the origin and ceil the size so adjacent blocks leave no
        // rounding gaps.
        let bw = (tile_size as f64 * scale_x).ceil() as u32;
        let bh = (tile_size as f64 * scale_y).ceil() as u32;
        let blocks = tiles
            .iter()
            .map(|t| OverlayBlock {
                x: ((t.x * tile_size) as f64 * scale_x).floor() as u32,
                y: ((t.y * tile_size) as f64 * scale_y).floor() as u32,
                w: bw,
                h: bh,
            })
            .collect();
        let id = format!("tabnab-overlay-{:06x}", rand::thread_rng().gen_range(0..0x100_0000));
        let expires_at_ms = (auto_hide_ms > 0).then(|| now_ms.saturating_add(auto_hide_ms));
        self.current = Some(Overlay { id, blocks, expires_at_ms });
        self.current.as_ref()
    }

    /// Remove the overlay. Safe to call when none exists.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Remove the overlay if its auto-hide deadline has passed. A stale
    /// hide timer left over from a replaced overlay falls through
    /// harmlessly here.
    pub fn expire(&mut self, now_ms: u64) {
        if let Some(overlay) = &self.current {
            if overlay.expires_at_ms.is_some_and(|at| at <= now_ms) {
                self.current = None;
            }
        }
    }

    pub fn current(&self) -> Option<&Overlay> {
        self.current.as_ref()
    }
}
