//! Tile-based screenshot comparison.
//!
//! The plane is partitioned into `tileSize` squares (edge tiles clipped,
//! still counted), pixels are sampled at `stride` intervals, and a tile is
//! flagged once enough sampled pixels moved past the per-pixel threshold.
//! Pure and deterministic: identical inputs always produce identical
//! output.

use std::collections::BTreeSet;

use crate::config::Config;
use crate::types::{DiffResult, Screenshot, TileCoord};

/// Number of tiles a `w x h` plane partitions into.
pub fn total_tiles(w: u32, h: u32, tile_size: u32) -> u64 {
    let tile = tile_size.max(1) as u64;
    (w as u64).div_ceil(tile) * (h as u64).div_ceil(tile)
}

/// Compare two equal-sized screenshots tile by tile.
///
/// Precondition: `base` and `current` have the same dimensions; callers
/// resample the fresh capture into the baseline's dimensions first.
pub fn diff(base: &Screenshot, current: &Screenshot, cfg: &Config) -> DiffResult {
    diff_inner(base, current, cfg, true)
}

fn diff_inner(base: &Screenshot, current: &Screenshot, cfg: &Config, early_exit: bool) -> DiffResult {
    debug_assert_eq!((base.width, base.height), (current.width, current.height));

    let w = base.width as usize;
    let h = base.height as usize;
    let tile = cfg.tile_size.max(1) as usize;
    let stride = cfg.stride.max(1) as usize;
    // Mean of the three channel deltas, kept in integer form.
    let px_thresh = 3 * cfg.pixel_diff_threshold as u32;
    let a = &base.pixels;
    let b = &current.pixels;

    let tiles_x = w.div_ceil(tile);
    let tiles_y = h.div_ceil(tile);
    let mut changed_tiles = BTreeSet::new();

    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile;
            let y0 = ty * tile;
            let x1 = (x0 + tile).min(w);
            let y1 = (y0 + tile).min(h);

            // Fixed sample budget for the tile. Classifying against this
            // budget (not the count actually visited) is what makes the
            // early stop below exact: the changed count only grows, so
            // once it reaches the threshold no remaining sample can flip
            // the outcome.
            let area = (x1 - x0) * (y1 - y0);
            let max_samples = (area / (stride * stride)).max(1);
            let needed = (max_samples as f64 * cfg.tile_change_ratio_threshold).ceil() as usize;

            let mut diff_count = 0usize;
            'tile: for y in (y0..y1).step_by(stride) {
                let row = y * w;
                for x in (x0..x1).step_by(stride) {
                    let i = (row + x) * 4;
                    let delta = a[i].abs_diff(b[i]) as u32
                        + a[i + 1].abs_diff(b[i + 1]) as u32
                        + a[i + 2].abs_diff(b[i + 2]) as u32;
                    if delta >= px_thresh {
                        diff_count += 1;
                        if early_exit && diff_count >= needed {
                            break 'tile;
                        }
                    }
                }
            }

            if diff_count >= needed {
                changed_tiles.insert(TileCoord {
                    x: tx as u32,
                    y: ty as u32,
                });
            }
        }
    }

    let total = (tiles_x * tiles_y) as f64;
    let percent = if total > 0.0 {
        100.0 * changed_tiles.len() as f64 / total
    } else {
        0.0
    };
    DiffResult { changed_tiles, percent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{paint, solid};

    fn cfg() -> Config {
        Config::default()
    }

    #[test]
    fn self_diff_is_empty() {
        let shot = paint(37, 23, |x, y| ((x * 7 % 256) as u8, (y * 11 % 256) as u8, 40));
        let out = diff(&shot, &shot, &cfg());
        assert_eq!(out.percent, 0.0);
        assert!(out.changed_tiles.is_empty());
    }

    #[test]
    fn total_tiles_uses_ceiling_on_both_axes() {
        assert_eq!(total_tiles(100, 100, 10), 100);
        assert_eq!(total_tiles(101, 100, 10), 110);
        assert_eq!(total_tiles(101, 101, 10), 121);
        assert_eq!(total_tiles(9, 9, 10), 1);
        assert_eq!(total_tiles(1, 1, 1), 1);
    }

    #[test]
    fn percent_is_changed_over_total() {
        // 100x100 with tileSize 10 -> 100 tiles; blacken one tile.
        let base = solid(100, 100, (200, 200, 200));
        let curr = paint(100, 100, |x, y| {
            if x < 10 && y < 10 {
                (0, 0, 0)
            } else {
                (200, 200, 200)
            }
        });
        let out = diff(&base, &curr, &cfg());
        assert_eq!(out.changed_tiles.len(), 1);
        assert!(out.changed_tiles.contains(&TileCoord { x: 0, y: 0 }));
        assert_eq!(out.percent, 1.0);
    }

    #[test]
    fn clipped_edge_tiles_still_detect() {
        // 25x25 with tileSize 10 -> 3x3 grid, edge tiles 5px wide/tall.
        let base = solid(25, 25, (255, 255, 255));
        let curr = solid(25, 25, (0, 0, 0));
        let out = diff(&base, &curr, &cfg());
        assert_eq!(out.changed_tiles.len(), 9);
        assert_eq!(out.percent, 100.0);
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let base = solid(20, 20, (100, 100, 100));
        let mut curr = base.clone();
        for px in curr.pixels.chunks_exact_mut(4) {
            px[3] = 0;
        }
        let out = diff(&base, &curr, &cfg());
        assert!(out.changed_tiles.is_empty());
    }

    #[test]
    fn pixel_threshold_boundary_is_inclusive() {
        let mut c = cfg();
        c.pixel_diff_threshold = 20;
        let base = solid(10, 10, (100, 100, 100));
        // mean delta exactly 20
        let at = solid(10, 10, (120, 120, 120));
        assert_eq!(diff(&base, &at, &c).changed_tiles.len(), 1);
        // mean delta 19 stays below
        let below = solid(10, 10, (119, 119, 119));
        assert!(diff(&base, &below, &c).changed_tiles.is_empty());
    }

    #[test]
    fn ratio_threshold_boundary_is_inclusive() {
        // 10x10 tile, stride 2 -> budget 25 samples, ratio 0.2 -> 5 needed.
        // Changing rows 0..4 flips 5 of the visited sample rows' worth:
        // samples at y in {0,2} x in {0,2,4,6,8} -> 10 changed, >= 5.
        let mut c = cfg();
        c.tile_change_ratio_threshold = 0.2;
        let base = solid(10, 10, (0, 0, 0));
        let curr = paint(10, 10, |_, y| if y < 4 { (255, 255, 255) } else { (0, 0, 0) });
        assert_eq!(diff(&base, &curr, &c).changed_tiles.len(), 1);

        // A single changed sample (1/25 = 0.04) stays below 0.2.
        let lone = paint(10, 10, |x, y| if x == 0 && y == 0 { (255, 255, 255) } else { (0, 0, 0) });
        assert!(diff(&base, &lone, &c).changed_tiles.is_empty());
    }

    #[test]
    fn raising_thresholds_never_adds_tiles() {
        let base = paint(60, 60, |x, y| (((x * 3) % 256) as u8, ((y * 5) % 256) as u8, 128));
        let curr = paint(60, 60, |x, y| {
            let bump = if (x / 7 + y / 5) % 3 == 0 { 60u8 } else { 10 };
            (
                (((x * 3) % 256) as u8).saturating_add(bump),
                ((y * 5) % 256) as u8,
                128,
            )
        });

        let mut last = usize::MAX;
        for px_thresh in [5, 15, 30, 60, 120] {
            let mut c = cfg();
            c.pixel_diff_threshold = px_thresh;
            let n = diff(&base, &curr, &c).changed_tiles.len();
            assert!(n <= last, "pixel threshold {px_thresh} grew the set");
            last = n;
        }

        let mut last = usize::MAX;
        for ratio in [0.05, 0.2, 0.5, 0.9, 1.0] {
            let mut c = cfg();
            c.pixel_diff_threshold = 15;
            c.tile_change_ratio_threshold = ratio;
            let n = diff(&base, &curr, &c).changed_tiles.len();
            assert!(n <= last, "ratio {ratio} grew the set");
            last = n;
        }
    }

    #[test]
    fn early_exit_matches_exhaustive_sampling() {
        let base = paint(64, 48, |x, y| (((x * 13) % 251) as u8, ((y * 7) % 251) as u8, ((x + y) % 251) as u8));
        let curr = paint(64, 48, |x, y| {
            // patchwork of strong, weak, and no changes
            let cell = (x / 9 + y / 6) % 4;
            let base_px = (((x * 13) % 251) as u8, ((y * 7) % 251) as u8, ((x + y) % 251) as u8);
            match cell {
                0 => (base_px.0.wrapping_add(90), base_px.1, base_px.2),
                1 => (base_px.0.saturating_add(25), base_px.1.saturating_add(25), base_px.2),
                2 => (base_px.0, base_px.1.saturating_add(5), base_px.2),
                _ => base_px,
            }
        });
        for ratio in [0.05, 0.2, 0.5, 1.0] {
            let mut c = cfg();
            c.tile_change_ratio_threshold = ratio;
            let fast = diff_inner(&base, &curr, &c, true);
            let slow = diff_inner(&base, &curr, &c, false);
            assert_eq!(fast.changed_tiles, slow.changed_tiles, "ratio {ratio}");
            assert_eq!(fast.percent, slow.percent, "ratio {ratio}");
        }
    }

    #[test]
    fn stride_one_samples_every_pixel() {
        let mut c = cfg();
        c.stride = 1;
        let base = solid(10, 10, (0, 0, 0));
        let curr = paint(10, 10, |x, _| if x == 0 { (255, 255, 255) } else { (0, 0, 0) });
        // 10 of 100 samples changed, ratio 0.2 needs 20 -> unchanged
        assert!(diff(&base, &curr, &c).changed_tiles.is_empty());
        c.tile_change_ratio_threshold = 0.1;
        assert_eq!(diff(&base, &curr, &c).changed_tiles.len(), 1);
    }
}
