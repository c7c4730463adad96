//! Debug frame dumps, compiled in with the `debug-dump` feature.

use std::path::Path;

use crate::logger;
use crate::types::Screenshot;

/// Write a screenshot as a PNG for offline inspection.
pub fn dump_png(shot: &Screenshot, path: &Path) {
    match image::RgbaImage::from_raw(shot.width, shot.height, shot.pixels.clone()) {
        Some(img) => {
            if let Err(e) = img.save(path) {
                logger::warn_p("capture", &format!("dump {} failed: {}", path.display(), e));
            }
        }
        None => logger::warn_p("capture", "dump skipped: buffer size mismatch"),
    }
}
