//! Dominant-color gate for photo attachments.
//!
//! Flag graphics and meme-style images in this domain are overwhelmingly
//! red and black; a photo whose red/black pixel fraction meets the
//! threshold is rejected before any classifier work. Decode failures are
//! non-fatal: a missing or corrupt image must not block legitimate text
//! content, so the gate fails open.

use std::path::Path;

use tracing::warn;

/// Analysis resolution. Downscaling first keeps the per-image cost fixed.
const SAMPLE_SIZE: u32 = 100;

/// Verdict from the media gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Passed,
    Rejected,
}

/// Media gate with a configured rejection threshold.
pub struct MediaGate {
    threshold: f32,
}

impl MediaGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Inspect a downloaded photo. Videos never go through this gate.
    pub fn inspect(&self, path: &Path) -> GateVerdict {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image decode failed, gate passes");
                return GateVerdict::Passed;
            }
        };

        let ratio = red_black_ratio(&img);
        if ratio >= self.threshold {
            GateVerdict::Rejected
        } else {
            GateVerdict::Passed
        }
    }
}

/// Fraction of pixels that are red-dominant or black-dominant after
/// downscaling to [`SAMPLE_SIZE`]².
fn red_black_ratio(img: &image::DynamicImage) -> f32 {
    let small = img
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, image::imageops::FilterType::Nearest)
        .to_rgb8();

    let mut hits = 0usize;
    for pixel in small.pixels() {
        let [r, g, b] = pixel.0;
        let red_dominant = r > 150 && g < 80 && b < 80;
        let black_dominant = r < 50 && g < 50 && b < 50;
        if red_dominant || black_dominant {
            hits += 1;
        }
    }
    hits as f32 / (SAMPLE_SIZE * SAMPLE_SIZE) as f32
}
