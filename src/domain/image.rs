// ============================================================
// Layer 3 — ImageRecord Domain Type
// ============================================================
// Represents one decoded image after cropping, resizing and
// pixel normalisation. By the time an ImageRecord exists, all
// JPEG/archive handling is already done — this is plain data.
//
// Pixels are stored channel-major ([C, H, W] flattened) because
// that is the layout the convolutional encoder consumes, and
// values are normalised to [0, 1].

use serde::{Deserialize, Serialize};

/// A decoded image, keyed by the filename it came from.
/// The filename is the join key between images, embeddings
/// and captions — index alignment across those three arrays
/// is the central invariant of the data pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Base filename inside the source archive (e.g. "COCO_train2014_000000123.jpg")
    pub filename: String,

    /// Image width in pixels after resizing
    pub width: usize,

    /// Image height in pixels after resizing
    pub height: usize,

    /// Normalised pixel values in [0, 1], channel-major:
    /// pixels[c * h * w + y * w + x]
    pub pixels: Vec<f32>,
}

impl ImageRecord {
    pub const CHANNELS: usize = 3;

    pub fn new(filename: impl Into<String>, width: usize, height: usize, pixels: Vec<f32>) -> Self {
        Self { filename: filename.into(), width, height, pixels }
    }

    /// Number of values one image contributes to a tensor.
    pub fn numel(&self) -> usize {
        Self::CHANNELS * self.height * self.width
    }
}
