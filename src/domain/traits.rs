// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types, the
// layers above can swap implementations without changes:
//   - ImageEncoder (burn CNN) implements FeatureExtractor
//   - tests substitute a deterministic extractor, so the whole
//     embedding pipeline is testable without a GPU
//
// This is the Dependency Inversion Principle applied with
// Rust's trait system.

use anyhow::Result;
use crate::domain::image::ImageRecord;

// ─── FeatureExtractor ─────────────────────────────────────────────────────────
/// Any component that can turn a decoded image into a fixed-size
/// feature vector.
///
/// Implementations:
///   - ml::encoder::ImageEncoder → convolutional encoder
///   - test doubles → deterministic hash-based vectors
pub trait FeatureExtractor {
    /// Length of every vector this extractor produces.
    fn embed_dim(&self) -> usize;

    /// Extract one embedding. The returned Vec has exactly
    /// embed_dim() elements.
    fn extract(&self, image: &ImageRecord) -> Result<Vec<f32>>;
}

// ─── CaptionGenerator ─────────────────────────────────────────────────────────
/// Any component that can produce a caption for a named image.
///
/// Implementations:
///   - application::caption_use_case::CaptionUseCase → trained model
pub trait CaptionGenerator {
    /// Generate a caption for the image with the given filename.
    fn caption(&self, filename: &str) -> Result<String>;
}
