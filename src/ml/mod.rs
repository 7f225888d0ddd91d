// ============================================================
// Layer 5 — Machine Learning
// ============================================================
// All Burn-specific code lives here: the convolutional image
// encoder, the LSTM caption decoder, the training loop, and the
// greedy sampler. The rest of the crate talks to this layer
// through plain Rust types (Vec<f32> embeddings, String
// captions) and the domain traits.

/// Convolutional image encoder behind the FeatureExtractor trait
pub mod encoder;

/// LSTM caption decoder with the masked teacher-forcing loss
pub mod model;

/// Seeded training loop with Adam, EMA loss and checkpoints
pub mod trainer;

/// Greedy autoregressive caption generation
pub mod sampler;
