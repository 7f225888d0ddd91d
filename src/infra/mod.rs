// ============================================================
// Layer 6 — Infrastructure
// ============================================================
// Everything that touches the filesystem between runs: model
// weights, the vocabulary, cached image embeddings, and the
// per-epoch metrics log. Training writes all four; inference
// reads the first two and never retrains.

/// Model weight save/load via Burn's CompactRecorder
pub mod checkpoint;

/// JSON cache of per-image embeddings, keyed by split
pub mod embedding_store;

/// Persisted token ↔ index mapping
pub mod vocab_store;

/// Per-epoch CSV metrics log
pub mod metrics;
