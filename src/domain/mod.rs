// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types that define the core concepts of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or archive handling
//   - Only plain structs, enums, and traits
//
// Keeping this layer pure means the vocabulary, the loaders and
// the use cases can be unit tested without a GPU or a dataset
// archive on disk.

// A decoded, resized, normalised image
pub mod image;

// A tokenised caption
pub mod caption;

// Core abstractions (traits) that other layers implement
pub mod traits;
