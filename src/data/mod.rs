// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw archives to tensor batches.
//
// The captioning pipeline flows in this order:
//
//   image zip + captions zip
//       │
//       ▼
//   coco              → decodes JPEGs, merges captions by id
//       │
//       ▼
//   FeatureExtractor  → image → embedding (cached by infra)
//       │
//       ▼
//   Vocabulary        → tokens → indices with start/end/pad/unk
//       │
//       ▼
//   CaptionDataset    → one sample per (image, caption) pair
//       │
//       ▼
//   CaptionBatcher    → pads to the batch max, builds tensors
//       │
//       ▼
//   DataLoader        → seeded shuffled batches for training
//
// The classic loaders (lfw, mnist, cifar10, names) feed the
// other exercises in this repository and share the same
// alignment invariant: images[i] ↔ labels[i].

/// COCO-style captioned image archives (zip + annotations JSON)
pub mod coco;

/// Labeled Faces in the Wild: tgz images merged with attributes
pub mod lfw;

/// MNIST digits from gzipped IDX files
pub mod mnist;

/// CIFAR-10 from the binary tar.gz distribution
pub mod cifar10;

/// Plain-text names corpus
pub mod names;

/// Token ↔ index vocabulary with reserved special tokens
pub mod vocab;

/// Implements Burn's Dataset trait for caption samples
pub mod dataset;

/// Implements Burn's Batcher trait with dynamic padding
pub mod batcher;

/// Seeded shuffle-and-split into train/validation sets
pub mod splitter;
