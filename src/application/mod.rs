// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, captioning, or inspecting data).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct tensor work (that's Layer 5)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// The single-image captioning workflow
pub mod caption_use_case;

// Dataset sanity reports
pub mod inspect_use_case;
