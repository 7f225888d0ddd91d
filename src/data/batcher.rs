// ============================================================
// Layer 4 — Caption Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// CaptionSamples into tensors.
//
// Unlike pre-padded pipelines, caption lengths vary per sample,
// so padding is DYNAMIC: every sequence in a batch is padded
// with the pad index up to the longest sequence in that batch
// (never to a global maximum). The model later rebuilds the
// loss mask from the same pad index, which is why the batcher
// is constructed with it.
//
//   Input:  N samples, embeddings of length E, captions of
//           length l_1..l_N
//   Output: img_embeds [N, E] float, tokens [N, max(l_i)] int

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::CaptionSample;

/// A batch ready for the caption model forward pass.
#[derive(Debug, Clone)]
pub struct CaptionBatch<B: Backend> {
    /// Image embeddings — shape [batch_size, embed_dim]
    pub img_embeds: Tensor<B, 2>,

    /// Padded token id sequences — shape [batch_size, max_len]
    pub tokens: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct CaptionBatcher<B: Backend> {
    device: B::Device,
    pad_idx: u32,
}

impl<B: Backend> CaptionBatcher<B> {
    pub fn new(device: B::Device, pad_idx: u32) -> Self {
        Self { device, pad_idx }
    }
}

impl<B: Backend> Batcher<CaptionSample, CaptionBatch<B>> for CaptionBatcher<B> {
    fn batch(&self, items: Vec<CaptionSample>) -> CaptionBatch<B> {
        let batch_size = items.len();
        let embed_dim = items[0].img_embed.len();
        let max_len = items
            .iter()
            .map(|s| s.token_ids.len())
            .max()
            .unwrap_or(0);

        // Flatten embeddings row by row, then reshape to [N, E]
        let embed_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.img_embed.iter().copied())
            .collect();

        // Pad every caption to the batch maximum with pad_idx
        let token_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| {
                s.token_ids
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(self.pad_idx).take(max_len - s.token_ids.len()))
                    .map(|t| t as i32)
            })
            .collect();

        let img_embeds = Tensor::<B, 1>::from_floats(embed_flat.as_slice(), &self.device)
            .reshape([batch_size, embed_dim]);

        let tokens = Tensor::<B, 1, Int>::from_ints(token_flat.as_slice(), &self.device)
            .reshape([batch_size, max_len]);

        CaptionBatch { img_embeds, tokens }
    }
}
