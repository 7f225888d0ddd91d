// ============================================================
// Layer 4 — Caption Dataset
// ============================================================
// Implements Burn's Dataset trait over training samples. The
// corpus is flattened to ONE SAMPLE PER (IMAGE, CAPTION) PAIR:
// an image with five captions contributes five samples sharing
// the same embedding. Shuffling across samples is left to the
// seeded DataLoader, which keeps runs reproducible.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One training sample: a cached image embedding and one of the
/// image's captions, already encoded with start/end markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSample {
    pub img_embed: Vec<f32>,
    pub token_ids: Vec<u32>,
}

pub struct CaptionDataset {
    samples: Vec<CaptionSample>,
}

impl CaptionDataset {
    pub fn new(samples: Vec<CaptionSample>) -> Self {
        Self { samples }
    }

    /// Flatten aligned (embedding, captions-per-image) arrays.
    /// Alignment is the pipeline's core invariant, so a mismatch
    /// here is a programming error, not a data error.
    pub fn from_pairs(embeddings: &[Vec<f32>], captions: &[Vec<Vec<u32>>]) -> Self {
        assert_eq!(
            embeddings.len(),
            captions.len(),
            "embeddings and captions must be index-aligned"
        );

        let samples = embeddings
            .iter()
            .zip(captions)
            .flat_map(|(embed, caps)| {
                caps.iter().map(|token_ids| CaptionSample {
                    img_embed: embed.clone(),
                    token_ids: token_ids.clone(),
                })
            })
            .collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Hand the samples back, e.g. to re-split them.
    pub fn into_samples(self) -> Vec<CaptionSample> {
        self.samples
    }
}

impl Dataset<CaptionSample> for CaptionDataset {
    fn get(&self, index: usize) -> Option<CaptionSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sample_per_caption() {
        let embeddings = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let captions = vec![
            vec![vec![1, 2, 3], vec![1, 4, 3]], // two captions
            vec![vec![1, 5, 3]],                // one caption
        ];
        let ds = CaptionDataset::from_pairs(&embeddings, &captions);
        assert_eq!(ds.sample_count(), 3);

        // samples of the same image share its embedding
        let a = ds.get(0).unwrap();
        let b = ds.get(1).unwrap();
        assert_eq!(a.img_embed, b.img_embed);
        assert_ne!(a.token_ids, b.token_ids);
    }

    #[test]
    #[should_panic]
    fn test_misaligned_inputs_panic() {
        let embeddings = vec![vec![0.1]];
        let captions: Vec<Vec<Vec<u32>>> = vec![vec![], vec![]];
        let _ = CaptionDataset::from_pairs(&embeddings, &captions);
    }
}
