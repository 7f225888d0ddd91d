// ============================================================
// Layer 5 — Caption Sampler
// ============================================================
// Autoregressive decoding with a trained model. Generation is
// GREEDY: at every step the argmax token is chosen, so the same
// model and the same embedding always produce the same caption.
// Decoding starts from the start marker, feeds each chosen token
// back in, and stops at the end marker or the length cap.

use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::data::vocab::Vocabulary;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::model::CaptionModel;

pub struct CaptionSampler<B: Backend> {
    model: CaptionModel<B>,
    vocab: Vocabulary,
    max_len: usize,
    device: B::Device,
}

impl<B: Backend> CaptionSampler<B> {
    pub fn new(
        model: CaptionModel<B>,
        vocab: Vocabulary,
        max_len: usize,
        device: B::Device,
    ) -> Self {
        Self { model, vocab, max_len, device }
    }

    /// Rebuild a sampler from a checkpoint directory: the saved
    /// config tells us the architecture, the saved vocabulary
    /// tells us the output size, and the recorded weights fill
    /// the model in.
    pub fn from_checkpoint(dir: &Path, device: &B::Device) -> Result<Self> {
        let cfg = CheckpointManager::load_config_in(dir)?;
        let vocab = VocabStore::new(dir).load()?;

        let ckpt = CheckpointManager::new(dir, &cfg.model_name);
        let model = cfg
            .model_config(vocab.len(), vocab.pad_idx() as usize)
            .init::<B>(device);
        let model = ckpt.load_final(model, device)?;

        Ok(Self::new(model, vocab, cfg.max_caption_len, device.clone()))
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Generate a caption for one image embedding.
    pub fn sample(&self, img_embed: &[f32]) -> Result<String> {
        let embed = Tensor::<B, 1>::from_floats(img_embed, &self.device)
            .reshape([1, img_embed.len()]);

        let mut state = self.model.init_state(embed);
        let mut token = self.vocab.start_idx();
        let mut generated = Vec::new();

        for _ in 0..self.max_len {
            let input = Tensor::<B, 1, Int>::from_ints([token as i32], &self.device);
            let (logits, next_state) = self.model.decode_step(state, input);
            state = next_state;

            // Greedy: most probable token wins, every time
            let next = logits.argmax(1).into_scalar().elem::<i64>() as u32;
            if next == self.vocab.end_idx() {
                break;
            }
            generated.push(next);
            token = next;
        }

        Ok(self.vocab.decode(&generated))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::domain::caption::Caption;
    use crate::ml::model::CaptionModelConfig;

    type TestBackend = burn::backend::NdArray;

    fn vocab() -> Vocabulary {
        Vocabulary::build(
            &[
                Caption::from_text("a dog runs on grass"),
                Caption::from_text("a cat sleeps"),
            ],
            1,
        )
    }

    fn model_for(v: &Vocabulary) -> CaptionModel<TestBackend> {
        let device = Default::default();
        CaptionModelConfig::new(v.len(), v.pad_idx() as usize, 4, 3, 3, 5, 3).init(&device)
    }

    #[test]
    fn test_caption_has_no_reserved_tokens() {
        let v = vocab();
        let sampler = CaptionSampler::new(model_for(&v), v, 10, Default::default());

        let caption = sampler.sample(&[0.3, -0.1, 0.8, 0.2]).unwrap();
        for reserved in ["#PAD#", "#START#", "#END#", "#UNK#"] {
            assert!(!caption.contains(reserved), "caption was '{}'", caption);
        }
    }

    #[test]
    fn test_greedy_sampling_is_deterministic() {
        let v = vocab();
        let sampler = CaptionSampler::new(model_for(&v), v, 10, Default::default());

        let embed = [0.3, -0.1, 0.8, 0.2];
        assert_eq!(sampler.sample(&embed).unwrap(), sampler.sample(&embed).unwrap());
    }

    #[test]
    fn test_length_cap_bounds_generation() {
        let v = vocab();
        let sampler = CaptionSampler::new(model_for(&v), v, 4, Default::default());

        let caption = sampler.sample(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert!(caption.split_whitespace().count() <= 4);
    }

    #[test]
    fn test_checkpoint_round_trip_same_captions() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();

        let v = vocab();
        let mut cfg = TrainConfig::default();
        cfg.img_embed_size = 4;
        cfg.img_bottleneck = 3;
        cfg.word_embed_size = 3;
        cfg.lstm_units = 5;
        cfg.logit_bottleneck = 3;
        cfg.max_caption_len = 10;

        let model = cfg
            .model_config(v.len(), v.pad_idx() as usize)
            .init::<TestBackend>(&device);

        let ckpt = CheckpointManager::new(dir.path(), &cfg.model_name);
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_final(&model).unwrap();
        VocabStore::new(dir.path()).save(&v).unwrap();

        let original = CaptionSampler::new(model, v, cfg.max_caption_len, device);
        let restored = CaptionSampler::<TestBackend>::from_checkpoint(
            dir.path(),
            &Default::default(),
        )
        .unwrap();

        for embed in [[0.3, -0.1, 0.8, 0.2], [0.9, 0.9, -0.5, 0.1]] {
            assert_eq!(
                original.sample(&embed).unwrap(),
                restored.sample(&embed).unwrap(),
                "restored model must caption identically"
            );
        }
    }
}
