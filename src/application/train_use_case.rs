// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full captioning pipeline in order:
//
//   Step 1: Skip check                (Layer 6 - infra)
//   Step 2: Load images + captions    (Layer 4 - data)
//   Step 3: Build / load vocabulary   (Layer 6 - infra)
//   Step 4: Compute / load embeddings (Layers 5+6)
//   Step 5: Encode captions           (Layer 4 - data)
//   Step 6: Build train/val datasets  (Layer 4 - data)
//   Step 7: Save config               (Layer 6 - infra)
//   Step 8: Run training loop         (Layer 5 - ml)
//   Step 9: Save final checkpoint     (Layer 6 - infra)
//
// Step 1 is the contract the CLI relies on: a finished model on
// disk means `train` is a no-op unless --retrain is passed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use burn::{
    backend::{wgpu::WgpuDevice, Autodiff, Wgpu},
    prelude::*,
};

use crate::data::{coco, dataset::CaptionDataset, splitter::split_train_val, vocab::Vocabulary};
use crate::domain::caption::Caption;
use crate::domain::traits::FeatureExtractor;
use crate::infra::{
    checkpoint::CheckpointManager,
    embedding_store::EmbeddingStore,
    metrics::MetricsLogger,
    vocab_store::VocabStore,
};
use crate::ml::{encoder::default_extractor, model::CaptionModelConfig, trainer::train_loop};

// ─── Training Configuration ──────────────────────────────────────────────────
// All paths and hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:          String,
    pub checkpoint_dir:    String,
    pub model_name:        String,
    /// Zip of training JPEGs, relative to data_dir
    pub train_images:      String,
    /// Zip of validation JPEGs; empty = carve validation out of
    /// the training set instead
    pub val_images:        String,
    /// Zip carrying the annotations JSON files
    pub captions_archive:  String,
    pub train_annotations: String,
    pub val_annotations:   String,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub lr:                f64,
    pub img_size:          usize,
    pub img_embed_size:    usize,
    pub img_bottleneck:    usize,
    pub word_embed_size:   usize,
    pub lstm_units:        usize,
    pub logit_bottleneck:  usize,
    pub min_word_freq:     usize,
    pub max_caption_len:   usize,
    pub train_fraction:    f64,
    pub seed:              u64,
    pub retrain:           bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:          "data".to_string(),
            checkpoint_dir:    "checkpoints".to_string(),
            model_name:        "caption_model".to_string(),
            train_images:      "train2014_sample.zip".to_string(),
            val_images:        "val2014_sample.zip".to_string(),
            captions_archive:  "captions_train-val2014.zip".to_string(),
            train_annotations: "annotations/captions_train2014.json".to_string(),
            val_annotations:   "annotations/captions_val2014.json".to_string(),
            epochs:            12,
            batch_size:        64,
            lr:                1e-3,
            img_size:          128,
            img_embed_size:    128,
            img_bottleneck:    120,
            word_embed_size:   100,
            lstm_units:        300,
            logit_bottleneck:  120,
            min_word_freq:     5,
            max_caption_len:   20,
            train_fraction:    0.9,
            seed:              42,
            retrain:           false,
        }
    }
}

impl TrainConfig {
    /// Architecture half of the config, bound to a vocabulary.
    pub fn model_config(&self, vocab_size: usize, pad_idx: usize) -> CaptionModelConfig {
        CaptionModelConfig::new(
            vocab_size,
            pad_idx,
            self.img_embed_size,
            self.img_bottleneck,
            self.word_embed_size,
            self.lstm_units,
            self.logit_bottleneck,
        )
    }

    fn data_path(&self, name: &str) -> PathBuf {
        Path::new(&self.data_dir).join(name)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Skip when a finished model exists ─────────────────────────
        // The existing checkpoint is not loaded here: training has
        // no further use for it, and the caption use case loads it
        // on demand. The skip only asserts it is on disk.
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir, &cfg.model_name);
        if ckpt.has_final() && !cfg.retrain {
            tracing::info!(
                "Found trained model '{}' in '{}' — skipping training (use --retrain to override)",
                cfg.model_name,
                cfg.checkpoint_dir
            );
            return Ok(());
        }

        // ── Step 2: Load training images with aligned captions ───────────────
        tracing::info!("Loading training images from '{}'", cfg.train_images);
        let images = coco::load_images(&cfg.data_path(&cfg.train_images), cfg.img_size)?;
        let captions =
            coco::load_captions(&cfg.data_path(&cfg.captions_archive), &cfg.train_annotations)?;
        let (images, captions) = coco::align(images, &captions);
        tracing::info!("{} captioned training images", images.len());

        // ── Step 3: Build / load the vocabulary ───────────────────────────────
        // Built from TRAINING captions only, so validation stays unseen
        let flat: Vec<_> = captions.iter().flatten().cloned().collect();
        let vocab = resolve_vocabulary(
            &VocabStore::new(&cfg.checkpoint_dir),
            cfg.retrain,
            &flat,
            cfg.min_word_freq,
        )?;
        tracing::info!("Vocabulary size: {}", vocab.len());

        // ── Step 4: Image embeddings (cached on disk) ─────────────────────────
        let extractor = default_extractor(cfg.img_embed_size, cfg.seed);
        let embed_store = EmbeddingStore::new(&cfg.data_dir);
        let embeds = embed_store.load_or_compute("train", cfg.seed, &images, extractor.as_ref())?;

        // ── Step 5: Encode captions, flatten to samples ───────────────────────
        let encoded: Vec<Vec<Vec<u32>>> =
            captions.iter().map(|caps| vocab.encode_all(caps)).collect();
        let samples = CaptionDataset::from_pairs(&embeds, &encoded).into_samples();
        tracing::info!("Built {} training samples", samples.len());

        // ── Step 6: Train / validation datasets ───────────────────────────────
        let (train_samples, val_samples) = if cfg.val_images.is_empty() {
            split_train_val(samples, cfg.train_fraction, cfg.seed)
        } else {
            let val = self.load_val_samples(&vocab, extractor.as_ref(), &embed_store)?;
            (samples, val)
        };
        tracing::info!(
            "Split: {} train, {} validation samples",
            train_samples.len(),
            val_samples.len()
        );
        let train_dataset = CaptionDataset::new(train_samples);
        let val_dataset = CaptionDataset::new(val_samples);

        // ── Step 7: Save config for inference ─────────────────────────────────
        ckpt.save_config(cfg)?;

        // ── Step 8: Run the training loop ─────────────────────────────────────
        type B = Autodiff<Wgpu>;
        B::seed(cfg.seed);
        let device = WgpuDevice::default();
        let model = cfg
            .model_config(vocab.len(), vocab.pad_idx() as usize)
            .init::<B>(&device);

        let metrics = MetricsLogger::new(&cfg.checkpoint_dir);
        let outcome = train_loop(
            cfg,
            model,
            vocab.pad_idx(),
            train_dataset,
            val_dataset,
            Some(&ckpt),
            Some(&metrics),
            &device,
        )?;

        // ── Step 9: Final checkpoint ──────────────────────────────────────────
        ckpt.save_final(&outcome.model)?;
        tracing::info!("Training complete — model saved to '{}'", cfg.checkpoint_dir);
        Ok(())
    }

    /// Load the validation split through the same pipeline as
    /// training: decode, align, embed (cached), encode.
    fn load_val_samples(
        &self,
        vocab: &Vocabulary,
        extractor: &dyn FeatureExtractor,
        embed_store: &EmbeddingStore,
    ) -> Result<Vec<crate::data::dataset::CaptionSample>> {
        let cfg = &self.config;
        let images = coco::load_images(&cfg.data_path(&cfg.val_images), cfg.img_size)?;
        let captions =
            coco::load_captions(&cfg.data_path(&cfg.captions_archive), &cfg.val_annotations)?;
        let (images, captions) = coco::align(images, &captions);

        let embeds = embed_store.load_or_compute("val", cfg.seed, &images, extractor)?;
        let encoded: Vec<Vec<Vec<u32>>> =
            captions.iter().map(|caps| vocab.encode_all(caps)).collect();
        Ok(CaptionDataset::from_pairs(&embeds, &encoded).into_samples())
    }
}

/// A retrain discards the model the saved vocabulary belonged to,
/// so the vocabulary is rebuilt from the current captions with it.
/// Without --retrain the saved file wins, keeping the mapping the
/// existing weights were trained under.
fn resolve_vocabulary(
    store: &VocabStore,
    retrain: bool,
    captions: &[Caption],
    min_freq: usize,
) -> Result<Vocabulary> {
    if retrain {
        store.rebuild(captions, min_freq)
    } else {
        store.load_or_build(captions, min_freq)
    }
}
