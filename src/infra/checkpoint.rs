// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// File naming convention, all under the checkpoint directory:
//
//   <model-name>.mpk.gz           ← final weights (fixed base name)
//   <model-name>_epoch_N.mpk.gz   ← weights after epoch N
//   train_config.json             ← run + architecture config
//
// The fixed base name carries the skip-training rule: when the
// final file exists and retraining was not requested, the
// training use case loads it instead of training. A MISSING
// final checkpoint is "no existing model", not an error — only
// an explicit load of a missing file fails.
//
// The config is saved separately because inference has to know
// the exact architecture (lstm_units, vocab size source, ...)
// to rebuild the model before the weights can be loaded into it.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{HalfPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::CaptionModel;

pub struct CheckpointManager {
    dir: PathBuf,
    model_name: String,
}

impl CheckpointManager {
    /// Create a manager for `<dir>/<model_name>*` files.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, model_name: impl Into<String>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir, model_name: model_name.into() }
    }

    /// True when the final checkpoint is on disk.
    pub fn has_final(&self) -> bool {
        self.dir
            .join(format!("{}.mpk.gz", self.model_name))
            .exists()
    }

    /// Save weights under the fixed base name.
    pub fn save_final<B: Backend>(&self, model: &CaptionModel<B>) -> Result<()> {
        self.save(model, &self.model_name)
    }

    /// Save an intermediate per-epoch checkpoint.
    pub fn save_epoch<B: Backend>(&self, model: &CaptionModel<B>, epoch: usize) -> Result<()> {
        self.save(model, &format!("{}_epoch_{}", self.model_name, epoch))
    }

    fn save<B: Backend>(&self, model: &CaptionModel<B>, stem: &str) -> Result<()> {
        // recorder appends the .mpk.gz extension itself
        let path = self.dir.join(stem);
        NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;
        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(())
    }

    /// Load the final checkpoint into a freshly built model.
    /// The model must have the architecture the weights were
    /// saved with, or loading fails.
    pub fn load_final<B: Backend>(
        &self,
        model: CaptionModel<B>,
        device: &B::Device,
    ) -> Result<CaptionModel<B>> {
        let path = self.dir.join(&self.model_name);
        let record = NamedMpkGzFileRecorder::<HalfPrecisionSettings>::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;
        Ok(model.load_record(record))
    }

    /// Persist the training configuration; must happen before
    /// training so inference can always rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        Ok(())
    }

    /// Read the saved training configuration from a checkpoint
    /// directory. Used first by the caption use case, before the
    /// model name is even known.
    pub fn load_config_in(dir: &Path) -> Result<TrainConfig> {
        let path = dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' first.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        Self::load_config_in(&self.dir)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::CaptionModelConfig;

    type TestBackend = burn::backend::NdArray;

    fn small_config() -> CaptionModelConfig {
        CaptionModelConfig::new(10, 0, 4, 3, 3, 5, 3)
    }

    #[test]
    fn test_missing_checkpoint_is_not_final() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "weights");
        assert!(!ckpt.has_final());
    }

    #[test]
    fn test_save_then_has_final() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "weights");

        let device = Default::default();
        let model = small_config().init::<TestBackend>(&device);
        ckpt.save_final(&model).unwrap();

        assert!(ckpt.has_final());
    }

    #[test]
    fn test_epoch_checkpoints_do_not_mark_final() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "weights");

        let device = Default::default();
        let model = small_config().init::<TestBackend>(&device);
        ckpt.save_epoch(&model, 3).unwrap();

        assert!(!ckpt.has_final());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path(), "weights");

        let cfg = TrainConfig::default();
        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();

        assert_eq!(loaded.model_name, cfg.model_name);
        assert_eq!(loaded.lstm_units, cfg.lstm_units);
        assert_eq!(loaded.epochs, cfg.epochs);
    }
}
