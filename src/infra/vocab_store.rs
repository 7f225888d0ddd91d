// ============================================================
// Layer 6 — Vocabulary Store
// ============================================================
// Persists the token ↔ index mapping next to the checkpoints.
// The mapping is part of the trained model: weights are only
// meaningful under the vocabulary they were trained with, so
// inference must load this file, never rebuild from the corpus.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};

use crate::data::vocab::Vocabulary;
use crate::domain::caption::Caption;

pub struct VocabStore {
    path: PathBuf,
}

impl VocabStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { path: dir.join("vocab.json") }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved vocabulary, or build one from the training
    /// captions and save it. Training uses this; inference should
    /// call `load` and fail loudly when the file is missing.
    pub fn load_or_build(&self, captions: &[Caption], min_freq: usize) -> Result<Vocabulary> {
        if self.exists() {
            return self.load();
        }
        let vocab = Vocabulary::build(captions, min_freq);
        self.save(&vocab)?;
        tracing::info!("Built vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }

    /// Build a fresh vocabulary and overwrite the saved file.
    /// Used on retrain: the old file described a model that is
    /// about to be discarded.
    pub fn rebuild(&self, captions: &[Caption], min_freq: usize) -> Result<Vocabulary> {
        let vocab = Vocabulary::build(captions, min_freq);
        self.save(&vocab)?;
        tracing::info!("Rebuilt vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }

    pub fn load(&self) -> Result<Vocabulary> {
        let json = fs::read_to_string(&self.path).with_context(|| {
            format!(
                "Cannot read vocabulary from '{}'. Have you trained the model first?",
                self.path.display()
            )
        })?;
        let vocab: Vocabulary = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt vocabulary file '{}'", self.path.display()))?;
        tracing::debug!("Loaded vocabulary with {} tokens", vocab.len());
        Ok(vocab)
    }

    pub fn save(&self, vocab: &Vocabulary) -> Result<()> {
        let json = serde_json::to_string(vocab)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write vocabulary to '{}'", self.path.display()))?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Caption> {
        vec![
            Caption::from_text("a dog runs"),
            Caption::from_text("a dog sleeps"),
        ]
    }

    #[test]
    fn test_round_trip_preserves_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());

        let built = store.load_or_build(&corpus(), 1).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(built.len(), loaded.len());
        for token in ["a", "dog", "runs", "sleeps"] {
            assert_eq!(built.token_to_index(token), loaded.token_to_index(token));
        }
        assert_eq!(built.pad_idx(), loaded.pad_idx());
    }

    #[test]
    fn test_second_build_loads_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());

        let first = store.load_or_build(&corpus(), 1).unwrap();
        // Different corpus, but the saved file wins
        let second = store.load_or_build(&[], 1).unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_rebuild_overwrites_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());

        store.load_or_build(&corpus(), 1).unwrap();
        let rebuilt = store
            .rebuild(&[Caption::from_text("a cat naps")], 1)
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), rebuilt.len());
        assert_ne!(loaded.token_to_index("cat"), loaded.unk_idx());
        assert_eq!(loaded.token_to_index("runs"), loaded.unk_idx());
    }

    #[test]
    fn test_load_without_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = VocabStore::new(dir.path());
        assert!(!store.exists());
        assert!(store.load().is_err());
    }
}
