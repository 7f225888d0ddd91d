// ============================================================
// Layer 6 — Embedding Store
// ============================================================
// On-disk cache for image embeddings. Extracting features for
// tens of thousands of images dominates preprocessing time, so
// the embeddings are computed once per split and written to
// JSON; later runs load the file instead of re-running the
// encoder.
//
// The cache preserves IMAGE ORDER: embeddings[i] belongs to
// images[i], which is the alignment the caption dataset builds
// on. Filenames and the encoder seed are stored alongside the
// vectors; a cache whose filenames, embedding size or seed no
// longer match the request is stale and is recomputed. The seed
// matters because the encoder weights are initialised from it —
// vectors cached under one seed describe a different encoder
// than the one a differently-seeded run trains against.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::image::ImageRecord;
use crate::domain::traits::FeatureExtractor;

#[derive(Serialize, Deserialize)]
struct CachedEmbeddings {
    embed_dim: usize,
    seed: u64,
    filenames: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl CachedEmbeddings {
    fn matches(&self, images: &[ImageRecord], embed_dim: usize, seed: u64) -> bool {
        self.embed_dim == embed_dim
            && self.seed == seed
            && self.filenames.len() == images.len()
            && self
                .filenames
                .iter()
                .zip(images)
                .all(|(name, img)| *name == img.filename)
    }
}

pub struct EmbeddingStore {
    dir: PathBuf,
}

impl EmbeddingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    fn path_for(&self, split: &str) -> PathBuf {
        self.dir.join(format!("embeddings_{}.json", split))
    }

    /// Return one embedding per image, in image order. Loads the
    /// cached file when it matches the request, otherwise runs the
    /// extractor over every image and caches the result. `seed` is
    /// the seed the extractor's weights were initialised from.
    pub fn load_or_compute(
        &self,
        split: &str,
        seed: u64,
        images: &[ImageRecord],
        extractor: &dyn FeatureExtractor,
    ) -> Result<Vec<Vec<f32>>> {
        let path = self.path_for(split);

        if path.exists() {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read embedding cache '{}'", path.display()))?;
            let cached: CachedEmbeddings = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt embedding cache '{}'", path.display()))?;

            if cached.matches(images, extractor.embed_dim(), seed) {
                tracing::info!(
                    "Loaded {} cached embeddings for split '{}'",
                    cached.embeddings.len(),
                    split
                );
                return Ok(cached.embeddings);
            }
            tracing::warn!(
                "Embedding cache '{}' is stale ({} entries, dim {}), recomputing",
                path.display(),
                cached.embeddings.len(),
                cached.embed_dim
            );
        }

        tracing::info!("Computing embeddings for {} '{}' images", images.len(), split);
        let mut embeddings = Vec::with_capacity(images.len());
        for image in images {
            embeddings.push(extractor.extract(image)?);
        }

        let cached = CachedEmbeddings {
            embed_dim: extractor.embed_dim(),
            seed,
            filenames: images.iter().map(|i| i.filename.clone()).collect(),
            embeddings,
        };
        let json = serde_json::to_string(&cached)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write embedding cache '{}'", path.display()))?;

        Ok(cached.embeddings)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Embeds every image as [mean_pixel, width] and counts calls,
    /// so tests can tell a cache hit from a recompute.
    struct CountingExtractor {
        calls: Cell<usize>,
    }

    impl CountingExtractor {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl FeatureExtractor for CountingExtractor {
        fn embed_dim(&self) -> usize {
            2
        }

        fn extract(&self, image: &ImageRecord) -> Result<Vec<f32>> {
            self.calls.set(self.calls.get() + 1);
            let mean = image.pixels.iter().sum::<f32>() / image.pixels.len() as f32;
            Ok(vec![mean, image.width as f32])
        }
    }

    fn images() -> Vec<ImageRecord> {
        vec![
            ImageRecord::new("a.jpg", 4, 4, vec![0.2; 3 * 4 * 4]),
            ImageRecord::new("b.jpg", 8, 8, vec![0.8; 3 * 8 * 8]),
        ]
    }

    #[test]
    fn test_compute_preserves_image_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let extractor = CountingExtractor::new();

        let embeds = store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0][1], 4.0);
        assert_eq!(embeds[1][1], 8.0);
    }

    #[test]
    fn test_second_load_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let extractor = CountingExtractor::new();

        let first = store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 2);

        let second = store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 2, "cache hit must not re-extract");
        assert_eq!(first, second);
    }

    #[test]
    fn test_splits_are_cached_separately() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let extractor = CountingExtractor::new();

        store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        store.load_or_compute("val", 42, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 4);
    }

    #[test]
    fn test_stale_cache_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let extractor = CountingExtractor::new();

        store.load_or_compute("train", 42, &images()[..1], &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 1);

        // Image list grew: the cached file no longer matches
        let embeds = store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 3);
        assert_eq!(embeds.len(), 2);
    }

    #[test]
    fn test_seed_change_forces_recomputation() {
        let dir = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(dir.path());
        let extractor = CountingExtractor::new();

        store.load_or_compute("train", 42, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 2);

        // A different seed means differently-initialised encoder
        // weights; vectors cached under the old seed are invalid
        store.load_or_compute("train", 7, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 4, "seed change must not hit the cache");

        // The recomputed cache is keyed under the new seed
        store.load_or_compute("train", 7, &images(), &extractor).unwrap();
        assert_eq!(extractor.calls.get(), 4);
    }
}
