// ============================================================
// Layer 2 — Caption Use Case
// ============================================================
// Inference workflow for one image:
//   1. Load the saved run config       (Layer 6 - infra)
//   2. Rebuild the sampler from disk   (Layers 5+6)
//   3. Decode and embed the image      (Layers 4+5)
//   4. Generate a caption greedily     (Layer 5 - ml)
//
// The feature extractor is rebuilt with the seed recorded in the
// config, so inference-time embeddings match the ones the model
// was trained on.

use anyhow::Result;
use burn::backend::{wgpu::WgpuDevice, Wgpu};
use std::path::Path;

use crate::data::coco;
use crate::domain::traits::{CaptionGenerator, FeatureExtractor};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{encoder::default_extractor, sampler::CaptionSampler};

pub struct CaptionUseCase {
    img_size: usize,
    extractor: Box<dyn FeatureExtractor>,
    sampler: CaptionSampler<Wgpu>,
}

impl CaptionUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let cfg = CheckpointManager::load_config_in(Path::new(checkpoint_dir))?;

        let device = WgpuDevice::default();
        let sampler = CaptionSampler::from_checkpoint(Path::new(checkpoint_dir), &device)?;
        let extractor = default_extractor(cfg.img_embed_size, cfg.seed);

        Ok(Self { img_size: cfg.img_size, extractor, sampler })
    }
}

impl CaptionGenerator for CaptionUseCase {
    fn caption(&self, filename: &str) -> Result<String> {
        let image = coco::load_image_file(Path::new(filename), self.img_size)?;
        let embed = self.extractor.extract(&image)?;
        self.sampler.sample(&embed)
    }
}
