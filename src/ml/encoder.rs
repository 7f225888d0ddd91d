// ============================================================
// Layer 5 — Image Encoder
// ============================================================
// Maps a decoded image to a fixed-size feature vector. Three
// strided convolutions followed by adaptive average pooling and
// a linear projection — small enough to run the whole corpus on
// CPU, large enough that distinct images land on distinct
// embeddings.
//
// Weight initialisation is seeded, so the same seed produces
// the same embeddings and the on-disk cache stays valid between
// runs. The extractor sits behind the FeatureExtractor trait,
// which is what the embedding store consumes.

use anyhow::{anyhow, Result};
use burn::{
    backend::{wgpu::WgpuDevice, Wgpu},
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation,
};

use crate::domain::image::ImageRecord;
use crate::domain::traits::FeatureExtractor;

#[derive(Config, Debug)]
pub struct ImageEncoderConfig {
    pub embed_dim: usize,
}

impl ImageEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ImageEncoder<B> {
        ImageEncoder {
            conv1: conv_block(ImageRecord::CHANNELS, 16, device),
            conv2: conv_block(16, 32, device),
            conv3: conv_block(32, 64, device),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            proj: LinearConfig::new(64, self.embed_dim).init(device),
            embed_dim: self.embed_dim,
        }
    }
}

fn conv_block<B: Backend>(input: usize, output: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([input, output], [3, 3])
        .with_stride([2, 2])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

#[derive(Module, Debug)]
pub struct ImageEncoder<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    pool: AdaptiveAvgPool2d,
    proj: Linear<B>,
    embed_dim: usize,
}

impl<B: Backend> ImageEncoder<B> {
    /// images: [batch, channels, height, width] → [batch, embed_dim]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = activation::relu(self.conv1.forward(images));
        let x = activation::relu(self.conv2.forward(x));
        let x = activation::relu(self.conv3.forward(x));
        let x = self.pool.forward(x);

        let [n, channels, _, _] = x.dims();
        self.proj.forward(x.reshape([n, channels]))
    }

    pub fn embed_dim(&self) -> usize {
        self.embed_dim
    }
}

/// FeatureExtractor adapter: owns the encoder and its device so
/// the layers above never see a Backend type.
pub struct EncoderExtractor<B: Backend> {
    encoder: ImageEncoder<B>,
    device: B::Device,
}

impl<B: Backend> EncoderExtractor<B> {
    pub fn new(encoder: ImageEncoder<B>, device: B::Device) -> Self {
        Self { encoder, device }
    }
}

impl<B: Backend> FeatureExtractor for EncoderExtractor<B> {
    fn embed_dim(&self) -> usize {
        self.encoder.embed_dim()
    }

    fn extract(&self, image: &ImageRecord) -> Result<Vec<f32>> {
        let input = Tensor::<B, 1>::from_floats(image.pixels.as_slice(), &self.device)
            .reshape([1, ImageRecord::CHANNELS, image.height, image.width]);

        self.encoder
            .forward(input)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow!("Cannot read embedding back from device: {:?}", e))
    }
}

/// The extractor the training and inference pipelines use.
/// Seeding the backend before init keeps the cached embeddings
/// reproducible across runs.
pub fn default_extractor(embed_dim: usize, seed: u64) -> Box<dyn FeatureExtractor> {
    type B = Wgpu;
    B::seed(seed);
    let device = WgpuDevice::default();
    let encoder = ImageEncoderConfig::new(embed_dim).init::<B>(&device);
    Box::new(EncoderExtractor::new(encoder, device))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_embedding_has_fixed_size() {
        let device = Default::default();
        let encoder = ImageEncoderConfig::new(32).init::<TestBackend>(&device);
        let extractor = EncoderExtractor::new(encoder, device);

        let image = ImageRecord::new("x.jpg", 16, 16, vec![0.5; 3 * 16 * 16]);
        let embed = extractor.extract(&image).unwrap();
        assert_eq!(embed.len(), 32);
        assert_eq!(embed.len(), extractor.embed_dim());
    }

    #[test]
    fn test_embedding_size_is_independent_of_image_size() {
        // Adaptive pooling absorbs the spatial dimensions
        let device = Default::default();
        let encoder = ImageEncoderConfig::new(16).init::<TestBackend>(&device);
        let extractor = EncoderExtractor::new(encoder, device);

        let small = ImageRecord::new("s.jpg", 16, 16, vec![0.1; 3 * 16 * 16]);
        let large = ImageRecord::new("l.jpg", 24, 24, vec![0.1; 3 * 24 * 24]);
        assert_eq!(extractor.extract(&small).unwrap().len(), 16);
        assert_eq!(extractor.extract(&large).unwrap().len(), 16);
    }

    #[test]
    fn test_same_seed_same_embedding() {
        let image = ImageRecord::new("x.jpg", 16, 16, vec![0.3; 3 * 16 * 16]);

        let run = || {
            <TestBackend as Backend>::seed(7);
            let device = Default::default();
            let encoder = ImageEncoderConfig::new(8).init::<TestBackend>(&device);
            EncoderExtractor::new(encoder, device).extract(&image).unwrap()
        };

        assert_eq!(run(), run());
    }
}
