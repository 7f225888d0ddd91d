// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `caption` and
// `inspect`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::inspect_use_case::InspectTarget;
use crate::application::train_use_case::TrainConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the image-captioning model on a COCO-style corpus
    Train(TrainArgs),

    /// Caption one image with a trained checkpoint
    Caption(CaptionArgs),

    /// Load a classic dataset and report its shape
    Inspect(InspectArgs),
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing the dataset archives
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory to save checkpoints, vocabulary and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Base name for the saved weights
    #[arg(long, default_value = "caption_model")]
    pub model_name: String,

    /// Training image zip, relative to --data-dir
    #[arg(long, default_value = "train2014_sample.zip")]
    pub train_images: String,

    /// Validation image zip; pass an empty string to carve the
    /// validation set out of the training data instead
    #[arg(long, default_value = "val2014_sample.zip")]
    pub val_images: String,

    /// Zip carrying the annotations JSON files
    #[arg(long, default_value = "captions_train-val2014.zip")]
    pub captions_archive: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 12)]
    pub epochs: usize,

    /// Number of samples processed together in one forward pass
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// How fast the model learns — too high causes instability,
    /// too low causes slow convergence
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Images are resized to img_size × img_size before encoding
    #[arg(long, default_value_t = 128)]
    pub img_size: usize,

    /// Length of the image embedding the encoder produces
    #[arg(long, default_value_t = 128)]
    pub img_embed_size: usize,

    /// Hidden size of the LSTM decoder
    #[arg(long, default_value_t = 300)]
    pub lstm_units: usize,

    /// Size of the learned word embeddings
    #[arg(long, default_value_t = 100)]
    pub word_embed_size: usize,

    /// Words seen fewer times than this map to the unknown token
    #[arg(long, default_value_t = 5)]
    pub min_word_freq: usize,

    /// Hard cap on generated caption length
    #[arg(long, default_value_t = 20)]
    pub max_caption_len: usize,

    /// Seed for shuffling, splitting and weight initialisation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Train even when a finished checkpoint already exists
    #[arg(long, default_value_t = false)]
    pub retrain: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2 —
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:         a.data_dir,
            checkpoint_dir:   a.checkpoint_dir,
            model_name:       a.model_name,
            train_images:     a.train_images,
            val_images:       a.val_images,
            captions_archive: a.captions_archive,
            epochs:           a.epochs,
            batch_size:       a.batch_size,
            lr:               a.lr,
            img_size:         a.img_size,
            img_embed_size:   a.img_embed_size,
            lstm_units:       a.lstm_units,
            word_embed_size:  a.word_embed_size,
            min_word_freq:    a.min_word_freq,
            max_caption_len:  a.max_caption_len,
            seed:             a.seed,
            retrain:          a.retrain,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `caption` command
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Path of the image to caption
    #[arg(long)]
    pub image: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum DatasetName {
    Lfw,
    Mnist,
    Cifar10,
    Names,
}

impl From<DatasetName> for InspectTarget {
    fn from(d: DatasetName) -> Self {
        match d {
            DatasetName::Lfw => InspectTarget::Lfw,
            DatasetName::Mnist => InspectTarget::Mnist,
            DatasetName::Cifar10 => InspectTarget::Cifar10,
            DatasetName::Names => InspectTarget::Names,
        }
    }
}

/// All arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Which dataset to load
    #[arg(long, value_enum)]
    pub dataset: DatasetName,

    /// Directory containing the dataset files
    #[arg(long, default_value = "data")]
    pub data_dir: String,
}
