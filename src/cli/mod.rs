// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — trains the captioning model on a COCO corpus
//   2. `caption` — loads a checkpoint and captions one image
//   3. `inspect` — loads a classic dataset and reports its shape

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CaptionArgs, Commands, InspectArgs, TrainArgs};

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "image-captioner",
    version = "0.1.0",
    about = "Train a CNN+LSTM captioning model on COCO-style data, then caption images."
)]
pub struct Cli {
    /// The subcommand to run (train, caption or inspect)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Caption(args) => Self::run_caption(args),
            Commands::Inspect(args) => Self::run_inspect(args),
        }
    }

    /// Handles the `train` subcommand.
    /// Converts CLI args into a TrainConfig and hands off to Layer 2.
    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on archives in: {}", args.data_dir);

        let use_case = TrainUseCase::new(args.into());
        use_case.execute()?;

        println!("Done. Checkpoint directory is up to date.");
        Ok(())
    }

    /// Handles the `caption` subcommand.
    /// Loads the model from checkpoint and prints the caption.
    fn run_caption(args: CaptionArgs) -> Result<()> {
        use crate::application::caption_use_case::CaptionUseCase;
        use crate::domain::traits::CaptionGenerator;

        let use_case = CaptionUseCase::new(&args.checkpoint_dir)?;
        let caption = use_case.caption(&args.image)?;
        println!("\nCaption: {}", caption);
        Ok(())
    }

    /// Handles the `inspect` subcommand.
    fn run_inspect(args: InspectArgs) -> Result<()> {
        use crate::application::inspect_use_case::InspectUseCase;

        let use_case = InspectUseCase::new(args.data_dir);
        let report = use_case.execute(args.dataset.into())?;
        println!("{}", report);
        Ok(())
    }
}
