// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`     — the standard training loop
//   2. `train-amp` — the same loop with mixed precision
//   3. `eval`      — test-set accuracy of the last checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, TrainArgs};

use crate::application::train_use_case::Precision;

#[derive(Parser, Debug)]
#[command(
    name = "mnist-train",
    version = "0.1.0",
    about = "Train a small MLP on MNIST, in full or mixed precision."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case of the subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args, Precision::Full),
            Commands::TrainAmp(args) => Self::run_train(args, Precision::Mixed),
            Commands::Eval(args)     => Self::run_eval(args),
        }
    }

    fn run_train(args: TrainArgs, precision: Precision) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting {:?}-precision training, data in: {}", precision, args.data_dir);

        let use_case = TrainUseCase::new(args.into_config(precision));
        use_case.execute()?;
        Ok(())
    }

    fn run_eval(args: EvalArgs) -> Result<()> {
        use crate::application::eval_use_case::EvalUseCase;

        let use_case = EvalUseCase::new(args.checkpoint_dir, args.data_dir);
        let report   = use_case.execute()?;

        println!(
            "Test accuracy: {:.2}% ({}/{})",
            report.accuracy() * 100.0,
            report.correct,
            report.total,
        );
        println!("Test loss: {:.4}", report.mean_loss);
        Ok(())
    }
}
