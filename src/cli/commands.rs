// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `train-amp` and `eval`.
//
// The hyperparameters are fixed constants of TrainConfig; only
// the directories can be moved from the command line.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::{
    Precision, TrainConfig, CHECKPOINT_DIR, TEST_DATA_DIR, TRAIN_DATA_DIR,
};

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the MLP on MNIST in full precision
    Train(TrainArgs),

    /// Train the MLP on MNIST with automatic mixed precision
    TrainAmp(TrainArgs),

    /// Report test-set accuracy of the saved checkpoint
    Eval(EvalArgs),
}

/// Arguments shared by `train` and `train-amp`.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding (or receiving) the MNIST train split
    #[arg(long, default_value = TRAIN_DATA_DIR)]
    pub data_dir: String,

    /// Directory to write checkpoint.pt and train_config.json to
    #[arg(long, default_value = CHECKPOINT_DIR)]
    pub checkpoint_dir: String,
}

impl TrainArgs {
    /// Convert into the application-layer TrainConfig for one variant.
    /// The application layer never sees clap types.
    pub fn into_config(self, precision: Precision) -> TrainConfig {
        TrainConfig {
            data_dir:       self.data_dir,
            checkpoint_dir: self.checkpoint_dir,
            precision,
            ..TrainConfig::default()
        }
    }
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        a.into_config(Precision::Full)
    }
}

/// All arguments for the `eval` command
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Directory holding (or receiving) the MNIST test split
    #[arg(long, default_value = TEST_DATA_DIR)]
    pub data_dir: String,

    /// Directory where training saved its checkpoint
    #[arg(long, default_value = CHECKPOINT_DIR)]
    pub checkpoint_dir: String,
}
