// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Scores the saved checkpoint on the MNIST test split:
//
//   1. Read train_config.json   → rebuild the architecture
//   2. Read checkpoint.pt       → load the trained parameters
//   3. Load the test split      → MNIST_DATA_test/
//   4. Run the evaluation model (no dropout, no autodiff)

use anyhow::Result;

use crate::data::{
    dataset::DigitDataset,
    loader::{MnistLoader, MnistSplit},
};
use crate::domain::traits::SampleSource;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluator::{evaluate, EvalReport},
    model::Mlp,
    ComputeBackend, ComputeDevice,
};

pub struct EvalUseCase {
    checkpoint_dir: String,
    data_dir:       String,
}

impl EvalUseCase {
    pub fn new(checkpoint_dir: String, data_dir: String) -> Self {
        Self { checkpoint_dir, data_dir }
    }

    pub fn execute(&self) -> Result<EvalReport> {
        let ckpt   = CheckpointManager::new(&self.checkpoint_dir);
        let cfg    = ckpt.load_config()?;
        let device = ComputeDevice::default();

        let model: Mlp<ComputeBackend> = ckpt.load_model(cfg.model.init(&device), &device)?;

        tracing::info!("Loading MNIST test split from '{}'", self.data_dir);
        let samples = MnistLoader::new(&self.data_dir, MnistSplit::Test).load_all()?;
        let dataset = DigitDataset::new(samples);

        evaluate(&model, dataset, cfg.batch_size, &device)
    }
}
