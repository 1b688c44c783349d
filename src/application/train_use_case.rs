// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Pick the device, seed the RNG  (Layer 5 - ml)
//   Step 2: Load the MNIST train split     (Layer 4 - data)
//   Step 3: Build the Burn dataset         (Layer 4 - data)
//   Step 4: Build model + SGD optimiser    (Layer 5 - ml)
//   Step 5: Save config                    (Layer 6 - infra)
//   Step 6: Run the training loop with the
//           selected precision strategy    (Layer 5 - ml)
//
// The dataset is loaded here and handed to the loop by value;
// nothing is loaded at start-up or kept in a global.
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{optim::SgdConfig, tensor::backend::Backend};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::DigitDataset,
    loader::{MnistLoader, MnistSplit},
};
use crate::domain::traits::{DeviceRuntime, SampleSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    device::BurnRuntime,
    model::{Mlp, MlpConfig},
    params::ParamInventory,
    precision::{DynamicLossScaler, FullPrecision},
    trainer::{train_loop, LoopSettings, TrainingReport},
    ComputeDevice, TrainBackend,
};

/// Default dataset directory of the training split
pub const TRAIN_DATA_DIR: &str = "./MNIST_DATA_train";

/// Default dataset directory of the test split
pub const TEST_DATA_DIR: &str = "./MNIST_DATA_test";

/// Default checkpoint directory
pub const CHECKPOINT_DIR: &str = "checkpoints";

/// Which training loop variant runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    /// Standard loop: plain f32 backward pass
    #[default]
    Full,
    /// Mixed-precision loop: dynamic loss scaling
    Mixed,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Fixed constants of a training run. Serialisable so the
// evaluation command can rebuild the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:       String,
    pub checkpoint_dir: String,
    pub epochs:         usize,
    pub warmup_steps:   usize,
    pub batch_size:     usize,
    pub lr:             f64,
    pub seed:           u64,
    pub precision:      Precision,
    pub model:          MlpConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:       TRAIN_DATA_DIR.to_string(),
            checkpoint_dir: CHECKPOINT_DIR.to_string(),
            epochs:         4,
            warmup_steps:   2,
            batch_size:     32,
            lr:             0.01,
            seed:           0,
            precision:      Precision::Full,
            model:          MlpConfig::new(),
        }
    }
}

impl TrainConfig {
    fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            epochs:       self.epochs,
            warmup_steps: self.warmup_steps,
            batch_size:   self.batch_size,
            lr:           self.lr,
            // Only the standard variant reports after the first epoch.
            early_metrics_report: self.precision == Precision::Full,
        }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Device and seed ───────────────────────────────────────────
        let device      = ComputeDevice::default();
        let mut runtime = BurnRuntime::<TrainBackend>::new(device.clone());
        TrainBackend::seed(cfg.seed);
        println!("Using device: {}", runtime.describe());

        // ── Step 2: Load the train split ──────────────────────────────────────
        tracing::info!("Loading MNIST train split from '{}'", cfg.data_dir);
        let samples = MnistLoader::new(&cfg.data_dir, MnistSplit::Train).load_all()?;
        tracing::info!("Loaded {} training images", samples.len());

        // ── Step 3: Burn dataset ──────────────────────────────────────────────
        let dataset = DigitDataset::new(samples);

        // ── Step 4: Model and optimiser ───────────────────────────────────────
        // θ = θ - lr * g
        let model: Mlp<TrainBackend> = cfg.model.init(&device);
        let optim = SgdConfig::new().init();
        let inventory = ParamInventory::collect(&model);
        tracing::info!(
            "Model ready: {} parameter tensors, {} parameters",
            inventory.tensor_count(),
            inventory.scalar_count(),
        );

        // ── Step 5: Save config for evaluation ────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt.save_config(cfg)?;

        // ── Step 6: Training loop (Layer 5) ───────────────────────────────────
        let settings = cfg.loop_settings();
        let outcome = match cfg.precision {
            Precision::Full => {
                println!("----------Training ---------------");
                train_loop(
                    &settings, model, optim, dataset, &device,
                    &mut FullPrecision, &mut runtime, &ckpt,
                )?
            }
            Precision::Mixed => {
                let mut scaler = DynamicLossScaler::default();
                println!("Using Automatic Mixed Precision (AMP)");
                println!("----------Training ---------------");
                train_loop(
                    &settings, model, optim, dataset, &device,
                    &mut scaler, &mut runtime, &ckpt,
                )?
            }
        };

        tracing::info!(
            "Training complete: {} steps, {} skipped, {} device syncs",
            outcome.report.total_steps,
            outcome.report.skipped_steps,
            runtime.syncs(),
        );
        Ok(outcome.report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{dataset::synthetic_samples, loader::write_idx_split};
    use crate::ml::testing::backend_lock;
    use std::path::Path;

    fn one_epoch_config(root: &Path, precision: Precision) -> TrainConfig {
        TrainConfig {
            data_dir:       root.join("data").display().to_string(),
            checkpoint_dir: root.join("checkpoints").display().to_string(),
            epochs:         1,
            precision,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let _guard = backend_lock();
        let root   = tempfile::tempdir().unwrap();
        write_idx_split(&root.path().join("data"), MnistSplit::Train, &synthetic_samples(64, 5)).unwrap();

        let cfg    = one_epoch_config(root.path(), Precision::Full);
        let first  = TrainUseCase::new(cfg.clone()).execute().unwrap();
        let second = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(first.total_steps, 2);
        assert_eq!(first.optimizer_steps, 2);
        assert_eq!(first.final_loss.to_bits(), second.final_loss.to_bits());

        let ckpt  = CheckpointManager::new(&cfg.checkpoint_dir);
        let saved = ckpt.load_config().unwrap();
        assert_eq!(saved.epochs, 1);
        assert_eq!(saved.precision, Precision::Full);
        assert!(ckpt.checkpoint_path().exists());
    }

    #[test]
    fn test_mixed_precision_run() {
        let _guard = backend_lock();
        let root   = tempfile::tempdir().unwrap();
        write_idx_split(&root.path().join("data"), MnistSplit::Train, &synthetic_samples(64, 6)).unwrap();

        let cfg    = one_epoch_config(root.path(), Precision::Mixed);
        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();

        assert_eq!(report.total_steps, 2);
        assert_eq!(report.optimizer_steps + report.skipped_steps, 2);
        assert!(report.loss_scale >= 1.0);
        assert!(report.final_loss.is_finite());

        let saved = CheckpointManager::new(&cfg.checkpoint_dir).load_config().unwrap();
        assert_eq!(saved.precision, Precision::Mixed);
    }

    #[test]
    fn test_default_constants() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 4);
        assert_eq!(cfg.warmup_steps, 2);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.seed, 0);
        assert_eq!(cfg.data_dir, "./MNIST_DATA_train");
        assert_eq!(cfg.checkpoint_dir, "checkpoints");
        assert_eq!(cfg.precision, Precision::Full);
        assert_eq!(cfg.model.hidden_1, 120);
    }

    #[test]
    fn test_early_report_only_in_standard_loop() {
        let full  = TrainConfig::default();
        let mixed = TrainConfig { precision: Precision::Mixed, ..TrainConfig::default() };
        assert!(full.loop_settings().early_metrics_report);
        assert!(!mixed.loop_settings().early_metrics_report);
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { precision: Precision::Mixed, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.precision, Precision::Mixed);
        assert_eq!(back.model.input_size, 784);
        assert_eq!(back.model.dropout, 0.2);
    }
}
