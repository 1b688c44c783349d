// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch/step loop shared by the standard and the mixed-precision
// run. Per step:
//
//   images [B,28,28] ──flatten──► [B,784] ──► forward ──► NLL loss
//   loss ──scale──► backward ──► grads ──unscale──► SGD step
//                                           └──► skipped on overflow
//   scaler update ──► mark_step ──► reset timer while in warmup
//
// Burn produces fresh gradients on every backward pass, so
// there is nothing to zero between steps.
//
// At the end of the run:
//   throughput of the last epoch ──► final loss ──► device sync
//   ──► checkpoint.pt ──► metrics report
//
// Key Burn 0.16 insight:
//   - Training uses an Autodiff backend for gradients
//   - Batches are built by the batcher directly on the training
//     device; the loop still moves them explicitly
//   - The final loss is read back once, after the last epoch
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{batcher::DigitBatcher, dataset::DigitDataset};
use crate::domain::throughput::{StepTimer, Throughput};
use crate::domain::traits::DeviceRuntime;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::RunMetrics;
use crate::ml::model::Mlp;
use crate::ml::precision::PrecisionStrategy;

/// Loop parameters taken from the TrainConfig
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub epochs:       usize,
    pub warmup_steps: usize,
    pub batch_size:   usize,
    pub lr:           f64,
    /// Print the metrics report once the first epoch is done
    pub early_metrics_report: bool,
}

/// Summary numbers of a finished run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub total_steps:      usize,
    pub optimizer_steps:  usize,
    pub skipped_steps:    usize,
    pub steps_last_epoch: usize,
    pub final_loss:       f64,
    pub throughput:       Throughput,
    pub loss_scale:       f32,
}

pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model:   Mlp<B>,
    pub report:  TrainingReport,
    pub metrics: RunMetrics,
}

#[allow(clippy::too_many_arguments)]
pub fn train_loop<B, O, P, R>(
    settings:  &LoopSettings,
    mut model: Mlp<B>,
    mut optim: O,
    dataset:   DigitDataset,
    device:    &B::Device,
    precision: &mut P,
    runtime:   &mut R,
    ckpt:      &CheckpointManager,
) -> Result<TrainingOutcome<B>>
where
    B: AutodiffBackend,
    O: Optimizer<Mlp<B>, B>,
    P: PrecisionStrategy<B>,
    R: DeviceRuntime,
{
    if dataset.is_empty() {
        bail!("The training set is empty: no batch to train on");
    }
    if settings.epochs == 0 {
        bail!("Training needs at least one epoch");
    }

    let steps_per_epoch = dataset.steps_per_epoch(settings.batch_size);
    tracing::info!(
        "Training {} epochs x {} steps (batch {}, lr {}, {})",
        settings.epochs, steps_per_epoch, settings.batch_size, settings.lr, precision.name(),
    );

    // ── Data loader: sequential order, one worker ─────────────────────────────
    let batcher = DigitBatcher::<B>::new(device.clone());
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(settings.batch_size)
        .num_workers(1)
        .build(dataset);

    let mut metrics = RunMetrics::new();
    metrics.set_loss_scale(precision.loss_scale());

    let mut timer = StepTimer::start();
    let mut last: Option<(usize, Tensor<B::InnerBackend, 1>)> = None;
    let mut steps_last_epoch = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..settings.epochs {
        timer.reset();
        let epoch_timer = StepTimer::start();
        let mut steps_this_epoch = 0usize;

        for (step, batch) in loader.iter().enumerate() {
            let step_timer = StepTimer::start();

            let images  = batch.images.flatten::<2>(1, 2).to_device(device);
            let targets = batch.targets.to_device(device);

            let (loss, _) = model.forward_loss(images, targets);

            let scaled = precision.scale_loss(loss.clone());
            let grads  = GradientsParams::from_grads(scaled.backward(), &model);

            let applied = match precision.unscale(&model, grads) {
                Some(grads) => {
                    model = optim.step(settings.lr, model, grads);
                    true
                }
                None => {
                    tracing::warn!(
                        "Epoch {} step {}: gradients overflowed, optimizer step skipped",
                        epoch + 1, step,
                    );
                    false
                }
            };
            precision.update();

            metrics.record_step(applied);
            metrics.set_loss_scale(precision.loss_scale());

            runtime.mark_step()?;
            metrics.record_step_marker();

            if step < settings.warmup_steps {
                metrics.record_warmup(step_timer.elapsed());
                timer.reset();
            }

            last = Some((step, loss.inner()));
            steps_this_epoch += 1;
        }

        metrics.record_epoch(epoch_timer.elapsed());
        steps_last_epoch = steps_this_epoch;
        tracing::debug!("Epoch {} ran {} steps", epoch + 1, steps_this_epoch);

        println!("Epoch {}/{} completed", epoch + 1, settings.epochs);

        if epoch == 0 && settings.early_metrics_report {
            println!("Compilation metrics:");
            println!("{}", metrics.short_report());
        }
    }

    let Some((last_step, last_loss)) = last else {
        bail!("The data loader yielded no batch: nothing was trained");
    };

    // ── Throughput of the final epoch ─────────────────────────────────────────
    let throughput = Throughput::measure(last_step, settings.warmup_steps, timer.elapsed());
    match throughput {
        Throughput::Measured { .. } => {}
        Throughput::Degenerate { interval, elapsed } => tracing::warn!(
            "Throughput undefined: {} measured steps in {:?} (warmup {} >= last step {})",
            interval, elapsed, settings.warmup_steps, last_step,
        ),
    }
    println!("Train throughput (iter/sec): {}", throughput);

    let final_loss: f64 = last_loss.into_scalar().elem::<f64>();
    println!("Final loss is {:.4}", final_loss);

    // ── Persist ───────────────────────────────────────────────────────────────
    runtime.wait_device_ops()?;
    metrics.record_device_sync();

    let path = ckpt.save_model(&model)?;
    tracing::info!("Checkpoint saved to '{}'", path.display());

    println!("----------End Training ---------------");
    println!("Final metrics:");
    println!("{}", metrics.short_report());

    let report = TrainingReport {
        total_steps:     metrics.steps,
        optimizer_steps: metrics.optimizer_steps,
        skipped_steps:   metrics.skipped_steps,
        steps_last_epoch,
        final_loss,
        throughput,
        loss_scale:      precision.loss_scale(),
    };

    Ok(TrainingOutcome { model, report, metrics })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::MlpConfig;
    use crate::ml::params::ParamInventory;
    use crate::ml::precision::{DynamicLossScaler, FullPrecision};
    use crate::ml::testing::{backend_lock, TestAutodiffBackend, TestBackend};
    use burn::optim::SgdConfig;

    type B = TestAutodiffBackend;

    /// Records the calls the loop makes on the device runtime.
    #[derive(Default)]
    struct CountingRuntime {
        marks: usize,
        waits: usize,
    }

    impl DeviceRuntime for CountingRuntime {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn mark_step(&mut self) -> Result<()> {
            self.marks += 1;
            Ok(())
        }

        fn wait_device_ops(&mut self) -> Result<()> {
            self.waits += 1;
            Ok(())
        }
    }

    fn settings(epochs: usize) -> LoopSettings {
        LoopSettings {
            epochs,
            warmup_steps: 2,
            batch_size: 32,
            lr: 0.01,
            early_metrics_report: true,
        }
    }

    #[test]
    fn test_one_epoch_end_to_end() {
        let _guard  = backend_lock();
        let device  = Default::default();
        let dir     = tempfile::tempdir().unwrap();
        let ckpt    = CheckpointManager::new(dir.path().join("checkpoints"));

        TestBackend::seed(0);
        let model: Mlp<B> = MlpConfig::new().init(&device);
        let initial = ParamInventory::collect(&model);
        let optim   = SgdConfig::new().init();
        let mut runtime = CountingRuntime::default();

        let outcome = train_loop(
            &settings(1),
            model,
            optim,
            DigitDataset::synthetic(64, 7),
            &device,
            &mut FullPrecision,
            &mut runtime,
            &ckpt,
        )
        .unwrap();

        let report = &outcome.report;
        assert_eq!(report.total_steps, 2);
        assert_eq!(report.optimizer_steps, 2);
        assert_eq!(report.skipped_steps, 0);
        assert_eq!(report.steps_last_epoch, 2);
        assert!(report.final_loss.is_finite() && report.final_loss > 0.0);
        assert_eq!(report.loss_scale, 1.0);

        // Last step index 1 < 2 warmup steps.
        assert!(report.throughput.is_degenerate());

        assert_eq!(runtime.marks, 2);
        assert_eq!(runtime.waits, 1);
        assert_eq!(outcome.metrics.epochs, 1);
        assert_eq!(outcome.metrics.step_markers, 2);

        let trained = ParamInventory::collect(&outcome.model);
        assert!(!initial.same_values(&trained));

        let files: Vec<_> = std::fs::read_dir(ckpt.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert!(ckpt.checkpoint_path().exists());

        let restored = ckpt
            .load_model(MlpConfig::new().init::<TestBackend>(&device), &device)
            .unwrap();
        let saved = ParamInventory::collect(&restored);
        assert_eq!(saved.tensor_count(), 6);
        assert!(saved.same_values(&trained));
    }

    #[test]
    fn test_multiple_epochs_measure_throughput() {
        let _guard = backend_lock();
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());

        let model: Mlp<B> = MlpConfig::new().init(&device);
        let mut runtime = CountingRuntime::default();
        let cfg = LoopSettings { batch_size: 8, ..settings(2) };

        let outcome = train_loop(
            &cfg,
            model,
            SgdConfig::new().init(),
            DigitDataset::synthetic(40, 3),
            &device,
            &mut FullPrecision,
            &mut runtime,
            &ckpt,
        )
        .unwrap();

        // 5 steps per epoch, last step index 4, 2 warmup steps.
        assert_eq!(outcome.report.total_steps, 10);
        assert_eq!(outcome.report.steps_last_epoch, 5);
        assert_eq!(outcome.metrics.epoch_times.len(), 2);
        assert_eq!(runtime.marks, 10);
        assert!(!outcome.report.throughput.is_degenerate());
        assert!(outcome.report.throughput.iters_per_sec().unwrap() > 0.0);
    }

    #[test]
    fn test_mixed_precision_variant_runs() {
        let _guard = backend_lock();
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path());

        let model: Mlp<B> = MlpConfig::new().init(&device);
        let mut scaler  = DynamicLossScaler::default();
        let mut runtime = CountingRuntime::default();
        let cfg = LoopSettings { early_metrics_report: false, ..settings(1) };

        let outcome = train_loop(
            &cfg,
            model,
            SgdConfig::new().init(),
            DigitDataset::synthetic(64, 11),
            &device,
            &mut scaler,
            &mut runtime,
            &ckpt,
        )
        .unwrap();

        let report = &outcome.report;
        assert_eq!(report.total_steps, 2);
        assert_eq!(report.optimizer_steps + report.skipped_steps, 2);
        assert_eq!(report.loss_scale, PrecisionStrategy::<B>::loss_scale(&scaler));
        assert!(report.final_loss.is_finite());
        assert!(ckpt.checkpoint_path().exists());
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let device = Default::default();
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().join("checkpoints"));

        let model: Mlp<B> = {
            let _guard = backend_lock();
            MlpConfig::new().init(&device)
        };
        let mut runtime = CountingRuntime::default();

        let result = train_loop(
            &settings(1),
            model,
            SgdConfig::new().init(),
            DigitDataset::new(Vec::new()),
            &device,
            &mut FullPrecision,
            &mut runtime,
            &ckpt,
        );

        assert!(result.is_err());
        assert_eq!(runtime.marks, 0);
        assert!(!ckpt.checkpoint_path().exists());
    }
}
