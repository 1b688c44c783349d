// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a trained model on the MNIST test split.
//
// The model passed in is the evaluation model: on the inner
// (non-autodiff) backend, so dropout is the identity and no
// computation graph is recorded.
//
//   argmax(1) returns [batch, 1] so we flatten to [batch]
//   before comparing with the targets.
//
// Reference: Burn Book §5 (Inference)

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    prelude::*,
};

use crate::data::{batcher::DigitBatcher, dataset::DigitDataset};
use crate::ml::model::Mlp;

/// Accuracy and loss over a whole dataset
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub correct:   usize,
    pub total:     usize,
    pub mean_loss: f64,
}

impl EvalReport {
    /// Fraction of correctly classified samples, in [0, 1]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 { 0.0 } else { self.correct as f64 / self.total as f64 }
    }
}

pub fn evaluate<B: Backend>(
    model:      &Mlp<B>,
    dataset:    DigitDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<EvalReport> {
    if dataset.is_empty() {
        bail!("The evaluation set is empty");
    }

    let loader = DataLoaderBuilder::new(DigitBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .num_workers(1)
        .build(dataset);

    let mut correct  = 0usize;
    let mut total    = 0usize;
    let mut loss_sum = 0.0f64;

    for batch in loader.iter() {
        let [n, _, _] = batch.images.dims();
        let images    = batch.images.flatten::<2>(1, 2);

        let (loss, log_probs) = model.forward_loss(images, batch.targets.clone());
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        let predicted = log_probs.argmax(1).flatten::<1>(0, 1);
        let hits: i64 = predicted
            .equal(batch.targets)
            .int().sum().into_scalar().elem::<i64>();

        correct += hits as usize;
        total   += n;
    }

    tracing::debug!("Evaluated {} samples", total);

    Ok(EvalReport {
        correct,
        total,
        mean_loss: loss_sum / total.max(1) as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digit::DigitSample;
    use crate::ml::model::MlpConfig;
    use crate::ml::testing::{backend_lock, TestBackend};
    use burn::module::Param;

    #[test]
    fn test_counts_every_sample_once() {
        let _guard = backend_lock();
        let device = Default::default();
        let model: Mlp<TestBackend> = MlpConfig::new().init(&device);

        let report = evaluate(&model, DigitDataset::synthetic(50, 2), 16, &device).unwrap();
        assert_eq!(report.total, 50);
        assert!(report.correct <= 50);
        assert!(report.mean_loss.is_finite() && report.mean_loss > 0.0);
        assert!((0.0..=1.0).contains(&report.accuracy()));
    }

    #[test]
    fn test_biased_model_hits_its_class() {
        let _guard = backend_lock();
        let device = Default::default();
        let mut model: Mlp<TestBackend> = MlpConfig::new().init(&device);

        // Zero the last layer and push every prediction to class 3.
        model.fc3.weight = Param::from_tensor(model.fc3.weight.val().zeros_like());
        let bias = Tensor::<TestBackend, 1>::from_floats(
            [0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            &device,
        );
        model.fc3.bias = Some(Param::from_tensor(bias));

        let samples = vec![
            DigitSample::new(vec![10; 784], 3),
            DigitSample::new(vec![20; 784], 3),
            DigitSample::new(vec![30; 784], 7),
        ];
        let report = evaluate(&model, DigitDataset::new(samples), 2, &device).unwrap();
        assert_eq!(report.correct, 2);
        assert_eq!(report.total, 3);
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let device = Default::default();
        let model: Mlp<TestBackend> = {
            let _guard = backend_lock();
            MlpConfig::new().init(&device)
        };
        assert!(evaluate(&model, DigitDataset::new(Vec::new()), 8, &device).is_err());
    }
}
