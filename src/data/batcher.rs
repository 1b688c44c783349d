// ============================================================
// Layer 4 — Digit Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<DigitSample>
// into tensors on the target device.
//
//   Input:  N samples, 784 bytes + 1 label each
//   Output: images  [N, 28, 28]  float in [0, 1]
//           targets [N]          int class index
//
// Images keep their 2-D shape here; the training loop flattens
// them to [N, 784] right before the forward pass.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::digit::{DigitSample, IMAGE_COLS, IMAGE_ROWS};

/// A batch of digits ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct DigitBatch<B: Backend> {
    /// Pixel intensities — shape: [batch_size, 28, 28]
    pub images: Tensor<B, 3>,

    /// Class labels — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the device the batches are created on.
#[derive(Clone, Debug)]
pub struct DigitBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> DigitBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<DigitSample, DigitBatch<B>> for DigitBatcher<B> {
    fn batch(&self, items: Vec<DigitSample>) -> DigitBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.normalized())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, IMAGE_ROWS, IMAGE_COLS]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        DigitBatch { images, targets }
    }
}
