use burn::data::dataset::Dataset;

use crate::domain::digit::DigitSample;

/// In-memory MNIST split. The whole training set is 47 MB of
/// pixels, so it is simply held as a Vec.
pub struct DigitDataset {
    samples: Vec<DigitSample>,
}

impl DigitDataset {
    pub fn new(samples: Vec<DigitSample>) -> Self { Self { samples } }

    /// Number of batches one pass over the dataset produces
    pub fn steps_per_epoch(&self, batch_size: usize) -> usize {
        self.samples.len().div_ceil(batch_size.max(1))
    }

    /// `n` random images with random labels, reproducible from `seed`.
    #[cfg(test)]
    pub fn synthetic(n: usize, seed: u64) -> Self {
        Self::new(synthetic_samples(n, seed))
    }
}

#[cfg(test)]
pub fn synthetic_samples(n: usize, seed: u64) -> Vec<DigitSample> {
    use crate::domain::digit::IMAGE_PIXELS;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let pixels = (0..IMAGE_PIXELS).map(|_| rng.gen()).collect();
            DigitSample::new(pixels, rng.gen_range(0..10u8))
        })
        .collect()
}

impl Dataset<DigitSample> for DigitDataset {
    fn get(&self, index: usize) -> Option<DigitSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_per_epoch_rounds_up() {
        let ds = DigitDataset::synthetic(65, 1);
        assert_eq!(ds.steps_per_epoch(32), 3);
        assert_eq!(DigitDataset::synthetic(64, 1).steps_per_epoch(32), 2);
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let a = DigitDataset::synthetic(4, 9);
        let b = DigitDataset::synthetic(4, 9);
        assert_eq!(a.get(3), b.get(3));
        assert_eq!(a.len(), 4);
        assert!(a.get(4).is_none());
    }
}
