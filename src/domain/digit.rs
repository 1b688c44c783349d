// ============================================================
// Layer 3 — DigitSample Domain Type
// ============================================================
// One MNIST example: a 28×28 grayscale image stored row-major
// as raw bytes (0 = background, 255 = ink) and its class label.
//
// Pixels stay as u8 here; scaling to [0, 1] happens when the
// batcher turns samples into tensors.
//
// Reference: LeCun et al. (1998) — the MNIST database

use serde::{Deserialize, Serialize};

/// Image height in pixels
pub const IMAGE_ROWS: usize = 28;

/// Image width in pixels
pub const IMAGE_COLS: usize = 28;

/// Number of pixels in one flattened image (28 × 28 = 784)
pub const IMAGE_PIXELS: usize = IMAGE_ROWS * IMAGE_COLS;

/// Number of digit classes (0–9)
pub const NUM_CLASSES: usize = 10;

/// A labelled handwritten digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitSample {
    /// Row-major pixel intensities, exactly IMAGE_PIXELS long
    pub pixels: Vec<u8>,

    /// The digit shown in the image, 0..=9
    pub label: u8,
}

impl DigitSample {
    /// Create a new sample. Panics if the pixel buffer is not 28×28
    /// or the label is not a digit — both indicate a corrupt source.
    pub fn new(pixels: Vec<u8>, label: u8) -> Self {
        assert_eq!(
            pixels.len(),
            IMAGE_PIXELS,
            "an MNIST image has {IMAGE_PIXELS} pixels"
        );
        assert!((label as usize) < NUM_CLASSES, "label {label} is not a digit");
        Self { pixels, label }
    }

    /// Pixel intensities scaled to [0, 1]
    pub fn normalized(&self) -> impl Iterator<Item = f32> + '_ {
        self.pixels.iter().map(|&p| p as f32 / 255.0)
    }
}
