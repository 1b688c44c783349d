// ============================================================
// Layer 4 — IDX File Format
// ============================================================
// MNIST ships as IDX files, all header values big-endian:
//
//   images: magic 2051 | count u32 | rows u32 | cols u32 | pixels u8...
//   labels: magic 2049 | count u32 | labels u8...
//
// parse_* turns file bytes into samples; encode_* writes the same
// layout back so a downloaded split can be cached on disk.
//
// Reference: http://yann.lecun.com/exdb/mnist/ (file format section)

use anyhow::{bail, Result};

use crate::domain::digit::{DigitSample, IMAGE_COLS, IMAGE_PIXELS, IMAGE_ROWS};

pub const IMAGES_MAGIC: u32 = 2051;
pub const LABELS_MAGIC: u32 = 2049;

const IMAGES_HEADER: usize = 16;
const LABELS_HEADER: usize = 8;

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => bail!("IDX header truncated at byte {offset}"),
    }
}

/// Parse an IDX3 image file into one 784-byte buffer per image.
pub fn parse_images(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let magic = read_u32(bytes, 0)?;
    if magic != IMAGES_MAGIC {
        bail!("invalid IDX image magic: expected {IMAGES_MAGIC}, got {magic}");
    }

    let count = read_u32(bytes, 4)? as usize;
    let rows  = read_u32(bytes, 8)? as usize;
    let cols  = read_u32(bytes, 12)? as usize;
    if rows != IMAGE_ROWS || cols != IMAGE_COLS {
        bail!("expected {IMAGE_ROWS}x{IMAGE_COLS} images, found {rows}x{cols}");
    }

    let payload = &bytes[IMAGES_HEADER..];
    if payload.len() < count * IMAGE_PIXELS {
        bail!(
            "IDX image payload truncated: {} bytes for {count} images",
            payload.len()
        );
    }

    Ok(payload
        .chunks_exact(IMAGE_PIXELS)
        .take(count)
        .map(|chunk| chunk.to_vec())
        .collect())
}

/// Parse an IDX1 label file.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let magic = read_u32(bytes, 0)?;
    if magic != LABELS_MAGIC {
        bail!("invalid IDX label magic: expected {LABELS_MAGIC}, got {magic}");
    }

    let count   = read_u32(bytes, 4)? as usize;
    let payload = &bytes[LABELS_HEADER..];
    if payload.len() < count {
        bail!(
            "IDX label payload truncated: {} bytes for {count} labels",
            payload.len()
        );
    }

    Ok(payload[..count].to_vec())
}

/// Zip image and label files into samples.
pub fn parse_samples(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Vec<DigitSample>> {
    let images = parse_images(image_bytes)?;
    let labels = parse_labels(label_bytes)?;

    if images.len() != labels.len() {
        bail!(
            "MNIST count mismatch: {} images vs {} labels",
            images.len(),
            labels.len()
        );
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 9) {
        bail!("MNIST label {bad} is out of range");
    }

    Ok(images
        .into_iter()
        .zip(labels)
        .map(|(pixels, label)| DigitSample::new(pixels, label))
        .collect())
}

/// Encode samples as an IDX3 image file.
pub fn encode_images(samples: &[DigitSample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(IMAGES_HEADER + samples.len() * IMAGE_PIXELS);
    out.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
    out.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    out.extend_from_slice(&(IMAGE_ROWS as u32).to_be_bytes());
    out.extend_from_slice(&(IMAGE_COLS as u32).to_be_bytes());
    for s in samples {
        out.extend_from_slice(&s.pixels);
    }
    out
}

/// Encode samples as an IDX1 label file.
pub fn encode_labels(samples: &[DigitSample]) -> Vec<u8> {
    let mut out = Vec::with_capacity(LABELS_HEADER + samples.len());
    out.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
    out.extend_from_slice(&(samples.len() as u32).to_be_bytes());
    out.extend(samples.iter().map(|s| s.label));
    out
}
