// ============================================================
// Layer 4 — MNIST Loader
// ============================================================
// Reads one MNIST split from a local directory:
//
//   MNIST_DATA_train/
//     train-images-idx3-ubyte   (or .gz)
//     train-labels-idx1-ubyte   (or .gz)
//
// If the files are missing, the split is fetched through burn's
// MnistDataset (which handles the HTTP download) and written
// back into the directory as raw IDX files, so later runs read
// straight from disk.
//
// Reference: Burn Book §4 (Datasets)
//            flate2 crate documentation

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use crate::data::idx;
use crate::domain::digit::DigitSample;
use crate::domain::traits::SampleSource;

/// Which half of MNIST to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnistSplit {
    Train,
    Test,
}

impl MnistSplit {
    fn file_names(self) -> (&'static str, &'static str) {
        match self {
            MnistSplit::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            MnistSplit::Test  => ("t10k-images-idx3-ubyte",  "t10k-labels-idx1-ubyte"),
        }
    }
}

/// Loads one MNIST split from a directory, downloading it if absent.
/// Implements the SampleSource trait from Layer 3.
pub struct MnistLoader {
    dir:   PathBuf,
    split: MnistSplit,
}

impl MnistLoader {
    pub fn new(dir: impl Into<PathBuf>, split: MnistSplit) -> Self {
        Self { dir: dir.into(), split }
    }

    /// Fetch the split through burn and cache it as raw IDX files.
    fn download(&self) -> Result<Vec<DigitSample>> {
        use burn::data::dataset::{vision::MnistDataset, Dataset};

        tracing::info!(
            "MNIST {:?} split not found in '{}', downloading",
            self.split,
            self.dir.display()
        );
        let remote = match self.split {
            MnistSplit::Train => MnistDataset::train(),
            MnistSplit::Test  => MnistDataset::test(),
        };

        let samples: Vec<DigitSample> = remote
            .iter()
            .map(|item| {
                let pixels = item.image.iter().flatten().map(|&p| p as u8).collect();
                DigitSample::new(pixels, item.label)
            })
            .collect();

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create data directory '{}'", self.dir.display()))?;
        let (img_name, lbl_name) = self.split.file_names();
        fs::write(self.dir.join(img_name), idx::encode_images(&samples))
            .with_context(|| format!("Cannot write '{img_name}'"))?;
        fs::write(self.dir.join(lbl_name), idx::encode_labels(&samples))
            .with_context(|| format!("Cannot write '{lbl_name}'"))?;

        tracing::info!("Cached {} samples in '{}'", samples.len(), self.dir.display());
        Ok(samples)
    }
}

impl SampleSource for MnistLoader {
    fn load_all(&self) -> Result<Vec<DigitSample>> {
        let (img_name, lbl_name) = self.split.file_names();

        let image_bytes = read_maybe_gz(&self.dir, img_name)?;
        let label_bytes = read_maybe_gz(&self.dir, lbl_name)?;

        match (image_bytes, label_bytes) {
            (Some(images), Some(labels)) => {
                let samples = idx::parse_samples(&images, &labels)
                    .with_context(|| format!("Malformed MNIST files in '{}'", self.dir.display()))?;
                tracing::debug!(
                    "Loaded {} {:?} samples from '{}'",
                    samples.len(),
                    self.split,
                    self.dir.display()
                );
                Ok(samples)
            }
            _ => self.download(),
        }
    }
}

/// Read `dir/name`, falling back to `dir/name.gz`.
/// Returns Ok(None) when neither file exists.
fn read_maybe_gz(dir: &Path, name: &str) -> Result<Option<Vec<u8>>> {
    let raw = dir.join(name);
    if raw.exists() {
        let bytes = fs::read(&raw)
            .with_context(|| format!("Cannot read '{}'", raw.display()))?;
        return Ok(Some(bytes));
    }

    let gz = dir.join(format!("{name}.gz"));
    if gz.exists() {
        let file = fs::File::open(&gz)
            .with_context(|| format!("Cannot open '{}'", gz.display()))?;
        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Cannot decompress '{}'", gz.display()))?;
        return Ok(Some(bytes));
    }

    Ok(None)
}

/// Write `samples` into `dir` as the raw IDX pair of `split`.
#[cfg(test)]
pub fn write_idx_split(dir: &Path, split: MnistSplit, samples: &[DigitSample]) -> Result<()> {
    let (img_name, lbl_name) = split.file_names();
    fs::create_dir_all(dir)?;
    fs::write(dir.join(img_name), idx::encode_images(samples))?;
    fs::write(dir.join(lbl_name), idx::encode_labels(samples))?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digit::IMAGE_PIXELS;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn samples() -> Vec<DigitSample> {
        (0..5u8)
            .map(|i| DigitSample::new(vec![i * 40; IMAGE_PIXELS], i))
            .collect()
    }

    #[test]
    fn test_reads_raw_idx_files() {
        let dir = tempfile::tempdir().unwrap();
        let s   = samples();
        write_idx_split(dir.path(), MnistSplit::Train, &s).unwrap();
        assert!(dir.path().join("train-images-idx3-ubyte").exists());

        let loaded = MnistLoader::new(dir.path(), MnistSplit::Train).load_all().unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_reads_gzipped_idx_files() {
        let dir = tempfile::tempdir().unwrap();
        let s   = samples();
        for (name, bytes) in [
            ("t10k-images-idx3-ubyte.gz", idx::encode_images(&s)),
            ("t10k-labels-idx1-ubyte.gz", idx::encode_labels(&s)),
        ] {
            let mut enc = GzEncoder::new(Vec::new(), Compression::default());
            enc.write_all(&bytes).unwrap();
            fs::write(dir.path().join(name), enc.finish().unwrap()).unwrap();
        }

        let loaded = MnistLoader::new(dir.path(), MnistSplit::Test).load_all().unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded[3].label, 3);
    }

    #[test]
    fn test_malformed_files_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train-images-idx3-ubyte"), b"not an idx file").unwrap();
        fs::write(dir.path().join("train-labels-idx1-ubyte"), b"nope").unwrap();

        let err = MnistLoader::new(dir.path(), MnistSplit::Train).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("Malformed MNIST files"));
    }
}
