// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the trained parameters.
//
// What gets written:
//   checkpoints/
//     checkpoint.pt       ← Checkpoint { state_dict } — one entry
//                           holding every parameter tensor, no
//                           optimizer state, no epoch counter
//     train_config.json   ← the TrainConfig of the run
//
// The checkpoint is serialised with Burn's named MessagePack
// bytes recorder at full precision and written in one go, so a
// later run replaces the file wholesale.
//
// Loading is type-safe: the record only fits a model built
// with the same architecture.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Record, Recorder},
};
use std::{fs, path::{Path, PathBuf}};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Mlp, MlpRecord};

/// File name of the parameter checkpoint
pub const CHECKPOINT_FILE: &str = "checkpoint.pt";

/// File name of the saved training configuration
pub const CONFIG_FILE: &str = "train_config.json";

/// The persisted mapping: a single `state_dict` key.
#[derive(Record)]
pub struct Checkpoint<B: Backend> {
    pub state_dict: MlpRecord<B>,
}

type CheckpointRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

/// Manages saving and loading of the model checkpoint.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of checkpoint.pt
    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    /// Write the model parameters to checkpoint.pt, creating the
    /// directory if needed and replacing any previous file.
    pub fn save_model<B: Backend>(&self, model: &Mlp<B>) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let checkpoint = Checkpoint { state_dict: model.clone().into_record() };
        let recorder   = CheckpointRecorder::default();
        let bytes: Vec<u8> = Recorder::<B>::record(&recorder, checkpoint, ())
            .with_context(|| "Failed to serialise model parameters")?;

        let path = self.checkpoint_path();
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        tracing::debug!("Saved checkpoint to '{}'", path.display());
        Ok(path)
    }

    /// Load checkpoint.pt into a freshly constructed model of the
    /// same architecture.
    pub fn load_model<B: Backend>(&self, model: Mlp<B>, device: &B::Device) -> Result<Mlp<B>> {
        let path  = self.checkpoint_path();
        let bytes = fs::read(&path).with_context(|| {
            format!("Cannot read checkpoint '{}'. Have you trained the model first?", path.display())
        })?;

        let recorder = CheckpointRecorder::default();
        let checkpoint: Checkpoint<B> = Recorder::<B>::load(&recorder, bytes, device)
            .with_context(|| format!("Checkpoint '{}' does not match the model", path.display()))?;

        tracing::info!("Loaded checkpoint from '{}'", path.display());
        Ok(model.load_record(checkpoint.state_dict))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;

        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'eval'.",
                path.display()
            )
        })?;

        Ok(serde_json::from_str(&json)?)
    }
}
