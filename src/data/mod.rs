// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between MNIST files on disk and tensor batches:
//
//   IDX files (raw or .gz)
//       │
//       ▼
//   idx               → parses / encodes the IDX binary format
//       │
//       ▼
//   MnistLoader       → reads a split directory, downloads if absent
//       │
//       ▼
//   DigitDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   DigitBatcher      → stacks samples into image/label tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// IDX binary format parser and encoder
pub mod idx;

/// Loads MNIST splits from a local directory
pub mod loader;

/// Implements Burn's Dataset trait for digit samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
