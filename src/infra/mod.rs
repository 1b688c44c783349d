// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the training and evaluation
// workflows:
//
//   checkpoint.rs — persists the trained parameters to
//                   checkpoints/checkpoint.pt with Burn's
//                   named MessagePack recorder, and the run's
//                   TrainConfig as JSON beside it so evaluation
//                   can rebuild the same architecture.
//
//   metrics.rs    — in-memory run counters and timings,
//                   rendered as a short text report after the
//                   first epoch and at the end of training.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Records and Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Run metrics and the short metrics report
pub mod metrics;
