// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop and the use cases program against these
// traits rather than concrete types:
//   - MnistLoader implements SampleSource
//   - BurnRuntime implements DeviceRuntime
//   - tests provide their own in-memory / counting versions
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::digit::DigitSample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the labelled digits of one split.
///
/// Implementations:
///   - MnistLoader → IDX files in a local directory, downloaded on demand
pub trait SampleSource {
    /// Load every sample of this source, in file order.
    fn load_all(&self) -> Result<Vec<DigitSample>>;
}

// ─── DeviceRuntime ────────────────────────────────────────────────────────────
/// The two synchronisation contracts the training loop relies on.
///
/// Device work may run asynchronously relative to the host thread.
/// Values read back on the host (the final loss, the checkpoint)
/// are only observed after the operations that produced them.
pub trait DeviceRuntime {
    /// Human-readable identifier of the compute device
    fn describe(&self) -> String;

    /// Mark the end of one logical training step.
    fn mark_step(&mut self) -> Result<()>;

    /// Block until every operation issued so far has completed.
    fn wait_device_ops(&mut self) -> Result<()>;
}
