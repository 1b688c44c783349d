// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific model and training code lives here:
//
//   model.rs     — the 784-120-84-10 perceptron with dropout
//                  and its negative-log-likelihood loss
//
//   precision.rs — loss-scaling strategies: identity for the
//                  standard loop, dynamic loss scaling for
//                  the mixed-precision loop
//
//   device.rs    — the DeviceRuntime implementation for any
//                  Burn backend (step markers, device sync)
//
//   params.rs    — walks a module's parameter tensors
//
//   trainer.rs   — the epoch/step training loop
//
//   evaluator.rs — test-set accuracy of a trained model
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Multilayer perceptron architecture
pub mod model;

/// Full-precision and dynamic loss-scaling strategies
pub mod precision;

/// Burn-backed device runtime
pub mod device;

/// Parameter inventory visitor
pub mod params;

/// The training loop
pub mod trainer;

/// Evaluation-mode accuracy
pub mod evaluator;

/// Compute backend selected by cargo feature
#[cfg(feature = "wgpu")]
pub type ComputeBackend = burn::backend::Wgpu;

#[cfg(not(feature = "wgpu"))]
pub type ComputeBackend = burn::backend::NdArray;

/// Backend used for training (autodiff on top of the compute backend)
pub type TrainBackend = burn::backend::Autodiff<ComputeBackend>;

/// Device of the compute backend
pub type ComputeDevice = <ComputeBackend as burn::tensor::backend::Backend>::Device;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Mutex, MutexGuard};

    pub type TestBackend = burn::backend::NdArray;
    pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

    static BACKEND_RNG: Mutex<()> = Mutex::new(());

    /// The NdArray backend has one process-wide RNG. Tests that seed it
    /// or draw from it (parameter init, dropout) hold this lock so the
    /// test harness threads do not interleave their draws.
    pub fn backend_lock() -> MutexGuard<'static, ()> {
        BACKEND_RNG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
