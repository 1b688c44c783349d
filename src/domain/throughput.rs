// ============================================================
// Layer 3 — Throughput Accounting
// ============================================================
// The first few steps of a run pay one-time costs (kernel
// compilation, allocator warm-up). The training loop resets a
// StepTimer on each of those warmup steps, so at the end the
// timer only covers the steady-state steps of the final epoch:
//
//   throughput = (last_step_index − warmup_steps) / elapsed_secs
//
// When the final epoch is too short the numerator is zero or
// negative, and a zero elapsed time makes the ratio undefined.
// Both cases come back as Throughput::Degenerate so the caller
// reports them instead of printing a meaningless number.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::fmt;
use std::time::{Duration, Instant};

/// Wall-clock timer that the training loop restarts during warmup.
#[derive(Debug, Clone)]
pub struct StepTimer {
    started: Instant,
}

impl StepTimer {
    /// Start a new timer now
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }

    /// Restart the measurement window from now
    pub fn reset(&mut self) {
        self.started = Instant::now();
    }

    /// Time elapsed since the last start/reset
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for StepTimer {
    fn default() -> Self {
        Self::start()
    }
}

/// Training throughput over the final epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Throughput {
    /// A well-defined iterations-per-second figure
    Measured { iters_per_sec: f64 },

    /// The measurement window was empty or negative.
    /// `interval` is `last_step_index − warmup_steps` as computed.
    Degenerate { interval: i64, elapsed: Duration },
}

impl Throughput {
    /// Compute throughput from the last step index of the final epoch.
    pub fn measure(last_step_index: usize, warmup_steps: usize, elapsed: Duration) -> Self {
        let interval = last_step_index as i64 - warmup_steps as i64;
        let secs     = elapsed.as_secs_f64();

        if interval <= 0 || secs <= 0.0 {
            return Throughput::Degenerate { interval, elapsed };
        }

        Throughput::Measured { iters_per_sec: interval as f64 / secs }
    }

    /// True when no meaningful figure could be computed
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Throughput::Degenerate { .. })
    }

    /// The iterations/second value, if one exists
    pub fn iters_per_sec(&self) -> Option<f64> {
        match self {
            Throughput::Measured { iters_per_sec } => Some(*iters_per_sec),
            Throughput::Degenerate { .. } => None,
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throughput::Measured { iters_per_sec } => write!(f, "{iters_per_sec}"),
            Throughput::Degenerate { interval, elapsed } if *interval <= 0 => write!(
                f,
                "unavailable (measured interval of {interval} steps over {:.3}s; \
                 the final epoch is not longer than the warmup)",
                elapsed.as_secs_f64()
            ),
            Throughput::Degenerate { interval, .. } => write!(
                f,
                "unavailable ({interval} steps measured but no time elapsed)"
            ),
        }
    }
}
