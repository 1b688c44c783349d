// ============================================================
// Layer 6 — Run Metrics
// ============================================================
// Counters collected while the training loop runs, rendered as
// a short plain-text report after the first epoch and at the
// end of training.
//
// Metrics recorded:
//   - Steps:           every step that ran forward + backward
//   - OptimizerSteps:  steps whose update was applied
//   - SkippedSteps:    steps dropped by the loss scaler (overflow)
//   - StepMarkers:     step boundaries handed to the device runtime
//   - DeviceSyncs:     blocking waits on the device
//   - Epochs:          completed epochs
//   - WarmupTime:      wall time spent in warmup steps
//   - EpochTime:       wall time of every completed epoch
//   - LossScale:       current loss scale (1 in full precision)
//
// Example report:
//   Metric: Steps
//     Value: 7500
//   Metric: OptimizerSteps
//     Value: 7500
//   ...
//   Metric: EpochTime
//     TotalSamples: 4
//     Accumulator: 12.402s
//     Values: [3.512s, 2.961s, 2.967s, 2.962s]
//
// How to read the report:
//   - SkippedSteps > 0 only with mixed precision, usually early
//     while the loss scale backs off from its initial value
//   - The first EpochTime is longer: kernels and buffers are
//     set up during the first steps
//
// Reference: Rust Book §8 (Common Collections)

use std::{fmt::Write, time::Duration};

/// Counters of one training run
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub steps:           usize,
    pub optimizer_steps: usize,
    pub skipped_steps:   usize,
    pub step_markers:    usize,
    pub device_syncs:    usize,
    pub epochs:          usize,
    pub warmup_time:     Duration,
    pub epoch_times:     Vec<Duration>,
    pub loss_scale:      f32,
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self {
            steps:           0,
            optimizer_steps: 0,
            skipped_steps:   0,
            step_markers:    0,
            device_syncs:    0,
            epochs:          0,
            warmup_time:     Duration::ZERO,
            epoch_times:     Vec::new(),
            loss_scale:      1.0,
        }
    }
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one step; `applied` is false when the optimizer was skipped.
    pub fn record_step(&mut self, applied: bool) {
        self.steps += 1;
        if applied {
            self.optimizer_steps += 1;
        } else {
            self.skipped_steps += 1;
        }
    }

    pub fn record_step_marker(&mut self) {
        self.step_markers += 1;
    }

    pub fn record_device_sync(&mut self) {
        self.device_syncs += 1;
    }

    pub fn record_warmup(&mut self, elapsed: Duration) {
        self.warmup_time += elapsed;
    }

    pub fn record_epoch(&mut self, elapsed: Duration) {
        self.epochs += 1;
        self.epoch_times.push(elapsed);
    }

    pub fn set_loss_scale(&mut self, scale: f32) {
        self.loss_scale = scale;
    }

    /// Total wall time of all completed epochs
    pub fn total_epoch_time(&self) -> Duration {
        self.epoch_times.iter().sum()
    }

    /// Multi-line report, one `Metric:` block per counter.
    pub fn short_report(&self) -> String {
        let mut out = String::new();

        let counters = [
            ("Steps",          self.steps),
            ("OptimizerSteps", self.optimizer_steps),
            ("SkippedSteps",   self.skipped_steps),
            ("StepMarkers",    self.step_markers),
            ("DeviceSyncs",    self.device_syncs),
            ("Epochs",         self.epochs),
        ];
        for (name, value) in counters {
            let _ = writeln!(out, "Metric: {name}");
            let _ = writeln!(out, "  Value: {value}");
        }

        let _ = writeln!(out, "Metric: WarmupTime");
        let _ = writeln!(out, "  Value: {:.3}s", self.warmup_time.as_secs_f64());

        let values: Vec<String> = self
            .epoch_times
            .iter()
            .map(|d| format!("{:.3}s", d.as_secs_f64()))
            .collect();
        let _ = writeln!(out, "Metric: EpochTime");
        let _ = writeln!(out, "  TotalSamples: {}", self.epoch_times.len());
        let _ = writeln!(out, "  Accumulator: {:.3}s", self.total_epoch_time().as_secs_f64());
        let _ = writeln!(out, "  Values: [{}]", values.join(", "));

        let _ = writeln!(out, "Metric: LossScale");
        let _ = write!(out, "  Value: {}", self.loss_scale);

        out
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_step_splits_applied_and_skipped() {
        let mut m = RunMetrics::new();
        m.record_step(true);
        m.record_step(false);
        m.record_step(true);

        assert_eq!(m.steps, 3);
        assert_eq!(m.optimizer_steps, 2);
        assert_eq!(m.skipped_steps, 1);
    }

    #[test]
    fn test_epoch_times_accumulate() {
        let mut m = RunMetrics::new();
        m.record_epoch(Duration::from_millis(1500));
        m.record_epoch(Duration::from_millis(500));

        assert_eq!(m.epochs, 2);
        assert_eq!(m.total_epoch_time(), Duration::from_secs(2));
    }

    #[test]
    fn test_short_report_lists_every_metric() {
        let mut m = RunMetrics::new();
        m.record_step(true);
        m.record_step_marker();
        m.record_device_sync();
        m.record_warmup(Duration::from_millis(250));
        m.record_epoch(Duration::from_secs(3));
        m.set_loss_scale(32768.0);

        let report = m.short_report();
        for name in [
            "Steps", "OptimizerSteps", "SkippedSteps", "StepMarkers",
            "DeviceSyncs", "Epochs", "WarmupTime", "EpochTime", "LossScale",
        ] {
            assert!(report.contains(&format!("Metric: {name}\n")), "missing {name}");
        }
        assert!(report.contains("  Value: 0.250s"));
        assert!(report.contains("  Accumulator: 3.000s"));
        assert!(report.contains("  Value: 32768"));
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn test_default_loss_scale_is_one() {
        assert_eq!(RunMetrics::default().loss_scale, 1.0);
    }
}
