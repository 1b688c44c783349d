// ============================================================
// Layer 5 — Precision Strategies
// ============================================================
// The standard and mixed-precision training loops only differ
// in what happens between the loss and the optimizer step, so
// the loop takes a PrecisionStrategy:
//
//   FullPrecision      loss ──backward──► grads ──► step
//
//   DynamicLossScaler  loss × S ──backward──► grads × S
//                      grads × 1/S ──finite?──► step   (else skip)
//                      update S: halve on overflow,
//                                double after N clean steps
//
// Scaling the loss keeps small gradients representable in
// reduced precision; unscaling restores their true magnitude
// before the optimizer sees them.
//
// Reference: Micikevicius et al. (2018) Mixed Precision Training

use burn::{
    module::{AutodiffModule, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// How the training loop scales the loss and screens gradients.
pub trait PrecisionStrategy<B: AutodiffBackend> {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Transform the loss before the backward pass.
    fn scale_loss(&self, loss: Tensor<B, 1>) -> Tensor<B, 1>;

    /// Undo the loss scaling on `grads`. Returns None when the
    /// optimizer step must be skipped for this batch.
    fn unscale<M: AutodiffModule<B>>(
        &mut self,
        model: &M,
        grads: GradientsParams,
    ) -> Option<GradientsParams>;

    /// Adjust internal state once the step is finished.
    fn update(&mut self);

    /// The factor the loss is currently multiplied by
    fn loss_scale(&self) -> f32;
}

// ─── FullPrecision ────────────────────────────────────────────────────────────
/// Identity strategy used by the standard training loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullPrecision;

impl<B: AutodiffBackend> PrecisionStrategy<B> for FullPrecision {
    fn name(&self) -> &'static str {
        "full-precision"
    }

    fn scale_loss(&self, loss: Tensor<B, 1>) -> Tensor<B, 1> {
        loss
    }

    fn unscale<M: AutodiffModule<B>>(
        &mut self,
        _model: &M,
        grads: GradientsParams,
    ) -> Option<GradientsParams> {
        Some(grads)
    }

    fn update(&mut self) {}

    fn loss_scale(&self) -> f32 {
        1.0
    }
}

// ─── DynamicLossScaler ────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct LossScaleConfig {
    pub initial_scale:   f32,
    pub growth_factor:   f32,
    pub backoff_factor:  f32,
    pub growth_interval: usize,
    pub min_scale:       f32,
    pub max_scale:       f32,
}

impl Default for LossScaleConfig {
    fn default() -> Self {
        Self {
            initial_scale:   2f32.powi(16),
            growth_factor:   2.0,
            backoff_factor:  0.5,
            growth_interval: 2000,
            min_scale:       1.0,
            max_scale:       2f32.powi(24),
        }
    }
}

impl LossScaleConfig {
    /// Replace out-of-range values with usable ones.
    fn sanitized(mut self) -> Self {
        if !(self.growth_factor >= 1.0) {
            self.growth_factor = 1.0;
        }
        if !(self.backoff_factor > 0.0 && self.backoff_factor < 1.0) {
            self.backoff_factor = 0.5;
        }
        if self.growth_interval == 0 {
            self.growth_interval = 1;
        }
        if !(self.min_scale > 0.0) {
            self.min_scale = 1.0;
        }
        if !(self.max_scale >= self.min_scale) {
            self.max_scale = self.min_scale;
        }
        self.initial_scale = if self.initial_scale.is_nan() {
            self.min_scale
        } else {
            self.initial_scale.clamp(self.min_scale, self.max_scale)
        };
        self
    }
}

/// Dynamic loss scaling for the mixed-precision training loop.
#[derive(Debug, Clone)]
pub struct DynamicLossScaler {
    config:         LossScaleConfig,
    scale:          f32,
    growth_tracker: usize,
    found_inf:      bool,
}

impl DynamicLossScaler {
    pub fn new(config: LossScaleConfig) -> Self {
        let config = config.sanitized();
        Self {
            scale: config.initial_scale,
            config,
            growth_tracker: 0,
            found_inf: false,
        }
    }

    /// Whether the last unscale found non-finite gradients
    pub fn found_inf(&self) -> bool {
        self.found_inf
    }

    /// Consecutive overflow-free steps since the last scale change
    pub fn growth_tracker(&self) -> usize {
        self.growth_tracker
    }
}

impl Default for DynamicLossScaler {
    fn default() -> Self {
        Self::new(LossScaleConfig::default())
    }
}

impl<B: AutodiffBackend> PrecisionStrategy<B> for DynamicLossScaler {
    fn name(&self) -> &'static str {
        "dynamic-loss-scaling"
    }

    fn scale_loss(&self, loss: Tensor<B, 1>) -> Tensor<B, 1> {
        loss.mul_scalar(self.scale)
    }

    fn unscale<M: AutodiffModule<B>>(
        &mut self,
        model: &M,
        mut grads: GradientsParams,
    ) -> Option<GradientsParams> {
        let mut visitor = GradientUnscaler {
            grads:     &mut grads,
            inv_scale: 1.0 / self.scale,
            found_inf: false,
        };
        model.visit(&mut visitor);
        self.found_inf = visitor.found_inf;

        if self.found_inf {
            tracing::debug!("Non-finite gradients at loss scale {}", self.scale);
            None
        } else {
            Some(grads)
        }
    }

    fn update(&mut self) {
        if self.found_inf {
            self.scale = (self.scale * self.config.backoff_factor).max(self.config.min_scale);
            self.growth_tracker = 0;
            self.found_inf = false;
            return;
        }

        self.growth_tracker += 1;
        if self.growth_tracker >= self.config.growth_interval {
            self.scale = (self.scale * self.config.growth_factor).min(self.config.max_scale);
            self.growth_tracker = 0;
        }
    }

    fn loss_scale(&self) -> f32 {
        self.scale
    }
}

/// Multiplies every gradient by 1/scale in place and records
/// whether any of them holds an inf or NaN.
struct GradientUnscaler<'a> {
    grads:     &'a mut GradientsParams,
    inv_scale: f32,
    found_inf: bool,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradientUnscaler<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) else {
            return;
        };

        let grad = grad.mul_scalar(self.inv_scale);
        let magnitude: f32 = grad.clone().abs().sum().into_scalar().elem();
        if !magnitude.is_finite() {
            self.found_inf = true;
        }

        self.grads.register::<B::InnerBackend, D>(id, grad);
    }
}
