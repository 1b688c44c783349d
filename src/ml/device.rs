use anyhow::Result;
use burn::tensor::backend::Backend;

use crate::domain::traits::DeviceRuntime;

/// DeviceRuntime for any Burn backend.
///
/// Burn backends queue device work on their own streams and flush
/// it whenever a value is read back, so a step boundary needs no
/// device call; it is recorded for the metrics report. Waiting for
/// the device maps to `Backend::sync`.
#[derive(Debug, Clone)]
pub struct BurnRuntime<B: Backend> {
    device:       B::Device,
    steps_marked: usize,
    syncs:        usize,
}

impl<B: Backend> BurnRuntime<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, steps_marked: 0, syncs: 0 }
    }

    /// Number of step boundaries seen so far
    pub fn steps_marked(&self) -> usize {
        self.steps_marked
    }

    /// Number of blocking waits issued so far
    pub fn syncs(&self) -> usize {
        self.syncs
    }
}

impl<B: Backend> DeviceRuntime for BurnRuntime<B> {
    fn describe(&self) -> String {
        format!("{:?}", self.device)
    }

    fn mark_step(&mut self) -> Result<()> {
        self.steps_marked += 1;
        tracing::trace!("Step boundary {}", self.steps_marked);
        Ok(())
    }

    fn wait_device_ops(&mut self) -> Result<()> {
        B::sync(&self.device);
        self.syncs += 1;
        tracing::debug!("Device {:?} synchronised", self.device);
        Ok(())
    }
}
