//! Configuration for descriptor pooling
//!
//! Growth policy of the growing pool and the fixed number of stashed-set slots.

use crate::error::{Error, Result};

/// Number of shader-visible descriptor set slots tracked by the set manager
pub const MAX_DESCRIPTOR_SET_COUNT: usize = 4;

/// Highest binding index (exclusive) a layout may use
pub const MAX_DESCRIPTOR_BINDINGS: u8 = 64;

/// Pool growth configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptorPoolConfig {
    /// Capacity (in sets) of the first sub-pool created for a new shape
    pub initial_set_count: u32,
    /// Multiplier applied to the largest same-shape capacity when growing
    pub growth_factor: f32,
}

impl DescriptorPoolConfig {
    /// Reject configurations that would never grow
    pub fn validate(&self) -> Result<()> {
        if self.initial_set_count == 0 {
            return Err(Error::InitializationFailed(
                "initial_set_count must be at least 1".to_string(),
            ));
        }
        if !(self.growth_factor > 1.0) {
            return Err(Error::InitializationFailed(format!(
                "growth_factor must be > 1.0 (got {})",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// Capacity of the next sub-pool grown from one of `previous` sets
    pub fn grown_capacity(&self, previous: u32) -> u32 {
        let grown = (previous as f64 * self.growth_factor as f64).ceil();
        if grown >= u32::MAX as f64 {
            u32::MAX
        } else {
            (grown as u32).max(previous.saturating_add(1))
        }
    }
}

impl Default for DescriptorPoolConfig {
    fn default() -> Self {
        Self {
            initial_set_count: 10,
            growth_factor: 1.5,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
