//! Resource count ("shape") of a descriptor set layout

use std::ops::Mul;
use crate::descriptor::layout::LayoutMask;

/// Number of descriptors of each kind a layout requires
///
/// Two layouts with equal counts can share a sub-pool, whatever their binding
/// indices. Multiplying by a capacity gives the totals a pool must provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceCount {
    pub buffer: u32,
    pub dynamic_buffer: u32,
    pub sampler: u32,
    pub input_attachment: u32,
}

impl ResourceCount {
    pub const fn new(buffer: u32, dynamic_buffer: u32, sampler: u32, input_attachment: u32) -> Self {
        Self { buffer, dynamic_buffer, sampler, input_attachment }
    }

    /// Count the occupied bindings of each kind
    pub fn from_layout_mask(mask: &LayoutMask) -> Self {
        Self {
            buffer: mask.buffer.count_ones(),
            dynamic_buffer: mask.dynamic_buffer.count_ones(),
            sampler: mask.sampler.count_ones(),
            input_attachment: mask.input_attachment.count_ones(),
        }
    }

    /// Total number of descriptors over all kinds
    pub fn total(&self) -> u32 {
        self.buffer + self.dynamic_buffer + self.sampler + self.input_attachment
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl Mul<u32> for ResourceCount {
    type Output = ResourceCount;

    /// # Panics
    ///
    /// If any total overflows `u32` (pool growth has no valid size left).
    fn mul(self, capacity: u32) -> ResourceCount {
        let scale = |per_set: u32| match per_set.checked_mul(capacity) {
            Some(total) => total,
            None => crate::engine_fatal!("galaxy3d::descriptors",
                "Descriptor pool totals overflow: {:?} x {} sets", self, capacity),
        };
        ResourceCount {
            buffer: scale(self.buffer),
            dynamic_buffer: scale(self.dynamic_buffer),
            sampler: scale(self.sampler),
            input_attachment: scale(self.input_attachment),
        }
    }
}

#[cfg(test)]
#[path = "resource_count_tests.rs"]
mod tests;
