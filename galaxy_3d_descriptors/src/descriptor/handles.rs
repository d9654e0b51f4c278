//! Opaque native handles
//!
//! Backends store their API objects as raw `u64` values (Vulkan non-dispatchable
//! handles are 64-bit). `0` is the null handle for every kind.

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            /// Null handle
            pub const NULL: Self = Self(0);

            /// Wrap a raw backend handle
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw backend handle
            pub const fn as_raw(&self) -> u64 {
                self.0
            }

            pub const fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

native_handle!(
    /// Native descriptor pool object (`VkDescriptorPool`)
    NativePool
);
native_handle!(
    /// Native descriptor set (`VkDescriptorSet`); identity of a live set
    NativeSet
);
native_handle!(
    /// Native descriptor set layout (`VkDescriptorSetLayout`)
    NativeSetLayout
);
native_handle!(
    /// Native pipeline layout (`VkPipelineLayout`)
    NativePipelineLayout
);
native_handle!(
    /// Native buffer (`VkBuffer`)
    NativeBuffer
);
native_handle!(
    /// Native image view (`VkImageView`)
    NativeImageView
);
native_handle!(
    /// Native sampler (`VkSampler`)
    NativeSampler
);
