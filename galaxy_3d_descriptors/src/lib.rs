/*!
# Galaxy 3D Descriptors

Descriptor set pooling and lazy binding for the Galaxy 3D rendering engine.

This crate is platform-agnostic: it drives a graphics backend through the
`DescriptorDevice` and `CommandStream` traits. The Vulkan implementation lives
in `galaxy_3d_descriptors_vulkan`.

## Architecture

- **DescriptorSetManager**: creates, writes, stages and commits descriptor sets
- **GrowingPool**: shape-partitioned set allocator that never runs dry
- **SubPool**: fixed-capacity native pool with per-layout free-lists
- **BindingHistory**: per-set record of writes, offsets and bind state
- **DescriptorSet**: caller-facing wrapper, recycled when its last reference drops
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod descriptor;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Set manager entry point
    pub use crate::descriptor::DescriptorSetManager;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Configuration sub-module
    pub mod config {
        pub use crate::config::*;
    }

    // Descriptor sub-module with all descriptor types
    pub mod descriptor {
        pub use crate::descriptor::*;
    }
}
