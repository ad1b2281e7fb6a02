// ABOUTME: Daemon collaborator boundary: traits plus the bollard implementation.
// ABOUTME: The orchestration core only ever sees the traits.

mod bollard;
pub mod traits;

pub use bollard::BollardRuntime;
pub use traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSnapshot, ContainerSummary,
    ImageError, ImageOps, NewContainerSpec,
};
