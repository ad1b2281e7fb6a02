// ABOUTME: Trait definitions for the daemon collaborator boundary.
// ABOUTME: The orchestration core depends only on these seams.

mod container;
mod image;
mod shared_types;

pub use container::{ContainerError, ContainerOps};
pub use image::{ImageError, ImageOps};
pub use shared_types::{ContainerFilters, ContainerSnapshot, ContainerSummary, NewContainerSpec};
