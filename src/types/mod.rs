// ABOUTME: Core domain types shared across the crate.
// ABOUTME: Phantom-typed IDs and image reference parsing.

mod id;
mod image_ref;

pub use id::{ContainerId, ContainerMarker, Id, ImageId, ImageMarker};
pub use image_ref::{ImageRef, ParseImageRefError};
