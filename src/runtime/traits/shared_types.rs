// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerSnapshot, NewContainerSpec, ContainerSummary, ContainerFilters.

use crate::types::{ContainerId, ImageId, ImageRef};
use bollard::models::HostConfig;
use std::collections::HashMap;

/// Immutable capture of a container's identity and runtime configuration,
/// taken from a single inspect call.
///
/// A snapshot is never mutated after construction. Replacing a container
/// builds a fresh [`NewContainerSpec`] from the snapshot rather than
/// patching it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    /// Daemon-assigned container identifier.
    pub id: ContainerId,
    /// Human-readable name with the daemon's single leading `/` stripped.
    pub name: String,
    /// Image reference the container was started from (repository, tag,
    /// possibly a digest pin).
    pub image_ref: String,
    /// Content-addressed identifier of the running image.
    pub image_id: ImageId,
    /// Process command line, if the container overrides the image CMD.
    pub command: Option<Vec<String>>,
    /// Entrypoint override, if any.
    pub entrypoint: Option<Vec<String>>,
    /// Host configuration blob (volumes, network mode, restart policy,
    /// resource limits, port bindings). Copied verbatim, never interpreted.
    pub host_config: HostConfig,
    /// Container labels, copied verbatim.
    pub labels: HashMap<String, String>,
}

/// Specification for the replacement container.
///
/// Every field except `image` is carried over from the source snapshot
/// unchanged. This is the configuration-fidelity contract: a user's custom
/// flags, volumes, and labels must survive an update byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContainerSpec {
    pub name: String,
    pub image: ImageRef,
    pub command: Option<Vec<String>>,
    pub entrypoint: Option<Vec<String>>,
    pub host_config: HostConfig,
    pub labels: HashMap<String, String>,
    /// Always true: the replacement must start non-blocking.
    pub detach: bool,
}

impl NewContainerSpec {
    /// Build a replacement spec from a snapshot, changing only the image.
    pub fn from_snapshot(snapshot: &ContainerSnapshot, image: ImageRef) -> Self {
        Self {
            name: snapshot.name.clone(),
            image,
            command: snapshot.command.clone(),
            entrypoint: snapshot.entrypoint.clone(),
            host_config: snapshot.host_config.clone(),
            labels: snapshot.labels.clone(),
            detach: true,
        }
    }
}

/// Summary information returned by a list call. A list call alone does not
/// carry full configuration; candidates are inspected individually.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
}

/// Filters for listing running containers.
#[derive(Debug, Clone, Default)]
pub struct ContainerFilters {
    /// Filter by name (daemon-side partial match).
    pub name: Option<String>,
}
