// ABOUTME: Bollard-based implementation of the daemon collaborator traits.
// ABOUTME: Connects to a Docker-compatible endpoint over unix socket or TCP.

use crate::runtime::traits::{
    ContainerError, ContainerFilters, ContainerOps, ContainerSnapshot, ContainerSummary,
    ImageError, ImageOps, NewContainerSpec,
};
use crate::types::{ContainerId, ImageId, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_image_pull_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    ImageError::PullFailed(format!("{}: {}", image_name, e))
}

fn map_image_inspect_error(e: bollard::errors::Error, image_name: &str) -> ImageError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { status_code, .. }
            if *status_code == 404 =>
        {
            ImageError::NotFound(image_name.to_string())
        }
        _ => ImageError::Runtime(format!("failed to inspect {}: {}", image_name, e)),
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::ImageNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ContainerError::AlreadyExists(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::AlreadyRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 304 => ContainerError::NotRunning(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

/// Errors from a list call that never reached the daemon's API handler are
/// connectivity failures; anything the daemon answered is a runtime error.
fn map_list_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError { .. } => {
            ContainerError::Runtime(e.to_string())
        }
        _ => ContainerError::Connection(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Daemon collaborator implementation using bollard.
///
/// Talks to any Docker-compatible endpoint (Docker or Podman) over a unix
/// socket path or a `tcp://`/`http://` address.
pub struct BollardRuntime {
    client: Docker,
}

impl BollardRuntime {
    /// Create a new BollardRuntime from a Docker client.
    pub fn new(client: Docker) -> Self {
        Self { client }
    }

    /// Connect to the daemon at the given endpoint address.
    ///
    /// `tcp://` and `http://` addresses go over TCP; everything else is
    /// treated as a unix socket path (with an optional `unix://` prefix).
    /// Connection setup is lazy; failures surface on the first call.
    pub fn connect(endpoint: &str) -> Result<Self, ContainerError> {
        let client = if endpoint.starts_with("tcp://") || endpoint.starts_with("http://") {
            Docker::connect_with_http(endpoint, CLIENT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        } else {
            let path = endpoint.strip_prefix("unix://").unwrap_or(endpoint);
            Docker::connect_with_unix(path, CLIENT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| ContainerError::Connection(e.to_string()))?;

        Ok(Self::new(client))
    }

    /// Verify the daemon answers at all.
    pub async fn ping(&self) -> Result<(), ContainerError> {
        self.client
            .ping()
            .await
            .map_err(|e| ContainerError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn list_running(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut filter_map: HashMap<String, Vec<String>> = HashMap::new();
        filter_map.insert("status".to_string(), vec!["running".to_string()]);

        if let Some(ref name) = filters.name {
            filter_map.insert("name".to_string(), vec![name.clone()]);
        }

        let opts = ListContainersOptions {
            all: false,
            filters: Some(filter_map),
            ..Default::default()
        };

        let containers = self
            .client
            .list_containers(Some(opts))
            .await
            .map_err(map_list_error)?;

        Ok(containers
            .into_iter()
            .map(|c| {
                let id = c.id.unwrap_or_default();
                let names = c.names.unwrap_or_default();
                let name = names
                    .first()
                    .map(|n| strip_name(n).to_string())
                    .unwrap_or_default();

                ContainerSummary {
                    id: ContainerId::new(id),
                    name,
                    image: c.image.unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn inspect_container(
        &self,
        id: &ContainerId,
    ) -> Result<ContainerSnapshot, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let config = details.config.unwrap_or_default();

        Ok(ContainerSnapshot {
            id: ContainerId::new(details.id.unwrap_or_else(|| id.to_string())),
            name: strip_name(&details.name.unwrap_or_default()).to_string(),
            image_ref: config.image.unwrap_or_default(),
            image_id: ImageId::new(details.image.unwrap_or_default()),
            command: config.cmd,
            entrypoint: config.entrypoint,
            host_config: details.host_config.unwrap_or_default(),
            labels: config.labels.unwrap_or_default(),
        })
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(stop_grace_secs(timeout)),
            signal: None,
        };

        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };

        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)?;

        Ok(())
    }

    async fn create_container(
        &self,
        spec: &NewContainerSpec,
    ) -> Result<ContainerId, ContainerError> {
        // The host configuration blob is passed through verbatim. Attach
        // flags are the inverse of detach: the replacement must come up
        // non-blocking.
        let body = ContainerCreateBody {
            image: Some(spec.image.to_string()),
            cmd: spec.command.clone(),
            entrypoint: spec.entrypoint.clone(),
            labels: if spec.labels.is_empty() {
                None
            } else {
                Some(spec.labels.clone())
            },
            host_config: Some(spec.host_config.clone()),
            attach_stdin: Some(!spec.detach),
            attach_stdout: Some(!spec.detach),
            attach_stderr: Some(!spec.detach),
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(spec.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(id.as_str(), None::<StartContainerOptions>)
            .await
            .map_err(map_container_start_error)
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let image_name = reference.to_string();

        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Pull returns a stream of progress updates - consume it
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            result.map_err(|e| map_image_pull_error(e, &image_name))?;
        }

        Ok(())
    }

    async fn resolve_digest(&self, reference: &ImageRef) -> Result<ImageId, ImageError> {
        let image_name = reference.to_string();

        let details = self
            .client
            .inspect_image(&image_name)
            .await
            .map_err(|e| map_image_inspect_error(e, &image_name))?;

        match details.id {
            Some(id) => Ok(ImageId::new(id)),
            None => Err(ImageError::Runtime(format!(
                "inspect of {} returned no image id",
                image_name
            ))),
        }
    }
}

/// Strip the single leading `/` the daemon prepends to container names.
fn strip_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

/// The daemon takes the stop grace period as an i32 of seconds; clamp
/// rather than truncate oversized configured durations.
fn stop_grace_secs(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_secs()).unwrap_or(i32::MAX)
}
