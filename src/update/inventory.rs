// ABOUTME: Candidate discovery: list running containers and inspect each one.
// ABOUTME: A list failure aborts the pass; a single inspect failure does not.

use super::error::{ReplaceStage, UpdateError};
use super::outcome::ReplaceFailed;
use crate::runtime::{ContainerError, ContainerFilters, ContainerOps, ContainerSnapshot};
use std::time::Duration;

/// The candidates of one pass: full snapshots plus per-container inspect
/// failures. `monitored` counts everything the list call returned,
/// including containers whose inspect failed.
#[derive(Debug, Default)]
pub struct Inventory {
    pub monitored: usize,
    pub snapshots: Vec<ContainerSnapshot>,
    pub failed: Vec<ReplaceFailed>,
}

/// Query the daemon for the containers to consider this pass.
///
/// A list call alone does not carry full configuration, so each candidate
/// is inspected individually. If the daemon is unreachable the whole pass
/// fails with [`UpdateError::Connectivity`]; an individual inspect failure
/// is recorded against that container only.
pub async fn list_candidates<R: ContainerOps>(
    runtime: &R,
    endpoint: &str,
    name_filter: Option<&str>,
    api_timeout: Duration,
) -> Result<Inventory, UpdateError> {
    let filters = ContainerFilters {
        name: name_filter.map(str::to_string),
    };

    let summaries = bounded(api_timeout, runtime.list_running(&filters))
        .await
        .map_err(|source| UpdateError::Connectivity {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let mut inventory = Inventory {
        monitored: summaries.len(),
        ..Default::default()
    };

    for summary in summaries {
        match bounded(api_timeout, runtime.inspect_container(&summary.id)).await {
            Ok(snapshot) => inventory.snapshots.push(snapshot),
            Err(error) => {
                tracing::debug!(container = %summary.name, %error, "inspect failed");
                inventory.failed.push(ReplaceFailed {
                    name: summary.name,
                    stage: ReplaceStage::Inspect,
                    error,
                });
            }
        }
    }

    tracing::info!(
        endpoint,
        matched = inventory.monitored,
        "running container(s) matched filter"
    );

    Ok(inventory)
}

/// Wrap a daemon call in a bounded timeout. An elapsed timeout is treated
/// identically to an API failure.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ContainerError>>,
) -> Result<T, ContainerError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ContainerError::Timeout(limit)),
    }
}
