// ABOUTME: Drives one pass: discover candidates, evaluate each, aggregate.
// ABOUTME: Owns the per-endpoint monitored/total-updated counters.

use super::error::UpdateError;
use super::inventory;
use super::outcome::{BatchResult, UpdateOutcome, Updated};
use super::replace::replace;
use super::staleness::{is_stale, resolve_latest};
use crate::runtime::{ContainerOps, ContainerSnapshot, ImageOps};
use crate::types::{ImageId, ImageRef};
use futures::StreamExt;
use futures::stream;
use std::collections::HashMap;
use std::time::Duration;

/// Tunables for a pass, materialized from configuration before the core
/// runs.
#[derive(Debug, Clone)]
pub struct PassSettings {
    /// Only consider running containers whose name matches.
    pub name_filter: Option<String>,
    /// Bound on every individual daemon call.
    pub api_timeout: Duration,
    /// Grace period handed to the daemon when stopping a container.
    pub stop_timeout: Duration,
    /// Bound on image pulls, which are slower than other daemon calls.
    pub pull_timeout: Duration,
    /// How many containers may be evaluated concurrently within a pass.
    /// The replace sequence for a single container is always sequential.
    pub concurrency: usize,
    /// Pull the latest image before resolving its digest.
    pub pull: bool,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            name_filter: None,
            api_timeout: Duration::from_secs(60),
            stop_timeout: Duration::from_secs(30),
            pull_timeout: Duration::from_secs(300),
            concurrency: 1,
            pull: true,
        }
    }
}

/// A container found stale by a detection-only pass.
#[derive(Debug, Clone)]
pub struct StaleContainer {
    pub name: String,
    pub current: ImageId,
    pub latest: ImageId,
}

/// Drives update passes against one or more endpoints and owns the
/// reporting counters.
///
/// Counters are keyed by endpoint and scoped to this instance; a fresh
/// orchestrator starts from zero. They are advanced only by a completed
/// pass, never by an aborted one, and are read-only to the reporting side.
pub struct Orchestrator {
    settings: PassSettings,
    monitored: HashMap<String, usize>,
    total_updated: HashMap<String, u64>,
}

impl Orchestrator {
    pub fn new(settings: PassSettings) -> Self {
        Self {
            settings,
            monitored: HashMap::new(),
            total_updated: HashMap::new(),
        }
    }

    /// Monitored-container count from the endpoint's last completed pass.
    pub fn monitored(&self, endpoint: &str) -> usize {
        self.monitored.get(endpoint).copied().unwrap_or(0)
    }

    /// Cumulative successful updates on the endpoint since this
    /// orchestrator was created.
    pub fn total_updated(&self, endpoint: &str) -> u64 {
        self.total_updated.get(endpoint).copied().unwrap_or(0)
    }

    /// Run one complete discover-evaluate-aggregate pass.
    ///
    /// Candidates are evaluated independently: one container's failure
    /// never aborts the rest of the pass. If the daemon is unreachable the
    /// pass is aborted, logged at error severity, and the counters are left
    /// untouched.
    pub async fn run_pass<R>(&mut self, runtime: &R, endpoint: &str) -> BatchResult
    where
        R: ContainerOps + ImageOps,
    {
        let inventory = match inventory::list_candidates(
            runtime,
            endpoint,
            self.settings.name_filter.as_deref(),
            self.settings.api_timeout,
        )
        .await
        {
            Ok(inventory) => inventory,
            Err(error) => {
                tracing::error!(endpoint, %error, "pass aborted");
                return BatchResult::aborted();
            }
        };

        let monitored = inventory.monitored;

        let evaluations: Vec<_> = inventory
            .snapshots
            .iter()
            .map(|snapshot| self.evaluate(runtime, snapshot))
            .collect();
        let outcomes: Vec<UpdateOutcome> = stream::iter(evaluations)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let batch = BatchResult::collect(monitored, inventory.failed, outcomes);

        self.monitored.insert(endpoint.to_string(), monitored);
        *self.total_updated.entry(endpoint.to_string()).or_default() +=
            batch.updated.len() as u64;

        batch
    }

    /// Detection-only pass: report which containers are stale without
    /// touching them. Used for status inspection; counters are not
    /// advanced.
    pub async fn detect_pass<R>(
        &self,
        runtime: &R,
        endpoint: &str,
    ) -> Result<(usize, Vec<StaleContainer>), UpdateError>
    where
        R: ContainerOps + ImageOps,
    {
        let inventory = inventory::list_candidates(
            runtime,
            endpoint,
            self.settings.name_filter.as_deref(),
            self.settings.api_timeout,
        )
        .await?;

        let mut stale = Vec::new();
        for snapshot in &inventory.snapshots {
            if let Some((_, latest)) = self.latest_for(runtime, snapshot).await
                && is_stale(snapshot, &latest)
            {
                stale.push(StaleContainer {
                    name: snapshot.name.clone(),
                    current: snapshot.image_id.clone(),
                    latest,
                });
            }
        }

        Ok((inventory.monitored, stale))
    }

    /// Evaluate one candidate: resolve the latest image, judge staleness,
    /// and replace if stale.
    async fn evaluate<R>(&self, runtime: &R, snapshot: &ContainerSnapshot) -> UpdateOutcome
    where
        R: ContainerOps + ImageOps,
    {
        let Some((reference, latest)) = self.latest_for(runtime, snapshot).await else {
            return UpdateOutcome::Skipped;
        };

        if !is_stale(snapshot, &latest) {
            return UpdateOutcome::Skipped;
        }

        tracing::info!(
            container = %snapshot.name,
            current = %snapshot.image_id.short(),
            latest = %latest.short(),
            "container is stale"
        );

        // Pin the replacement to the resolved digest so the recorded
        // outcome names exactly what was started.
        let pinned = reference.with_digest(latest.as_str());

        match replace(
            runtime,
            snapshot,
            pinned,
            self.settings.stop_timeout,
            self.settings.api_timeout,
        )
        .await
        {
            Ok(new_container) => UpdateOutcome::Updated(Updated {
                name: snapshot.name.clone(),
                old_image: snapshot.image_id.clone(),
                new_image: latest,
                new_container,
            }),
            Err(failed) => {
                tracing::warn!(
                    container = %failed.name,
                    stage = %failed.stage,
                    error = %failed.error,
                    "replacement failed"
                );
                UpdateOutcome::Failed(failed)
            }
        }
    }

    /// Resolve the latest digest for a snapshot's repository. Returns the
    /// digest-free reference alongside the digest; `None` means the
    /// container must be treated as fresh.
    async fn latest_for<R>(
        &self,
        runtime: &R,
        snapshot: &ContainerSnapshot,
    ) -> Option<(ImageRef, ImageId)>
    where
        R: ImageOps,
    {
        let reference = match ImageRef::parse(&snapshot.image_ref) {
            Ok(parsed) => parsed.without_digest(),
            Err(error) => {
                tracing::debug!(
                    container = %snapshot.name,
                    image = %snapshot.image_ref,
                    %error,
                    "unparseable image reference, treating as fresh"
                );
                return None;
            }
        };

        match resolve_latest(
            runtime,
            &reference,
            self.settings.pull,
            self.settings.pull_timeout,
            self.settings.api_timeout,
        )
        .await
        {
            Ok(latest) => Some((reference, latest)),
            Err(error) => {
                tracing::debug!(container = %snapshot.name, %error, "treating as fresh");
                None
            }
        }
    }
}
