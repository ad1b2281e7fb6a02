// ABOUTME: Per-container outcomes and the aggregated per-pass batch result.
// ABOUTME: A BatchResult is created fresh each pass and discarded after reporting.

use super::error::{ReplaceStage, UpdateError};
use crate::runtime::ContainerError;
use crate::types::{ContainerId, ImageId};

/// A successfully replaced container.
#[derive(Debug, Clone)]
pub struct Updated {
    pub name: String,
    pub old_image: ImageId,
    pub new_image: ImageId,
    pub new_container: ContainerId,
}

/// A container whose replacement failed at a specific stage.
#[derive(Debug)]
pub struct ReplaceFailed {
    pub name: String,
    pub stage: ReplaceStage,
    pub error: ContainerError,
}

impl From<ReplaceFailed> for UpdateError {
    fn from(failed: ReplaceFailed) -> Self {
        UpdateError::Replace {
            name: failed.name,
            stage: failed.stage,
            source: failed.error,
        }
    }
}

/// Outcome of evaluating a single candidate container.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Not stale; contributes only to the monitored count.
    Skipped,
    Updated(Updated),
    Failed(ReplaceFailed),
}

/// Aggregated result of one pass.
///
/// Invariant: `updated.len() + failed.len() <= monitored`; every monitored
/// container in neither list was judged non-stale.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of containers considered this pass.
    pub monitored: usize,
    /// Successful replacements, in candidate order.
    pub updated: Vec<Updated>,
    /// Failed replacements, in candidate order.
    pub failed: Vec<ReplaceFailed>,
    /// True when discovery failed and the pass never ran.
    pub aborted: bool,
}

impl BatchResult {
    /// An empty result for a pass that could not reach the daemon.
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Default::default()
        }
    }

    /// Fold per-container outcomes into a batch, appending to any failures
    /// already recorded during discovery.
    pub fn collect(
        monitored: usize,
        discovery_failures: Vec<ReplaceFailed>,
        outcomes: Vec<UpdateOutcome>,
    ) -> Self {
        let mut batch = BatchResult {
            monitored,
            updated: Vec::new(),
            failed: discovery_failures,
            aborted: false,
        };

        for outcome in outcomes {
            match outcome {
                UpdateOutcome::Skipped => {}
                UpdateOutcome::Updated(u) => batch.updated.push(u),
                UpdateOutcome::Failed(f) => batch.failed.push(f),
            }
        }

        batch
    }

    /// True when at least one container was replaced this pass.
    pub fn has_updates(&self) -> bool {
        !self.updated.is_empty()
    }
}
