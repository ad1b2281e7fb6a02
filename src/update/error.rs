// ABOUTME: Error taxonomy for the update core with SNAFU pattern.
// ABOUTME: Connectivity, resolution, and stage-tagged replace failures.

use crate::runtime::{ContainerError, ImageError};
use serde::Serialize;
use snafu::Snafu;
use std::fmt;

/// The step of the replace sequence a failure belongs to.
///
/// Carrying the stage lets callers distinguish "never attempted" from
/// "attempted and failed at stage X".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceStage {
    Inspect,
    Stop,
    Remove,
    Create,
    Start,
}

impl fmt::Display for ReplaceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReplaceStage::Inspect => "inspect",
            ReplaceStage::Stop => "stop",
            ReplaceStage::Remove => "remove",
            ReplaceStage::Create => "create",
            ReplaceStage::Start => "start",
        };
        f.write_str(s)
    }
}

/// Unified error for update passes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum UpdateError {
    /// The daemon could not be reached at all. Fatal to the current pass
    /// only; the process retries on the next tick.
    #[snafu(display("cannot reach daemon at {endpoint}: {source}"))]
    Connectivity {
        endpoint: String,
        source: ContainerError,
    },

    /// The latest image identity could not be determined. Never escalated:
    /// the container is treated as fresh.
    #[snafu(display("could not resolve latest image for {image}: {source}"))]
    Resolution { image: String, source: ImageError },

    /// One step of the replace sequence failed.
    #[snafu(display("{stage} failed for container {name}: {source}"))]
    Replace {
        name: String,
        stage: ReplaceStage,
        source: ContainerError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateErrorKind {
    Connectivity,
    Resolution,
    Replace(ReplaceStage),
}

impl UpdateError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> UpdateErrorKind {
        match self {
            UpdateError::Connectivity { .. } => UpdateErrorKind::Connectivity,
            UpdateError::Resolution { .. } => UpdateErrorKind::Resolution,
            UpdateError::Replace { stage, .. } => UpdateErrorKind::Replace(*stage),
        }
    }
}
