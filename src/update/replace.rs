// ABOUTME: The stop -> remove -> create -> start replace sequence.
// ABOUTME: Each step gates on the previous; failures carry their stage.

use super::error::ReplaceStage;
use super::inventory::bounded;
use super::outcome::ReplaceFailed;
use crate::runtime::{ContainerOps, ContainerSnapshot, NewContainerSpec};
use crate::types::{ContainerId, ImageRef};
use std::time::Duration;

/// Replace a stale container with a new one running `image`.
///
/// The sequence runs strictly in order for one container and must not be
/// interleaved with itself:
///
/// 1. Stop. Failure aborts: the old container is never destroyed while it
///    is still the only instance of its service.
/// 2. Remove. Failure is logged but does not prevent creating the
///    replacement; an orphaned stopped container is recoverable, a missing
///    service is not.
/// 3. Create a fresh container from the snapshot, changing only the image.
/// 4. Start it. On failure the created container is left in place so an
///    operator can inspect why startup failed.
///
/// There is no rollback to the old container once step 2 has run; a failed
/// create or start leaves the service down until the operator intervenes.
/// That trade-off is inherited from the system this replaces and is
/// surfaced through the stage-tagged failure rather than papered over.
pub async fn replace<R: ContainerOps>(
    runtime: &R,
    snapshot: &ContainerSnapshot,
    image: ImageRef,
    stop_timeout: Duration,
    api_timeout: Duration,
) -> Result<ContainerId, ReplaceFailed> {
    let fail = |stage: ReplaceStage| {
        let name = snapshot.name.clone();
        move |error| ReplaceFailed { name, stage, error }
    };

    tracing::debug!(container = %snapshot.name, "stopping container");
    // The daemon may legitimately take the whole grace period to stop, so
    // the call bound is the grace period plus the API allowance.
    bounded(
        stop_timeout + api_timeout,
        runtime.stop_container(&snapshot.id, stop_timeout),
    )
    .await
    .map_err(fail(ReplaceStage::Stop))?;

    tracing::debug!(container = %snapshot.name, "removing container");
    if let Err(error) = bounded(api_timeout, runtime.remove_container(&snapshot.id)).await {
        // Availability over cleanliness: still attempt the replacement.
        tracing::warn!(container = %snapshot.name, %error, "remove failed, attempting replacement anyway");
    }

    let spec = NewContainerSpec::from_snapshot(snapshot, image);

    tracing::debug!(container = %spec.name, image = %spec.image, "creating replacement container");
    let new_id = bounded(api_timeout, runtime.create_container(&spec))
        .await
        .map_err(fail(ReplaceStage::Create))?;

    tracing::debug!(container = %new_id, "starting replacement container");
    bounded(api_timeout, runtime.start_container(&new_id))
        .await
        .map_err(fail(ReplaceStage::Start))?;

    Ok(new_id)
}
