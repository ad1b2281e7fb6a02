// ABOUTME: Recurring pass timer for one endpoint.
// ABOUTME: Ticks firing mid-pass are skipped, never queued; shutdown waits for the pass.

use crate::report::{ReportEvent, ReportSink};
use crate::runtime::{ContainerOps, ImageOps};
use crate::update::Orchestrator;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Run recurring update passes against one endpoint until shutdown.
///
/// The first pass runs immediately. A pass that outlives the interval
/// causes the overlapping tick to be skipped rather than queued, so passes
/// against the same endpoint never overlap. Shutdown is observed only
/// between passes: an in-flight replace sequence always runs to
/// completion rather than being interrupted mid-sequence.
pub async fn run_endpoint<R, S>(
    runtime: &R,
    sink: &S,
    orchestrator: &mut Orchestrator,
    endpoint: &str,
    host: &str,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    R: ContainerOps + ImageOps,
    S: ReportSink,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!(endpoint, "scheduler stopping");
                return;
            }
        }

        let batch = orchestrator.run_pass(runtime, endpoint).await;

        if batch.aborted {
            continue;
        }

        tracing::debug!(
            endpoint,
            monitored = batch.monitored,
            updated = batch.updated.len(),
            failed = batch.failed.len(),
            "pass complete"
        );

        // Report policy lives here, not in the orchestrator: an update
        // event goes out only when something actually changed.
        if batch.has_updates() {
            let event = ReportEvent::update_completed(host, endpoint, orchestrator, &batch);
            sink.send(&event).await;
        }
    }
}
