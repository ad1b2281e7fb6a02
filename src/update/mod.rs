// ABOUTME: The update orchestration core: discover, judge, replace, aggregate.
// ABOUTME: Exports the orchestrator, outcomes, and the error taxonomy.

mod error;
mod inventory;
mod orchestrator;
mod outcome;
mod replace;
mod staleness;

pub use error::{ReplaceStage, UpdateError, UpdateErrorKind};
pub use inventory::{Inventory, list_candidates};
pub use orchestrator::{Orchestrator, PassSettings, StaleContainer};
pub use outcome::{BatchResult, ReplaceFailed, UpdateOutcome, Updated};
pub use replace::replace;
pub use staleness::{is_stale, resolve_latest};
