// ABOUTME: Command implementations for dump and load runs
// ABOUTME: Exports the two actions plus the shared option types

pub mod dump;
pub mod load;
pub mod options;

pub use dump::dump;
pub use load::{load, LoadReport};
pub use options::{Action, Options, RunOptions};

use crate::pool::PhaseSummary;
use indicatif::HumanDuration;
use std::time::Duration;

/// Last banner of a run
fn finish_banner(
    action: &str,
    summary: PhaseSummary,
    elapsed: Duration,
    wait_for_key: bool,
) -> String {
    let prompt = if wait_for_key { ", press any key" } else { "" };
    format!(
        "{} finished: {} in {}{}",
        action,
        summary,
        HumanDuration(elapsed),
        prompt
    )
}
