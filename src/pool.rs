// ABOUTME: Bounded fan-out of per-table work within one phase
// ABOUTME: Runs at most N units concurrently and reports each outcome to the status grid

use crate::grid::{GridHandle, Status};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::future::Future;

/// Outcome counts for one phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub ok: usize,
    pub missing: usize,
    pub failed: usize,
    pub mismatched: usize,
}

impl PhaseSummary {
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Missing => self.missing += 1,
            Status::Failed => self.failed += 1,
            Status::Mismatch { .. } => self.mismatched += 1,
            Status::Pending | Status::Running => {}
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.missing + self.failed + self.mismatched
    }
}

impl Extend<Status> for PhaseSummary {
    fn extend<I: IntoIterator<Item = Status>>(&mut self, iter: I) {
        for status in iter {
            self.record(status);
        }
    }
}

impl FromIterator<Status> for PhaseSummary {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut summary = PhaseSummary::default();
        summary.extend(iter);
        summary
    }
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} OK", self.ok)?;
        if self.missing > 0 {
            write!(f, ", {} missing", self.missing)?;
        }
        if self.mismatched > 0 {
            write!(f, ", {} mismatched", self.mismatched)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Apply `unit` to every table with at most `workers` running at once
///
/// Each table shows `...` while its unit runs and the returned status once it
/// finishes. Units report failure through their status, so one table never
/// stops the others. Completion order is unspecified; the call returns after
/// every unit has finished.
pub async fn run_phase<'a, F, Fut>(
    tables: &'a [String],
    workers: usize,
    grid: &GridHandle,
    unit: F,
) -> PhaseSummary
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = Status> + 'a,
{
    let workers = workers.max(1);
    tracing::debug!(
        "Running phase over {} tables with {} workers",
        tables.len(),
        workers
    );

    stream::iter(tables)
        .map(|table| {
            let grid = grid.clone();
            let work = unit(table.as_str());
            async move {
                grid.set(table, Status::Running);
                let status = work.await;
                grid.set(table, status);
                status
            }
        })
        .buffer_unordered(workers)
        .collect::<PhaseSummary>()
        .await
}
