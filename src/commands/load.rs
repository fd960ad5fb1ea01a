// ABOUTME: Load command implementation - restore a backup directory in phases
// ABOUTME: Loads schemas, then data, then deferred constraints, and verifies checksums

use super::finish_banner;
use super::options::RunOptions;
use crate::backup::{
    live_checksum, tables_in_backup_dir, ArtifactKind, BackupDir, ChecksumRecord, LOAD_PHASES,
};
use crate::grid::{Status, StatusGrid, Surface};
use crate::mysql::DatabaseClient;
use crate::pool::{run_phase, PhaseSummary};
use anyhow::{bail, Result};
use indicatif::HumanDuration;
use std::time::Instant;

/// Per-phase outcome of a load run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Summary of each load phase, in execution order
    pub phases: Vec<(ArtifactKind, PhaseSummary)>,
    /// Summary of the checksum checks
    pub verification: PhaseSummary,
}

impl LoadReport {
    /// Number of tables that failed in any load phase
    pub fn failed_loads(&self) -> usize {
        self.phases.iter().map(|(_, summary)| summary.failed).sum()
    }
}

/// Restore every table found in `options.dir` into the client's database
///
/// Runs three phases, each a barrier for the next: all schemas, then all
/// data, then all deferred constraints. A fourth phase compares each table
/// against its stored checksum. Within a phase up to `options.threads` tables
/// load at once. A missing artifact is shown as `--`, a failed load as `ERR`.
///
/// # Errors
///
/// This function will return an error if:
/// - The backup directory cannot be read or holds no schema files
/// - The target database does not exist
/// - The status grid cannot be started
pub async fn load<C, S>(client: &C, options: &RunOptions, surface: S) -> Result<LoadReport>
where
    C: DatabaseClient,
    S: Surface,
{
    let started = Instant::now();
    let database = client.database();
    let dir = BackupDir::new(&options.dir);

    let tables = tables_in_backup_dir(dir.root())?;
    if tables.is_empty() {
        bail!(
            "No tables to load in {}\n\
             \n\
             The directory must contain <table>_schema.sql files produced by a dump.",
            dir.root().display()
        );
    }

    if !client.database_exists().await? {
        bail!("Database {} doesn't exist, create it before load", database);
    }

    tracing::info!(
        "Starting load from {} to database {}. Total {} tables to load.",
        dir.root().display(),
        database,
        tables.len()
    );

    let grid = StatusGrid::start(surface, &tables)?;
    let handle = grid.handle();
    let steps = LOAD_PHASES.len() + 1;

    let mut phases = Vec::with_capacity(LOAD_PHASES.len());
    for (step, kind) in LOAD_PHASES.into_iter().enumerate() {
        tracing::info!("Loading {} to database {}.", kind, database);
        handle.banner(format!(
            "[{}/{}] Loading {} for {} tables to DB {} from {}",
            step + 1,
            steps,
            kind,
            tables.len(),
            database,
            dir.root().display()
        ));
        handle.reset();

        let summary = run_phase(&tables, options.threads, &handle, |table| {
            load_artifact(client, &dir, table, kind)
        })
        .await;

        tracing::info!("Loading {} finished: {}", kind, summary);
        handle.banner(format!("Loading {} finished: {}", kind, summary));
        tokio::time::sleep(options.phase_pause).await;
        handle.clear();
        phases.push((kind, summary));
    }

    tracing::info!("Starting checksum checks in {}.", database);
    handle.banner(format!("[{}/{}] Starting checksum checks in {}", steps, steps, database));
    handle.reset();

    let verification = run_phase(&tables, options.threads, &handle, |table| {
        verify_table(client, &dir, table)
    })
    .await;

    let elapsed = started.elapsed();
    tracing::info!("Load finished: {} in {}", verification, HumanDuration(elapsed));
    handle.banner(finish_banner("Load", verification, elapsed, options.wait_for_key));
    grid.finish(options.wait_for_key).await?;

    Ok(LoadReport {
        phases,
        verification,
    })
}

/// Source one artifact of `table` if it exists
pub async fn load_artifact<C: DatabaseClient>(
    client: &C,
    dir: &BackupDir,
    table: &str,
    kind: ArtifactKind,
) -> Status {
    let path = dir.path(table, kind);
    if !path.is_file() {
        tracing::info!(" - {} {} file doesn't exist", table, kind);
        return Status::Missing;
    }

    match client.source(&path).await {
        Ok(()) => {
            tracing::info!(" - {} {} load complete", table, kind);
            Status::Ok
        }
        Err(e) => {
            tracing::error!(" - {} {} load failed: {:#}", table, kind, e);
            Status::Failed
        }
    }
}

/// Compare the stored checksum of `table` with the loaded table
pub async fn verify_table<C: DatabaseClient>(client: &C, dir: &BackupDir, table: &str) -> Status {
    let path = dir.path(table, ArtifactKind::Checksum);
    if !path.is_file() {
        tracing::warn!(" - {} checksum file doesn't exist", table);
        return Status::Missing;
    }

    let stored = match ChecksumRecord::read(&path).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(" - {} checksum unreadable: {:#}", table, e);
            return Status::Failed;
        }
    };
    let live = match live_checksum(client, table).await {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(" - {} checksum query failed: {:#}", table, e);
            return Status::Failed;
        }
    };

    let verification = stored.compare(&live);
    if verification.is_valid() {
        tracing::info!(" - {} checksum verified", table);
    }
    if !verification.schema_matches {
        tracing::warn!(" - {} schema doesn't match", table);
    }
    if !verification.count_matches {
        tracing::warn!(
            " - {} data count doesn't match (expected {}, found {})",
            table,
            stored.count,
            live.count
        );
    }

    Status::from(verification)
}
