// ABOUTME: Dump command implementation - export every table to flat files
// ABOUTME: Splits constraints from schema, dumps data, and records checksums per table

use super::finish_banner;
use super::options::RunOptions;
use crate::backup::{
    constraints_script, extract_constraints, list_tables, live_checksum, ArtifactKind, BackupDir,
    ExtractedSchema,
};
use crate::grid::{Status, StatusGrid, Surface};
use crate::mysql::DatabaseClient;
use crate::pool::{run_phase, PhaseSummary};
use anyhow::{bail, Context, Result};
use indicatif::HumanDuration;
use std::path::Path;
use std::time::Instant;

/// Dump every table of the client's database into `options.dir`
///
/// For each table, with up to `options.threads` tables in flight:
/// 1. Dumps the schema and moves its `CONSTRAINT` clauses into a deferred script
/// 2. Writes the remaining schema
/// 3. Dumps the row data
/// 4. Records the schema hash and row count
///
/// Progress is shown on `surface` as a status grid. A table that fails is
/// marked `ERR` and logged; the other tables carry on.
///
/// # Errors
///
/// This function will return an error if:
/// - The table list cannot be read
/// - The database has no tables
/// - The status grid cannot be started
///
/// # Examples
///
/// ```no_run
/// # use anyhow::Result;
/// # use std::time::Duration;
/// # use mysql_table_dumper::commands::{dump, RunOptions};
/// # use mysql_table_dumper::grid::TerminalSurface;
/// # use mysql_table_dumper::mysql::{Credentials, MysqlClient};
/// # use mysql_table_dumper::utils::locate_client_tools;
/// # async fn example() -> Result<()> {
/// let client = MysqlClient::new(
///     locate_client_tools()?,
///     Credentials {
///         user: "root".into(),
///         password: "secret".into(),
///         host: "localhost".into(),
///         database: "shop".into(),
///     },
/// );
/// let options = RunOptions {
///     dir: "/backups/shop".into(),
///     threads: 4,
///     phase_pause: Duration::from_secs(5),
///     wait_for_key: true,
/// };
/// let summary = dump(&client, &options, TerminalSurface::stdout()).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn dump<C, S>(client: &C, options: &RunOptions, surface: S) -> Result<PhaseSummary>
where
    C: DatabaseClient,
    S: Surface,
{
    let started = Instant::now();
    let database = client.database();

    let tables = list_tables(client).await?;
    if tables.is_empty() {
        bail!("No tables to dump in database '{}'", database);
    }

    let dir = BackupDir::new(&options.dir);
    tracing::info!(
        "Starting dump to {} of database {}. Total {} tables to dump.",
        dir.root().display(),
        database,
        tables.len()
    );

    let grid = StatusGrid::start(surface, &tables)?;
    let handle = grid.handle();
    handle.banner(format!(
        "Dumping {} tables in DB {} to {}",
        tables.len(),
        database,
        dir.root().display()
    ));

    let summary = run_phase(&tables, options.threads, &handle, |table| {
        dump_table(client, &dir, table)
    })
    .await;

    let elapsed = started.elapsed();
    tracing::info!("Dump finished: {} in {}", summary, HumanDuration(elapsed));
    handle.banner(finish_banner("Dump", summary, elapsed, options.wait_for_key));
    grid.finish(options.wait_for_key).await?;

    Ok(summary)
}

/// Dump one table's artifacts, reporting the outcome as a status token
pub async fn dump_table<C: DatabaseClient>(client: &C, dir: &BackupDir, table: &str) -> Status {
    match try_dump_table(client, dir, table).await {
        Ok(()) => {
            tracing::info!(" - {} dump completed.", table);
            Status::Ok
        }
        Err(e) => {
            tracing::error!(" - {} dump failed: {:#}", table, e);
            Status::Failed
        }
    }
}

async fn try_dump_table<C: DatabaseClient>(client: &C, dir: &BackupDir, table: &str) -> Result<()> {
    let schema = client.dump_schema(table).await?;
    if schema.trim().is_empty() {
        bail!("mysqldump returned an empty schema");
    }

    let ExtractedSchema {
        cleaned,
        constraints,
    } = extract_constraints(&schema);

    let constraints_path = dir.path(table, ArtifactKind::Constraints);
    if constraints.is_empty() {
        remove_stale(&constraints_path).await?;
    } else {
        tracing::debug!("{}: deferring {} constraint(s)", table, constraints.len());
        write_artifact(&constraints_path, constraints_script(table, &constraints)).await?;
    }

    write_artifact(&dir.path(table, ArtifactKind::Schema), cleaned).await?;

    client
        .dump_data(table, &dir.path(table, ArtifactKind::Data))
        .await?;

    let checksum = live_checksum(client, table).await?;
    checksum
        .write(&dir.path(table, ArtifactKind::Checksum))
        .await?;

    Ok(())
}

async fn write_artifact(path: &Path, contents: String) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Remove a constraints script left by an earlier dump of the same directory
async fn remove_stale(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}
