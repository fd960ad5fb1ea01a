// ABOUTME: Table discovery for dump and load runs
// ABOUTME: Lists live tables on the server or derives them from existing schema artifacts

use super::artifacts::ArtifactKind;
use crate::mysql::DatabaseClient;
use anyhow::{Context, Result};
use std::path::Path;

/// List all tables in the client's database, in server order
pub async fn list_tables<C: DatabaseClient>(client: &C) -> Result<Vec<String>> {
    let output = client
        .query("show tables;")
        .await
        .context("Failed to list tables")?;

    Ok(output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Tables that have a schema artifact in `dir`, sorted by name
///
/// Only `{table}_schema.sql` files count; a table whose other artifacts are
/// missing is still listed and reports the gap when that artifact is loaded.
pub fn tables_in_backup_dir(dir: &Path) -> Result<Vec<String>> {
    let suffix = ArtifactKind::Schema.suffix();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read backup directory {}", dir.display()))?;

    let mut tables = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::warn!("Skipping non UTF-8 file name {:?}", file_name);
            continue;
        };
        if let Some(table) = name.strip_suffix(suffix.as_str()) {
            if !table.is_empty() {
                tables.push(table.to_string());
            }
        }
    }

    tables.sort();
    Ok(tables)
}
