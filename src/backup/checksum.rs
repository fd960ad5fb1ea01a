// ABOUTME: Schema-hash and row-count checksums for drift detection
// ABOUTME: Persists the record at dump time and compares it against the live table on load

use crate::mysql::DatabaseClient;
use crate::utils::quote_identifier;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Persisted `{hash, count}` pair for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    /// Hex SHA-256 of the `show create table` output
    pub hash: String,
    /// Textual `select count(*)` result
    pub count: String,
}

/// Outcome of comparing a stored record against the live table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub schema_matches: bool,
    pub count_matches: bool,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.schema_matches && self.count_matches
    }
}

impl ChecksumRecord {
    /// Build a record from raw `show create table` and `select count(*)` output
    pub fn from_outputs(create_table: &str, count: &str) -> Self {
        Self {
            hash: schema_hash(create_table),
            count: count.trim().to_string(),
        }
    }

    pub fn compare(&self, live: &ChecksumRecord) -> Verification {
        Verification {
            schema_matches: self.hash == live.hash,
            count_matches: self.count == live.count,
        }
    }

    pub async fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize checksum")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write checksum {}", path.display()))
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read checksum {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid checksum file {}", path.display()))
    }
}

/// Hex SHA-256 digest of a table definition
pub fn schema_hash(create_table: &str) -> String {
    format!("{:x}", Sha256::digest(create_table.as_bytes()))
}

/// Compute the current checksum of `table` on the server
///
/// An empty count result is treated as a failure rather than a zero row count.
pub async fn live_checksum<C: DatabaseClient>(client: &C, table: &str) -> Result<ChecksumRecord> {
    let quoted = quote_identifier(table);

    let create_table = client
        .query(&format!("show create table {};", quoted))
        .await
        .with_context(|| format!("Failed to read definition of '{}'", table))?;
    let count = client
        .query(&format!("select count(*) from {};", quoted))
        .await
        .with_context(|| format!("Failed to count rows of '{}'", table))?;

    if create_table.trim().is_empty() {
        bail!("Empty definition returned for '{}'", table);
    }
    if count.trim().is_empty() {
        bail!("Empty row count returned for '{}'", table);
    }

    Ok(ChecksumRecord::from_outputs(&create_table, &count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClient;
    use tempfile::tempdir;

    fn record(hash: &str, count: &str) -> ChecksumRecord {
        ChecksumRecord {
            hash: hash.to_string(),
            count: count.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read_returns_same_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users_checksum.dat");
        let written = ChecksumRecord::from_outputs("users\tCREATE TABLE `users` ()", "42\n");

        written.write(&path).await.unwrap();
        let read = ChecksumRecord::read(&path).await.unwrap();

        assert_eq!(read, written);
        assert_eq!(read.count, "42");
    }

    #[tokio::test]
    async fn test_read_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad_checksum.dat");
        std::fs::write(&path, b"\x04\x08{\x07:\thash").unwrap();

        let err = ChecksumRecord::read(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid checksum file"));
    }

    #[test]
    fn test_compare() {
        let stored = record("abc123", "42");

        assert!(stored.compare(&record("abc123", "42")).is_valid());

        let count_only = stored.compare(&record("abc123", "43"));
        assert!(count_only.schema_matches);
        assert!(!count_only.count_matches);

        let schema_only = stored.compare(&record("def456", "42"));
        assert!(!schema_only.schema_matches);
        assert!(schema_only.count_matches);

        let both = stored.compare(&record("def456", "43"));
        assert!(!both.schema_matches && !both.count_matches);
    }

    #[test]
    fn test_schema_hash_is_stable_hex() {
        let first = schema_hash("CREATE TABLE `a` (`id` int)");
        let second = schema_hash("CREATE TABLE `a` (`id` int)");

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, schema_hash("CREATE TABLE `a` (`id` bigint)"));
    }

    #[tokio::test]
    async fn test_live_checksum_queries_table() {
        let client = FakeClient::new().with_table("users", "CREATE TABLE `users` (`id` int)", 7);

        let live = live_checksum(&client, "users").await.unwrap();

        assert_eq!(live.count, "7");
        assert_eq!(live.hash, schema_hash(&client.create_table_output("users")));
    }

    #[tokio::test]
    async fn test_live_checksum_unknown_table_fails() {
        let client = FakeClient::new();
        assert!(live_checksum(&client, "ghost").await.is_err());
    }
}
