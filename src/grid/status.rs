// ABOUTME: Status tokens rendered next to each table name
// ABOUTME: Converts worker outcomes and checksum verifications into short markers

use crate::backup::Verification;
use std::fmt;

/// Per-table processing state shown in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting for a worker
    Pending,
    /// A worker is processing the table
    Running,
    Ok,
    /// The artifact for this phase does not exist
    Missing,
    /// An external command failed or returned nothing
    Failed,
    /// Verification found drift in the schema (`M`), the row count (`C`), or both
    Mismatch { schema: bool, count: bool },
}

impl Status {
    pub fn token(&self) -> &'static str {
        match self {
            Status::Pending => "",
            Status::Running => "...",
            Status::Ok => "OK",
            Status::Missing => "--",
            Status::Failed => "ERR",
            Status::Mismatch {
                schema: true,
                count: true,
            } => "MC",
            Status::Mismatch { schema: true, .. } => "M",
            Status::Mismatch { count: true, .. } => "C",
            Status::Mismatch { .. } => "OK",
        }
    }
}

impl From<Verification> for Status {
    fn from(verification: Verification) -> Self {
        if verification.is_valid() {
            Status::Ok
        } else {
            Status::Mismatch {
                schema: !verification.schema_matches,
                count: !verification.count_matches,
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
