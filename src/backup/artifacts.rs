// ABOUTME: Naming scheme for the flat per-table backup files
// ABOUTME: Maps (table, artifact kind) pairs to paths inside the backup directory

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the files a dump produces per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Schema,
    Constraints,
    Data,
    Checksum,
}

/// Order in which load replays the SQL artifacts
pub const LOAD_PHASES: [ArtifactKind; 3] = [
    ArtifactKind::Schema,
    ArtifactKind::Data,
    ArtifactKind::Constraints,
];

impl ArtifactKind {
    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Schema => "schema",
            ArtifactKind::Constraints => "constraints",
            ArtifactKind::Data => "data",
            ArtifactKind::Checksum => "checksum",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Checksum => "dat",
            _ => "sql",
        }
    }

    /// File name suffix following the table name, e.g. `_schema.sql`
    pub fn suffix(self) -> String {
        format!("_{}.{}", self.name(), self.extension())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The directory holding `{table}_{kind}.{ext}` files
#[derive(Debug, Clone)]
pub struct BackupDir {
    root: PathBuf,
}

impl BackupDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, table: &str, kind: ArtifactKind) -> PathBuf {
        self.root.join(format!("{}{}", table, kind.suffix()))
    }
}
