// ABOUTME: Backup directory utilities module
// ABOUTME: Handles artifact naming, constraint extraction, checksums, and table discovery

pub mod artifacts;
pub mod checksum;
pub mod constraints;
pub mod tables;

pub use artifacts::{ArtifactKind, BackupDir, LOAD_PHASES};
pub use checksum::{live_checksum, ChecksumRecord, Verification};
pub use constraints::{constraints_script, extract_constraints, ExtractedSchema};
pub use tables::{list_tables, tables_in_backup_dir};
