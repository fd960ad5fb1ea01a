// ABOUTME: Validated run configuration shared by the dump and load commands
// ABOUTME: Rejects empty credentials, bad thread counts, and missing backup directories

use crate::mysql::Credentials;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Which operation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Action {
    /// Export every table into the backup directory
    Dump,
    /// Re-import a backup directory and verify it
    Load,
}

/// Execution settings independent of the database connection
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Backup directory holding the per-table artifacts
    pub dir: PathBuf,
    /// Maximum number of tables processed at once
    pub threads: usize,
    /// Pause after each load phase so its final statuses stay readable
    pub phase_pause: Duration,
    /// Wait for a key press before restoring the terminal
    pub wait_for_key: bool,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub action: Action,
    pub credentials: Credentials,
    pub run: RunOptions,
}

impl Options {
    /// Check the options before any work starts
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is empty, the thread count is zero, or
    /// the backup directory does not exist.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("user", &self.credentials.user),
            ("password", &self.credentials.password),
            ("host", &self.credentials.host),
            ("db", &self.credentials.database),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("{} needs to be specified", name);
            }
        }

        if self.run.dir.as_os_str().is_empty() {
            bail!("dir needs to be specified");
        }
        if !self.run.dir.is_dir() {
            bail!(
                "Specified directory {} doesn't exist",
                self.run.dir.display()
            );
        }

        if self.run.threads == 0 {
            bail!("threads must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(dir: PathBuf) -> Options {
        Options {
            action: Action::Dump,
            credentials: Credentials {
                user: "root".to_string(),
                password: "secret".to_string(),
                host: "localhost".to_string(),
                database: "shop".to_string(),
            },
            run: RunOptions {
                dir,
                threads: 2,
                phase_pause: Duration::ZERO,
                wait_for_key: false,
            },
        }
    }

    #[test]
    fn test_valid_options() {
        let dir = tempdir().unwrap();
        assert!(options(dir.path().to_path_buf()).validate().is_ok());
    }

    #[test]
    fn test_empty_credentials_are_rejected() {
        let dir = tempdir().unwrap();

        let mut opts = options(dir.path().to_path_buf());
        opts.credentials.user = String::new();
        let err = opts.validate().unwrap_err();
        assert_eq!(err.to_string(), "user needs to be specified");

        let mut opts = options(dir.path().to_path_buf());
        opts.credentials.database = "   ".to_string();
        let err = opts.validate().unwrap_err();
        assert_eq!(err.to_string(), "db needs to be specified");
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = options(missing).validate().unwrap_err();
        assert!(err.to_string().contains("doesn't exist"));

        let file = dir.path().join("file.sql");
        std::fs::write(&file, "").unwrap();
        assert!(options(file).validate().is_err());

        assert!(options(PathBuf::new()).validate().is_err());
    }

    #[test]
    fn test_zero_threads_is_rejected() {
        let dir = tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf());
        opts.run.threads = 0;
        assert!(opts.validate().is_err());
    }
}
