// ABOUTME: Wrapper around the mysql and mysqldump programs
// ABOUTME: Runs queries, per-table dumps, and script loads as child processes

use crate::utils::ClientTools;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tokio::process::Command;

/// mysqldump lines that only make sense on the source server
const NOISE_PATTERNS: [&str; 2] = ["SQL_LOG_BIN", "GTID_PURGED"];

/// Connection parameters passed straight through to the client programs
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub host: String,
    pub database: String,
}

/// Operations the dump and load workers need from a database
///
/// `MysqlClient` implements this by spawning the external client programs;
/// tests substitute an in-memory implementation.
#[allow(async_fn_in_trait)]
pub trait DatabaseClient {
    /// Name of the database every operation targets
    fn database(&self) -> &str;

    /// Whether the target database exists on the server
    async fn database_exists(&self) -> Result<bool>;

    /// Run a query and return its stdout (batch mode, no column names)
    async fn query(&self, sql: &str) -> Result<String>;

    /// Schema-only dump of one table, noise lines removed
    async fn dump_schema(&self, table: &str) -> Result<String>;

    /// Data-only dump of one table streamed into `output`, noise lines removed
    async fn dump_data(&self, table: &str, output: &Path) -> Result<()>;

    /// Execute a SQL script file with the client's `source` command
    async fn source(&self, script: &Path) -> Result<()>;
}

/// `DatabaseClient` backed by the `mysql` and `mysqldump` executables
#[derive(Debug, Clone)]
pub struct MysqlClient {
    mysql: PathBuf,
    mysqldump: PathBuf,
    credentials: Credentials,
}

impl MysqlClient {
    pub fn new(tools: ClientTools, credentials: Credentials) -> Self {
        Self {
            mysql: tools.mysql,
            mysqldump: tools.mysqldump,
            credentials,
        }
    }

    /// Base command with connection flags
    ///
    /// The password travels in `MYSQL_PWD` so it stays out of the process list.
    fn command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg(format!("--user={}", self.credentials.user))
            .arg(format!("--host={}", self.credentials.host))
            .env("MYSQL_PWD", &self.credentials.password)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn mysql_batch(&self) -> Command {
        let mut cmd = self.command(&self.mysql);
        cmd.arg("--batch").arg("--skip-column-names");
        cmd
    }

    async fn run_mysqldump(&self, mode: &str, table: &str) -> Result<String> {
        let output = self
            .command(&self.mysqldump)
            .arg(mode)
            .arg(&self.credentials.database)
            .arg("--tables")
            .arg(table)
            .output()
            .await
            .context("Failed to execute mysqldump. Is the MySQL client installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("mysqldump {} failed for '{}': {}", mode, table, stderr.trim());
        }

        Ok(filter_noise(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl DatabaseClient for MysqlClient {
    fn database(&self) -> &str {
        &self.credentials.database
    }

    async fn database_exists(&self) -> Result<bool> {
        let output = self
            .mysql_batch()
            .arg("--execute=show databases;")
            .output()
            .await
            .context("Failed to execute mysql. Is the MySQL client installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Failed to list databases: {}", stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .any(|line| line.trim() == self.credentials.database))
    }

    async fn query(&self, sql: &str) -> Result<String> {
        tracing::debug!("Running query: {}", sql);

        let output = self
            .mysql_batch()
            .arg(format!("--execute={}", sql))
            .arg(&self.credentials.database)
            .output()
            .await
            .context("Failed to execute mysql. Is the MySQL client installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Query '{}' failed: {}", sql, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn dump_schema(&self, table: &str) -> Result<String> {
        self.run_mysqldump("--no-data", table).await
    }

    async fn dump_data(&self, table: &str, output: &Path) -> Result<()> {
        let mut child = self
            .command(&self.mysqldump)
            .arg("--no-create-info")
            .arg(&self.credentials.database)
            .arg("--tables")
            .arg(table)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to execute mysqldump. Is the MySQL client installed?")?;

        let stdout = child
            .stdout
            .take()
            .context("mysqldump stdout was not captured")?;
        let mut stderr = child
            .stderr
            .take()
            .context("mysqldump stderr was not captured")?;

        let file = tokio::fs::File::create(output)
            .await
            .with_context(|| format!("Failed to create {}", output.display()))?;

        let mut errors = Vec::new();
        let (written, _) = tokio::try_join!(
            async {
                copy_filtered(stdout, file)
                    .await
                    .with_context(|| format!("Failed to write {}", output.display()))
            },
            async {
                stderr
                    .read_to_end(&mut errors)
                    .await
                    .context("Failed to read mysqldump stderr")
            },
        )?;

        let status = child.wait().await.context("Failed to wait for mysqldump")?;
        if !status.success() {
            bail!(
                "mysqldump --no-create-info failed for '{}': {}",
                table,
                String::from_utf8_lossy(&errors).trim()
            );
        }

        tracing::debug!("Wrote {} bytes of data for '{}'", written, table);
        Ok(())
    }

    async fn source(&self, script: &Path) -> Result<()> {
        let output = self
            .command(&self.mysql)
            .arg(format!("--execute=source {};", script.display()))
            .arg(&self.credentials.database)
            .output()
            .await
            .context("Failed to execute mysql. Is the MySQL client installed?")?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            tracing::warn!("{}: {}", script.display(), line);
        }

        if !output.status.success() {
            bail!(
                "mysql exited with {} while sourcing {}",
                output.status,
                script.display()
            );
        }

        Ok(())
    }
}

/// Drop mysqldump lines matching the noise patterns, keeping line endings
pub fn filter_noise(dump: &str) -> String {
    dump.split_inclusive('\n')
        .filter(|line| !NOISE_PATTERNS.iter().any(|pattern| line.contains(pattern)))
        .collect()
}

fn is_noise(line: &[u8]) -> bool {
    NOISE_PATTERNS.iter().any(|pattern| {
        line.windows(pattern.len())
            .any(|window| window == pattern.as_bytes())
    })
}

/// Stream `reader` into `writer` line by line, skipping noise lines
///
/// Works on raw bytes, since row data is not guaranteed to be valid UTF-8.
async fn copy_filtered<R, W>(reader: R, writer: W) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);
    let mut line = Vec::new();
    let mut written = 0u64;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if is_noise(&line) {
            continue;
        }
        writer.write_all(&line).await?;
        written += line.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}
