// ABOUTME: Utility functions for environment validation and identifiers
// ABOUTME: Locates the MySQL client binaries and quotes table names for queries

use anyhow::{bail, Result};
use std::path::PathBuf;
use which::which;

/// Resolved paths of the external MySQL client programs
#[derive(Debug, Clone)]
pub struct ClientTools {
    pub mysql: PathBuf,
    pub mysqldump: PathBuf,
}

/// Locate the required MySQL client tools on `PATH`
///
/// Both `mysql` (queries and `source`) and `mysqldump` (schema and data export)
/// are needed regardless of the action, since dump verifies through `mysql` and
/// load is only meaningful with artifacts produced by `mysqldump`.
///
/// # Errors
///
/// Returns an error with installation instructions if any tool is missing.
///
/// # Examples
///
/// ```no_run
/// # use mysql_table_dumper::utils::locate_client_tools;
/// # use anyhow::Result;
/// # fn example() -> Result<()> {
/// let tools = locate_client_tools()?;
/// println!("mysql at {}", tools.mysql.display());
/// # Ok(())
/// # }
/// ```
pub fn locate_client_tools() -> Result<ClientTools> {
    let mysql = which("mysql");
    let mysqldump = which("mysqldump");

    let mut missing = Vec::new();
    if mysql.is_err() {
        missing.push("mysql");
    }
    if mysqldump.is_err() {
        missing.push("mysqldump");
    }

    match (mysql, mysqldump) {
        (Ok(mysql), Ok(mysqldump)) => Ok(ClientTools { mysql, mysqldump }),
        _ => bail!(
            "Missing required MySQL client tools: {}\n\
             \n\
             Please install the MySQL client tools:\n\
             - Ubuntu/Debian: sudo apt-get install mysql-client\n\
             - macOS: brew install mysql-client\n\
             - RHEL/CentOS: sudo yum install mysql",
            missing.join(", ")
        ),
    }
}

/// Quote a table name as a MySQL identifier
///
/// Backticks inside the name are doubled, so the result is always a single
/// identifier token.
///
/// ```
/// # use mysql_table_dumper::utils::quote_identifier;
/// assert_eq!(quote_identifier("users"), "`users`");
/// assert_eq!(quote_identifier("odd`name"), "`odd``name`");
/// ```
pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// Sanitize an identifier (table name, database name) for display
///
/// Removes control characters and limits length so a hostile table name cannot
/// move the cursor around the status grid or inject lines into the log.
///
/// ```
/// # use mysql_table_dumper::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("normal_table"), "normal_table");
/// assert_eq!(sanitize_identifier("table\x1b[2Jname"), "table[2Jname");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}
