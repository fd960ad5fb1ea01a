// ABOUTME: In-memory stand-ins for the MySQL client and the terminal
// ABOUTME: Lets dump, load, and grid code run in unit tests without external programs

use crate::grid::Surface;
use crate::mysql::DatabaseClient;
use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeTable {
    ddl: String,
    rows: u64,
}

/// `DatabaseClient` over a fixed set of tables
#[derive(Debug)]
pub struct FakeClient {
    database: String,
    exists: bool,
    tables: BTreeMap<String, FakeTable>,
    failing: HashSet<String>,
    empty_schema: HashSet<String>,
    sourced: Mutex<Vec<PathBuf>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            database: "shop".to_string(),
            exists: true,
            tables: BTreeMap::new(),
            failing: HashSet::new(),
            empty_schema: HashSet::new(),
            sourced: Mutex::new(Vec::new()),
        }
    }

    pub fn with_table(mut self, name: &str, ddl: &str, rows: u64) -> Self {
        self.tables.insert(
            name.to_string(),
            FakeTable {
                ddl: ddl.to_string(),
                rows,
            },
        );
        self
    }

    /// Every external command touching `name` fails
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// The schema dump for `name` comes back empty
    pub fn with_empty_schema(mut self, name: &str) -> Self {
        self.empty_schema.insert(name.to_string());
        self
    }

    pub fn without_database(mut self) -> Self {
        self.exists = false;
        self
    }

    /// What `show create table` prints for `name`
    pub fn create_table_output(&self, name: &str) -> String {
        let table = &self.tables[name];
        format!("{}\t{}\n", name, table.ddl.replace('\n', "\\n"))
    }

    pub fn sourced(&self) -> Vec<PathBuf> {
        self.sourced.lock().unwrap().clone()
    }

    fn table(&self, name: &str) -> Result<&FakeTable> {
        if self.failing.contains(name) {
            bail!("simulated failure for '{}'", name);
        }
        self.tables
            .get(name)
            .with_context(|| format!("Table '{}' doesn't exist", name))
    }
}

/// Table name in a query of the form ``<prefix>`name`;``
fn table_in(sql: &str, prefix: &str) -> Option<String> {
    let rest = sql.strip_prefix(prefix)?;
    let quoted = rest.trim().trim_end_matches(';');
    Some(
        quoted
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix('`'))
            .unwrap_or(quoted)
            .replace("``", "`"),
    )
}

impl DatabaseClient for FakeClient {
    fn database(&self) -> &str {
        &self.database
    }

    async fn database_exists(&self) -> Result<bool> {
        Ok(self.exists)
    }

    async fn query(&self, sql: &str) -> Result<String> {
        if sql == "show tables;" {
            return Ok(self.tables.keys().map(|name| format!("{}\n", name)).collect());
        }
        if let Some(name) = table_in(sql, "show create table ") {
            self.table(&name)?;
            return Ok(self.create_table_output(&name));
        }
        if let Some(name) = table_in(sql, "select count(*) from ") {
            return Ok(format!("{}\n", self.table(&name)?.rows));
        }
        bail!("unexpected query: {}", sql)
    }

    async fn dump_schema(&self, table: &str) -> Result<String> {
        let fake = self.table(table)?;
        if self.empty_schema.contains(table) {
            return Ok(String::new());
        }
        Ok(format!(
            "DROP TABLE IF EXISTS `{}`;\n{};\n",
            table, fake.ddl
        ))
    }

    async fn dump_data(&self, table: &str, output: &Path) -> Result<()> {
        let fake = self.table(table)?;
        let inserts: String = (0..fake.rows)
            .map(|i| format!("INSERT INTO `{}` VALUES ({});\n", table, i))
            .collect();
        std::fs::write(output, inserts)?;
        Ok(())
    }

    async fn source(&self, script: &Path) -> Result<()> {
        let file_name = script
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        if self.failing.iter().any(|t| file_name.starts_with(&format!("{}_", t))) {
            bail!("simulated failure sourcing {}", script.display());
        }
        self.sourced.lock().unwrap().push(script.to_path_buf());
        Ok(())
    }
}

#[derive(Debug)]
struct Screen {
    cells: Vec<Vec<char>>,
    began: bool,
    ended: bool,
    key_waits: usize,
}

/// Character-grid `Surface`; clones share the same screen
#[derive(Debug, Clone)]
pub struct MemorySurface {
    rows: usize,
    cols: usize,
    screen: Arc<Mutex<Screen>>,
}

impl MemorySurface {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            screen: Arc::new(Mutex::new(Screen {
                cells: vec![vec![' '; cols]; rows],
                began: false,
                ended: false,
                key_waits: 0,
            })),
        }
    }

    /// Row contents with trailing blanks removed
    pub fn line(&self, row: usize) -> String {
        self.raw_line(row).trim_end().to_string()
    }

    pub fn raw_line(&self, row: usize) -> String {
        self.screen.lock().unwrap().cells[row].iter().collect()
    }

    pub fn began(&self) -> bool {
        self.screen.lock().unwrap().began
    }

    pub fn ended(&self) -> bool {
        self.screen.lock().unwrap().ended
    }

    pub fn key_waits(&self) -> usize {
        self.screen.lock().unwrap().key_waits
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn begin(&mut self) -> io::Result<()> {
        self.screen.lock().unwrap().began = true;
        Ok(())
    }

    fn put(&mut self, row: usize, col: usize, text: &str) -> io::Result<()> {
        let mut screen = self.screen.lock().unwrap();
        let Some(line) = screen.cells.get_mut(row) else {
            return Ok(());
        };
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = line.get_mut(col + offset) {
                *cell = ch;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        let mut screen = self.screen.lock().unwrap();
        for line in screen.cells.iter_mut() {
            line.fill(' ');
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn wait_for_key(&mut self) -> io::Result<()> {
        self.screen.lock().unwrap().key_waits += 1;
        Ok(())
    }

    fn end(&mut self) -> io::Result<()> {
        self.screen.lock().unwrap().ended = true;
        Ok(())
    }
}
