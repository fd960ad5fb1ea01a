// ABOUTME: Column layout of table names for the status grid
// ABOUTME: Computes a fixed screen cell for every table from the terminal height

use crate::utils::sanitize_identifier;
use console::{measure_text_width, pad_str, Alignment};
use std::collections::HashMap;

/// Rows kept free for the banner line and the bottom edge
const RESERVED_ROWS: usize = 2;

/// Gap between the longest name in a column and the next column
const COLUMN_GAP: usize = 4;

/// Screen position of one table name and the width its status is aligned in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    pub width: usize,
}

/// A table placed on the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub table: String,
    /// Display form of the name, stripped of control characters
    pub label: String,
    pub cell: Cell,
}

/// Fixed cells for an ordered list of tables
///
/// Tables fill columns top to bottom, starting at row 1. Each column is as wide
/// as its longest name plus the gap, and a table's field is the column width
/// minus one so the status token ends flush with the column edge.
#[derive(Debug, Clone)]
pub struct GridLayout {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    columns: usize,
}

impl GridLayout {
    pub fn new(tables: &[String], terminal_rows: usize) -> Self {
        let per_column = terminal_rows.saturating_sub(RESERVED_ROWS).max(1);

        let mut entries = Vec::with_capacity(tables.len());
        let mut index = HashMap::with_capacity(tables.len());
        let mut x = 0;
        let mut columns = 0;

        for column in tables.chunks(per_column) {
            let labels: Vec<String> = column.iter().map(|name| sanitize_identifier(name)).collect();
            let longest = labels
                .iter()
                .map(|label| measure_text_width(label))
                .max()
                .unwrap_or(0);
            let column_width = longest + COLUMN_GAP;

            for (row, (table, label)) in column.iter().zip(labels).enumerate() {
                index.insert(table.clone(), entries.len());
                entries.push(Entry {
                    table: table.clone(),
                    label,
                    cell: Cell {
                        x,
                        y: row + 1,
                        width: column_width - 1,
                    },
                });
            }

            x += column_width;
            columns += 1;
        }

        Self {
            entries,
            index,
            columns,
        }
    }

    pub fn entry(&self, table: &str) -> Option<&Entry> {
        self.index.get(table).map(|&i| &self.entries[i])
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

/// Text for one cell: the name left-aligned, the token right-aligned
pub fn render_cell(name: &str, status: &str, width: usize) -> String {
    let remaining = width.saturating_sub(measure_text_width(name));
    format!("{}{}", name, pad_str(status, remaining, Alignment::Right, None))
}
