// ABOUTME: Library module for mysql-table-dumper
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod backup;
pub mod commands;
pub mod grid;
pub mod logging;
pub mod mysql;
pub mod pool;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
