// ABOUTME: MySQL client utilities module
// ABOUTME: Exports the external-process client and the trait the workers depend on

pub mod client;

pub use client::{filter_noise, Credentials, DatabaseClient, MysqlClient};
