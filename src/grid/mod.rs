// ABOUTME: Terminal status grid module
// ABOUTME: Lays out table names in columns and renders per-table status tokens

pub mod layout;
pub mod renderer;
pub mod status;
pub mod surface;

pub use layout::{render_cell, Cell, Entry, GridLayout};
pub use renderer::{GridHandle, StatusGrid};
pub use status::Status;
pub use surface::{Surface, TerminalSurface};
