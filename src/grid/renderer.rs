// ABOUTME: Single-owner renderer thread for the status grid
// ABOUTME: Workers send status updates over a channel; only this thread touches the terminal

use super::layout::{render_cell, GridLayout};
use super::status::Status;
use super::surface::Surface;
use anyhow::{anyhow, Context, Result};
use console::{pad_str, Alignment};
use std::io;
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug)]
enum GridEvent {
    Status { table: String, status: Status },
    Banner(String),
    ResetAll,
    Clear,
    Finish { wait_for_key: bool },
}

/// Cloneable sender side of the grid, handed to every worker
#[derive(Debug, Clone)]
pub struct GridHandle {
    tx: UnboundedSender<GridEvent>,
}

impl GridHandle {
    pub fn set(&self, table: &str, status: Status) {
        self.send(GridEvent::Status {
            table: table.to_string(),
            status,
        });
    }

    /// Replace the banner line at the top of the screen
    pub fn banner(&self, message: impl Into<String>) {
        self.send(GridEvent::Banner(message.into()));
    }

    /// Redraw every table with an empty status
    pub fn reset(&self) {
        self.send(GridEvent::ResetAll);
    }

    pub fn clear(&self) {
        self.send(GridEvent::Clear);
    }

    fn send(&self, event: GridEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Status grid already closed, dropping update");
        }
    }
}

/// A running status grid
///
/// Owns the renderer thread. Call [`StatusGrid::finish`] to stop it.
pub struct StatusGrid {
    handle: GridHandle,
    renderer: JoinHandle<()>,
}

impl StatusGrid {
    /// Lay out `tables` for the surface's height and draw them with empty statuses
    pub fn start<S: Surface>(mut surface: S, tables: &[String]) -> Result<Self> {
        surface
            .begin()
            .context("Failed to prepare the terminal for the status grid")?;
        let (rows, cols) = surface.size();
        let layout = GridLayout::new(tables, rows);
        tracing::debug!(
            "Status grid: {} tables in {} columns on a {}x{} terminal",
            tables.len(),
            layout.columns(),
            cols,
            rows
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let renderer = std::thread::Builder::new()
            .name("status-grid".to_string())
            .spawn(move || Renderer { surface, layout }.run(rx))
            .context("Failed to start the status grid renderer")?;

        Ok(Self {
            handle: GridHandle { tx },
            renderer,
        })
    }

    pub fn handle(&self) -> GridHandle {
        self.handle.clone()
    }

    /// Flush pending updates, optionally wait for a key press, restore the terminal
    pub async fn finish(self, wait_for_key: bool) -> Result<()> {
        self.handle.send(GridEvent::Finish { wait_for_key });
        let renderer = self.renderer;

        tokio::task::spawn_blocking(move || renderer.join())
            .await
            .context("Failed to join the status grid renderer")?
            .map_err(|_| anyhow!("Status grid renderer panicked"))
    }
}

struct Renderer<S> {
    surface: S,
    layout: GridLayout,
}

impl<S: Surface> Renderer<S> {
    fn run(mut self, mut rx: UnboundedReceiver<GridEvent>) {
        self.draw_all();
        best_effort(self.surface.flush(), "flush");

        while let Some(event) = rx.blocking_recv() {
            match event {
                GridEvent::Status { table, status } => self.draw(&table, status),
                GridEvent::Banner(message) => self.banner(&message),
                GridEvent::ResetAll => self.draw_all(),
                GridEvent::Clear => best_effort(self.surface.clear(), "clear"),
                GridEvent::Finish { wait_for_key } => {
                    best_effort(self.surface.flush(), "flush");
                    if wait_for_key {
                        best_effort(self.surface.wait_for_key(), "read key");
                    }
                    break;
                }
            }
            best_effort(self.surface.flush(), "flush");
        }

        best_effort(self.surface.end(), "restore terminal");
    }

    fn draw(&mut self, table: &str, status: Status) {
        let Some(entry) = self.layout.entry(table) else {
            tracing::debug!("No grid cell for table '{}'", table);
            return;
        };
        let text = render_cell(&entry.label, status.token(), entry.cell.width);
        let (y, x) = (entry.cell.y, entry.cell.x);
        best_effort(self.surface.put(y, x, &text), "draw cell");
    }

    fn draw_all(&mut self) {
        let cells: Vec<_> = self
            .layout
            .iter()
            .map(|entry| {
                (
                    entry.cell,
                    render_cell(&entry.label, Status::Pending.token(), entry.cell.width),
                )
            })
            .collect();
        for (cell, text) in cells {
            best_effort(self.surface.put(cell.y, cell.x, &text), "draw cell");
        }
    }

    fn banner(&mut self, message: &str) {
        let (_, cols) = self.surface.size();
        let width = cols.saturating_sub(1);
        let line = pad_str(message, width, Alignment::Left, Some(""));
        best_effort(self.surface.put(0, 1, &line), "draw banner");
    }
}

/// Terminal writes never abort a run
fn best_effort(result: io::Result<()>, action: &str) {
    if let Err(e) = result {
        tracing::debug!("Status grid {} failed: {}", action, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySurface;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_initial_grid_lists_every_table() {
        let surface = MemorySurface::new(6, 40);
        let grid = StatusGrid::start(surface.clone(), &tables(&["users", "orders", "items"]))
            .unwrap();
        grid.finish(false).await.unwrap();

        assert!(surface.began());
        assert!(surface.ended());
        assert_eq!(surface.line(1), "users");
        assert_eq!(surface.line(2), "orders");
        assert_eq!(surface.line(3), "items");
    }

    #[tokio::test]
    async fn test_status_updates_land_in_their_cells() {
        let surface = MemorySurface::new(4, 40);
        let grid = StatusGrid::start(surface.clone(), &tables(&["a", "bbbbb", "cc", "d"]))
            .unwrap();
        let handle = grid.handle();

        handle.set("a", Status::Running);
        handle.set("bbbbb", Status::Ok);
        handle.set("cc", Status::Mismatch {
            schema: true,
            count: true,
        });
        handle.set("a", Status::Failed);
        handle.set("unknown", Status::Ok);
        grid.finish(false).await.unwrap();

        assert_eq!(surface.line(1), "a    ERR cc MC");
        assert_eq!(surface.line(2), "bbbbb OK d");
    }

    #[tokio::test]
    async fn test_banner_is_padded_to_terminal_width() {
        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t"])).unwrap();
        let handle = grid.handle();

        handle.banner("A very long banner message that overflows");
        handle.banner("Short");
        grid.finish(false).await.unwrap();

        assert_eq!(surface.line(0), " Short");
        assert_eq!(surface.raw_line(0).chars().count(), 30);
    }

    #[tokio::test]
    async fn test_reset_and_clear() {
        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t1", "t2"])).unwrap();
        let handle = grid.handle();

        handle.set("t1", Status::Ok);
        handle.reset();
        handle.set("t2", Status::Running);
        grid.finish(false).await.unwrap();
        assert_eq!(surface.line(1), "t1");
        assert_eq!(surface.line(2), "t2...");

        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t1"])).unwrap();
        grid.handle().clear();
        grid.finish(false).await.unwrap();
        assert_eq!(surface.line(1), "");
    }

    #[tokio::test]
    async fn test_finish_waits_for_key_when_asked() {
        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t"])).unwrap();
        grid.finish(true).await.unwrap();
        assert_eq!(surface.key_waits(), 1);

        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t"])).unwrap();
        grid.finish(false).await.unwrap();
        assert_eq!(surface.key_waits(), 0);
    }

    #[tokio::test]
    async fn test_updates_after_finish_are_dropped() {
        let surface = MemorySurface::new(5, 30);
        let grid = StatusGrid::start(surface.clone(), &tables(&["t"])).unwrap();
        let handle = grid.handle();
        grid.finish(false).await.unwrap();

        handle.set("t", Status::Ok);
        assert_eq!(surface.line(1), "t");
    }
}
