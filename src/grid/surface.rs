// ABOUTME: Terminal abstraction the status grid draws on
// ABOUTME: Implements cursor-addressed writes for a real terminal via console::Term

use console::Term;
use std::io;

/// Something that can show text at fixed screen positions
///
/// Only the renderer thread touches a surface, so implementations need not be
/// safe for concurrent use.
pub trait Surface: Send + 'static {
    /// `(rows, columns)` of the visible area
    fn size(&self) -> (usize, usize);

    /// Prepare the screen for the grid (clear, hide cursor)
    fn begin(&mut self) -> io::Result<()>;

    /// Write `text` starting at `row`, `col`
    fn put(&mut self, row: usize, col: usize, text: &str) -> io::Result<()>;

    fn clear(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;

    /// Block until the operator presses a key
    fn wait_for_key(&mut self) -> io::Result<()>;

    /// Restore the terminal after the run
    fn end(&mut self) -> io::Result<()>;
}

/// The process's stdout terminal
#[derive(Debug, Clone)]
pub struct TerminalSurface {
    term: Term,
}

impl TerminalSurface {
    pub fn stdout() -> Self {
        Self {
            term: Term::buffered_stdout(),
        }
    }

    pub fn is_term(&self) -> bool {
        self.term.is_term()
    }
}

impl Surface for TerminalSurface {
    fn size(&self) -> (usize, usize) {
        let (rows, cols) = self.term.size();
        (rows as usize, cols as usize)
    }

    fn begin(&mut self) -> io::Result<()> {
        self.term.clear_screen()?;
        self.term.hide_cursor()?;
        self.term.flush()
    }

    fn put(&mut self, row: usize, col: usize, text: &str) -> io::Result<()> {
        self.term.move_cursor_to(col, row)?;
        self.term.write_str(text)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.term.clear_screen()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.term.flush()
    }

    fn wait_for_key(&mut self) -> io::Result<()> {
        if !self.is_term() {
            return Ok(());
        }
        self.term.read_key().map(|_| ())
    }

    fn end(&mut self) -> io::Result<()> {
        let (rows, _) = self.size();
        self.term.move_cursor_to(0, rows.saturating_sub(1))?;
        self.term.show_cursor()?;
        self.term.write_line("")?;
        self.term.flush()
    }
}
