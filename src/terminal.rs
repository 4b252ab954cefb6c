use anyhow::Context;
use crossterm::{
    cursor,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use log::info;
use std::io::{stdout, Stdout, Write};

pub const MIN_COLS: u16 = 4;
pub const MIN_ROWS: u16 = 2;

/// Raw mode plus alternate screen for the lifetime of the guard.
///
/// Dropping it restores the terminal on every exit path, errors included.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Exists before the remaining steps so Drop undoes raw mode if one fails.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;

        info!("terminal: raw mode + alternate screen");
        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }

    /// Current `(cols, rows)`, rejecting terminals too small to draw into.
    pub fn size() -> anyhow::Result<(u16, u16)> {
        let size = terminal::size().context("get terminal size")?;
        check_min_size(size)?;
        Ok(size)
    }
}

pub fn check_min_size((cols, rows): (u16, u16)) -> anyhow::Result<()> {
    if cols < MIN_COLS || rows < MIN_ROWS {
        anyhow::bail!(
            "terminal too small (need at least {}x{}, got {}x{})",
            MIN_COLS,
            MIN_ROWS,
            cols,
            rows
        );
    }
    Ok(())
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        // Undo modes a renderer may have left on: sync output, autowrap, colors.
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        info!("terminal restored");
    }
}
