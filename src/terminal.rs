use anyhow::{anyhow, Context};
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, Stdout, Write};
use std::time::Duration;

/// Raw mode plus alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Built before the remaining setup so Drop restores raw mode on failure.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;
        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }

    /// Columns and rows, rejecting terminals too small to draw into.
    pub fn size() -> anyhow::Result<(u16, u16)> {
        let (cols, rows) = terminal::size().context("get terminal size")?;
        if cols < 4 || rows < 2 {
            return Err(anyhow!("terminal too small (need at least 4x2, got {cols}x{rows})"));
        }
        Ok((cols, rows))
    }

    /// Key presses queued since the last call; never blocks.
    pub fn pending_keys() -> anyhow::Result<Vec<KeyEvent>> {
        let mut keys = Vec::new();
        while event::poll(Duration::from_millis(0)).context("poll terminal events")? {
            if let Event::Key(k) = event::read().context("read terminal event")? {
                if k.kind != KeyEventKind::Release {
                    keys.push(k);
                }
            }
        }
        Ok(keys)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        // Undo sync output, autowrap and colors left by an interrupted frame.
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}
