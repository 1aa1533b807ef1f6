use crate::canvas::Rgb;
use crate::render::{draw_box, Frame, Placement, Renderer};
use std::io::Write;

const UPPER_HALF: char = '\u{2580}';

/// Two canvas rows per terminal row: the upper pixel is the glyph color, the
/// lower one the cell background.
#[derive(Debug, Default)]
pub struct HalfBlockRenderer {
    fg: Option<Rgb>,
    bg: Option<Rgb>,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas size that exactly fills `cols` x `visual_rows` cells.
    pub fn pixel_size(cols: u16, visual_rows: u16) -> (usize, usize) {
        (cols as usize, visual_rows as usize * 2)
    }

    fn set_colors(&mut self, out: &mut dyn Write, top: Rgb, bottom: Rgb) -> std::io::Result<()> {
        if self.fg != Some(top) {
            write!(out, "\x1b[38;2;{};{};{}m", top[0], top[1], top[2])?;
            self.fg = Some(top);
        }
        if self.bg != Some(bottom) {
            write!(out, "\x1b[48;2;{};{};{}m", bottom[0], bottom[1], bottom[2])?;
            self.bg = Some(bottom);
        }
        Ok(())
    }
}

fn rgb_at(pixels: &[u8], w: usize, x: usize, y: usize) -> Rgb {
    let i = (y * w + x) * 4;
    [pixels[i], pixels[i + 1], pixels[i + 2]]
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        let (w, h) = (frame.pixel_width, frame.pixel_height);
        if cols == 0 || rows == 0 || (w, h) != Self::pixel_size(frame.term_cols, frame.visual_rows) {
            return Ok(());
        }
        if frame.pixels_rgba.len() < w * h * 4 {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }
        // Home, reset, autowrap off while full-width rows are painted.
        out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
        self.fg = None;
        self.bg = None;

        for row in 0..rows {
            for x in 0..cols {
                let top = rgb_at(frame.pixels_rgba, w, x, row * 2);
                let bottom = rgb_at(frame.pixels_rgba, w, x, row * 2 + 1);
                self.set_colors(out, top, bottom)?;
                write!(out, "{UPPER_HALF}")?;
            }
            out.write_all(b"\r\n")?;
        }

        let mut hud = frame.hud.lines();
        for i in 0..frame.hud_rows as usize {
            write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", rows + i + 1)?;
            if let Some(line) = hud.next() {
                let clipped: String = line.chars().take(cols).collect();
                out.write_all(clipped.as_bytes())?;
            }
        }

        if let Some(text) = frame.title {
            draw_box(out, frame.term_cols, frame.visual_rows, text, Placement::Top, false)?;
        }
        if let Some(text) = frame.popup {
            draw_box(out, frame.term_cols, frame.term_rows, text, Placement::Center, true)?;
        }

        out.write_all(b"\x1b[?7h")?;
        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }
}
