mod halfblock;

pub use halfblock::HalfBlockRenderer;

use std::io::Write;

/// One terminal frame: the canvas pixels plus the text drawn over them.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    /// Rows given to pixels; the HUD takes the rest.
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    /// Short-lived banner, e.g. the name of a freshly loaded effect.
    pub title: Option<&'a str>,
    /// Modal popup over a dimmed screen.
    pub popup: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Top,
    Center,
}

/// Boxed text centered horizontally. With `backdrop`, every terminal row is
/// cleared to a dark background first.
pub fn draw_box(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
    placement: Placement,
    backdrop: bool,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 3 {
        return Ok(());
    }

    let lines = wrap_text(text, cols.saturating_sub(6).max(1));
    if lines.is_empty() {
        return Ok(());
    }

    let inner_w = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1).max(1);
    let box_w = (inner_w + 4).min(cols.saturating_sub(2)).max(4);
    let inner_w = box_w - 4;
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = body_h + 2;

    let start_col = cols.saturating_sub(box_w) / 2 + 1;
    let start_row = match placement {
        Placement::Top => 2.min(rows.saturating_sub(box_h).max(1)),
        Placement::Center => rows.saturating_sub(box_h) / 2 + 1,
    };

    if backdrop {
        out.write_all(b"\x1b[0m\x1b[38;2;220;228;242m\x1b[48;2;2;4;10m")?;
        for row in 1..=rows {
            write!(out, "\x1b[{row};1H\x1b[2K")?;
        }
    }

    let horiz = "-".repeat(box_w - 2);
    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{start_row};{start_col}H+{horiz}+")?;
    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = start_row + 1 + i;
        let pad = inner_w.saturating_sub(line.chars().count());
        if i == 0 {
            write!(
                out,
                "\x1b[{row};{start_col}H| \x1b[1m\x1b[38;2;255;236;160m{line}\x1b[22m\x1b[38;2;236;242;255m{} |",
                " ".repeat(pad)
            )?;
        } else {
            write!(out, "\x1b[{row};{start_col}H| {line}{} |", " ".repeat(pad))?;
        }
    }
    write!(out, "\x1b[{};{start_col}H+{horiz}+", start_row + box_h - 1)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}

/// Hard wrap at `width` characters, keeping explicit line breaks.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for raw in text.lines() {
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }
        let chars: Vec<char> = raw.chars().collect();
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}
