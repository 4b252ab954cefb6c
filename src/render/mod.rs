mod ascii;
mod braille;
mod halfblock;
mod sextant;

pub use ascii::AsciiRenderer;
pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;
pub use sextant::SextantRenderer;

use crate::config::RendererMode;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub term_rows: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub overlay: Option<&'a str>,
    pub sync_updates: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::Ascii => Box::new(AsciiRenderer::new()),
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
        RendererMode::Sextant => Box::new(SextantRenderer::new()),
    }
}

/// Checked frame geometry: `(cols, visual_rows, pixel_width)`.
pub(crate) type Layout = (usize, usize, usize);

/// Validate the frame for a `px_w x px_h` cell layout and open it.
///
/// Returns `None` (having written nothing, or only a diagnostic) when the
/// frame cannot be drawn.
pub(crate) fn frame_begin(
    frame: &Frame<'_>,
    px_w: usize,
    px_h: usize,
    out: &mut dyn Write,
) -> anyhow::Result<Option<Layout>> {
    let cols = frame.term_cols as usize;
    let visual_rows = frame.visual_rows as usize;
    let w = frame.pixel_width;
    let h = frame.pixel_height;

    if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
        return Ok(None);
    }
    if w != cols.saturating_mul(px_w) || h != visual_rows.saturating_mul(px_h) {
        // Engine and terminal disagree for one frame during a resize.
        return Ok(None);
    }

    let need = w.saturating_mul(h).saturating_mul(4);
    if frame.pixels_rgba.len() < need {
        sync_begin(frame, out)?;
        out.write_all(b"\x1b[H\x1b[0m\x1b[2J")?;
        write!(
            out,
            "pixel buffer too small (need {}, got {})",
            need,
            frame.pixels_rgba.len()
        )?;
        sync_end(frame, out)?;
        out.flush()?;
        return Ok(None);
    }

    sync_begin(frame, out)?;
    out.write_all(b"\x1b[H\x1b[0m")?;
    // Autowrap off while painting full-width rows, or the last column wraps.
    out.write_all(b"\x1b[?7l")?;
    Ok(Some((cols, visual_rows, w)))
}

/// HUD, overlay, then restore terminal modes and flush.
pub(crate) fn frame_end(
    frame: &Frame<'_>,
    cols: usize,
    visual_rows: usize,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut hud_lines = frame.hud.lines();
    for i in 0..(frame.hud_rows as usize) {
        write_hud_line(out, visual_rows + i + 1, cols, hud_lines.next())?;
    }

    if let Some(text) = frame.overlay {
        draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
    }

    out.write_all(b"\x1b[?7h")?;
    sync_end(frame, out)?;
    out.flush()?;
    Ok(())
}

fn sync_begin(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    Ok(())
}

fn sync_end(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    Ok(())
}

pub(crate) fn write_hud_line(
    out: &mut dyn Write,
    row: usize,
    cols: usize,
    line: Option<&str>,
) -> anyhow::Result<()> {
    write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    if let Some(line) = line {
        let clipped: String = line.chars().take(cols).collect();
        out.write_all(clipped.as_bytes())?;
    }
    Ok(())
}

#[inline]
pub(crate) fn pixel_at(frame: &Frame<'_>, w: usize, x: usize, y: usize) -> (u8, u8, u8) {
    let i = (y * w + x) * 4;
    let p = &frame.pixels_rgba[i..i + 3];
    (p[0], p[1], p[2])
}

/// Approximate Rec.709 luma in integer math.
#[inline]
pub(crate) fn luma(r: u8, g: u8, b: u8) -> u16 {
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u16
}

/// Tracks the active SGR colors so unchanged ones are not re-sent.
#[derive(Default)]
pub(crate) struct ColorCache {
    fg: Option<(u8, u8, u8)>,
    bg: Option<(u8, u8, u8)>,
}

impl ColorCache {
    pub(crate) fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
    }

    pub(crate) fn fg(&mut self, out: &mut dyn Write, c: (u8, u8, u8)) -> std::io::Result<()> {
        if self.fg != Some(c) {
            write!(out, "\x1b[38;2;{};{};{}m", c.0, c.1, c.2)?;
            self.fg = Some(c);
        }
        Ok(())
    }

    pub(crate) fn bg(&mut self, out: &mut dyn Write, c: (u8, u8, u8)) -> std::io::Result<()> {
        if self.bg != Some(c) {
            write!(out, "\x1b[48;2;{};{};{}m", c.0, c.1, c.2)?;
            self.bg = Some(c);
        }
        Ok(())
    }
}

/// Threshold a cell's sub-pixels at mid-luma into "on" and "off" sets.
///
/// Returns the dot mask (built from `bits`) and the mean colors of both sets.
/// A flat cell has mask 0 and both colors equal.
pub(crate) fn split_cell(
    rgb: &[(u8, u8, u8)],
    bits: &[u8],
) -> (u8, (u8, u8, u8), (u8, u8, u8)) {
    let lum: Vec<u16> = rgb.iter().map(|&(r, g, b)| luma(r, g, b)).collect();
    let min_l = lum.iter().copied().min().unwrap_or(0);
    let max_l = lum.iter().copied().max().unwrap_or(0);
    let thr = (min_l + max_l) / 2;

    let mut mask = 0u8;
    let mut on = ColorSum::default();
    let mut off = ColorSum::default();
    for (i, &c) in rgb.iter().enumerate() {
        if lum[i] > thr {
            mask |= bits[i];
            on.add(c);
        } else {
            off.add(c);
        }
    }

    if mask == 0 {
        let c = off.mean().unwrap_or((0, 0, 0));
        return (0, c, c);
    }
    let fg = on.mean().unwrap_or((0, 0, 0));
    let bg = off.mean().unwrap_or(fg);
    (mask, fg, bg)
}

#[derive(Default)]
struct ColorSum {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl ColorSum {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += r as u32;
        self.g += g as u32;
        self.b += b as u32;
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

pub fn draw_overlay_popup(
    out: &mut dyn Write,
    term_cols: u16,
    term_rows: u16,
    text: &str,
) -> anyhow::Result<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let cols = term_cols as usize;
    let rows = term_rows as usize;
    if cols < 8 || rows < 4 {
        return Ok(());
    }

    let max_inner_w = cols.saturating_sub(6).max(1);
    let lines: Vec<String> = text
        .lines()
        .flat_map(|raw| hard_wrap(raw, max_inner_w))
        .collect();
    if lines.is_empty() {
        return Ok(());
    }

    let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_w = (widest.clamp(1, max_inner_w) + 4)
        .min(cols.saturating_sub(2))
        .max(4);
    let inner_w = box_w.saturating_sub(4);
    let body_h = lines.len().min(rows.saturating_sub(3).max(1));
    let box_h = (body_h + 2).min(rows.saturating_sub(1)).max(3);

    let start_col = (cols.saturating_sub(box_w)) / 2 + 1;
    let start_row = (rows.saturating_sub(box_h)) / 2 + 1;

    let horiz = "-".repeat(box_w.saturating_sub(2));
    let blank = " ".repeat(inner_w);

    out.write_all(b"\x1b[0m\x1b[38;2;236;242;255m\x1b[48;2;10;14;24m")?;
    write!(out, "\x1b[{};{}H+{}+", start_row, start_col, horiz)?;

    for (i, line) in lines.iter().take(body_h).enumerate() {
        let row = start_row + 1 + i;
        write!(out, "\x1b[{};{}H| {} |", row, start_col, blank)?;
        if i == 0 {
            // Title line.
            write!(
                out,
                "\x1b[{};{}H\x1b[1m\x1b[38;2;255;236;160m{}\x1b[22m\x1b[38;2;236;242;255m",
                row,
                start_col + 2,
                line
            )?;
        } else {
            write!(out, "\x1b[{};{}H{}", row, start_col + 2, line)?;
        }
    }

    write!(out, "\x1b[{};{}H+{}+", start_row + box_h - 1, start_col, horiz)?;
    out.write_all(b"\x1b[0m")?;
    Ok(())
}

/// Split `line` into chunks of at most `width` chars. An empty line stays one empty line.
pub fn hard_wrap(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(width).map(|c| c.iter().collect()).collect()
}
