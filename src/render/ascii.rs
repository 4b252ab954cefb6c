use crate::render::{frame_begin, frame_end, luma, pixel_at, ColorCache, Frame, Renderer};
use std::io::Write;

/// One pixel per cell, drawn as a density glyph in the pixel's color.
pub struct AsciiRenderer {
    colors: ColorCache,
}

impl AsciiRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::default(),
        }
    }
}

impl Renderer for AsciiRenderer {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w)) = frame_begin(frame, 1, 1, out)? else {
            return Ok(());
        };
        self.colors.reset();

        // Dark to bright.
        const RAMP: &[u8] = b" .,:;irsXA253hMHGS#9B&@";

        for y in 0..visual_rows {
            write!(out, "\x1b[{};1H", y + 1)?;
            for x in 0..cols {
                let c = pixel_at(frame, w, x, y);
                let l = luma(c.0, c.1, c.2) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255];

                self.colors.fg(out, c)?;
                out.write_all(&[ch])?;
            }
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
