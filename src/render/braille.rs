use crate::render::{frame_begin, frame_end, pixel_at, split_cell, ColorCache, Frame, Renderer};
use std::io::Write;

/// 2x4 pixels per cell as a braille glyph, split at mid-luma into a
/// foreground (dots) and background color.
pub struct BrailleRenderer {
    colors: ColorCache,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::default(),
        }
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w)) = frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.colors.reset();

        // Row-major sub-pixel order to braille dot bits.
        const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

        let mut rgb = [(0u8, 0u8, 0u8); 8];
        for row in 0..visual_rows {
            write!(out, "\x1b[{};1H", row + 1)?;
            for col in 0..cols {
                for dy in 0..4usize {
                    for dx in 0..2usize {
                        rgb[dy * 2 + dx] = pixel_at(frame, w, col * 2 + dx, row * 4 + dy);
                    }
                }

                let (mask, fg, bg) = split_cell(&rgb, &DOT_BITS);
                let ch = if mask == 0 {
                    ' '
                } else {
                    char::from_u32(0x2800 + mask as u32).unwrap_or(' ')
                };

                self.colors.fg(out, fg)?;
                self.colors.bg(out, bg)?;
                write!(out, "{ch}")?;
            }
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
