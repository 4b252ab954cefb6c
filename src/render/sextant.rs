use crate::render::{frame_begin, frame_end, pixel_at, split_cell, ColorCache, Frame, Renderer};
use std::io::Write;

/// 2x3 pixels per cell. Sextant glyphs are drawn with the first six braille
/// dots, which every braille-capable font has.
pub struct SextantRenderer {
    colors: ColorCache,
}

impl SextantRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::default(),
        }
    }
}

impl Renderer for SextantRenderer {
    fn name(&self) -> &'static str {
        "sextant"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w)) = frame_begin(frame, 2, 3, out)? else {
            return Ok(());
        };
        self.colors.reset();

        // left column: dots 1,2,3; right column: dots 4,5,6
        const DOT_BITS: [u8; 6] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20];

        let mut rgb = [(0u8, 0u8, 0u8); 6];
        for row in 0..visual_rows {
            write!(out, "\x1b[{};1H", row + 1)?;
            for col in 0..cols {
                for dy in 0..3usize {
                    for dx in 0..2usize {
                        rgb[dy * 2 + dx] = pixel_at(frame, w, col * 2 + dx, row * 3 + dy);
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
