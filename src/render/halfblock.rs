use crate::render::{frame_begin, frame_end, pixel_at, ColorCache, Frame, Renderer};
use std::io::Write;

/// Two vertically stacked pixels per cell: `▀` with the top pixel as
/// foreground and the bottom as background.
pub struct HalfBlockRenderer {
    colors: ColorCache,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorCache::default(),
        }
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w)) = frame_begin(frame, 1, 2, out)? else {
            return Ok(());
        };
        self.colors.reset();

        const HALF_BLOCK: char = '\u{2580}';

        for row in 0..visual_rows {
            write!(out, "\x1b[{};1H", row + 1)?;
            let top_y = row * 2;
            for x in 0..cols {
                self.colors.fg(out, pixel_at(frame, w, x, top_y))?;
                self.colors.bg(out, pixel_at(frame, w, x, top_y + 1))?;
                write!(out, "{HALF_BLOCK}")?;
            }
        }

        frame_end(frame, cols, visual_rows, out)
    }
}
