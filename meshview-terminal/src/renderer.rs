/// Half-block presenter: two surface rows per terminal row
use crossterm::{
    cursor,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use meshview_core::{Color, Surface};
use std::io::Write;

/// Upper half block; foreground paints the top pixel, background the bottom one
const HALF_BLOCK: char = '▀';

/// Writes a [`Surface`] to the terminal with 24-bit colour
pub struct HalfBlockPresenter {
    background: [u8; 3],
}

impl HalfBlockPresenter {
    pub fn new(background: [u8; 3]) -> Self {
        Self { background }
    }

    /// Number of terminal rows needed for a surface of `height` pixels
    pub fn rows_for(height: u32) -> u16 {
        height.div_ceil(2).min(u16::MAX as u32) as u16
    }

    /// Composite a straight-alpha pixel over the background colour
    pub fn compose(&self, pixel: Color) -> [u8; 3] {
        let a = pixel.a as u32;
        let mix = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        [
            mix(pixel.r, self.background[0]),
            mix(pixel.g, self.background[1]),
            mix(pixel.b, self.background[2]),
        ]
    }

    fn cell(&self, surface: &Surface, x: u32, y: u32) -> [u8; 3] {
        surface
            .pixel(x, y)
            .map(|p| self.compose(p))
            .unwrap_or(self.background)
    }

    pub fn draw<W: Write>(&self, surface: &Surface, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<([u8; 3], [u8; 3])> = None;

        for row in 0..Self::rows_for(surface.height()) {
            writer.queue(cursor::MoveTo(0, row))?;
            let y = row as u32 * 2;

            for x in 0..surface.width() {
                let top = self.cell(surface, x, y);
                let bottom = self.cell(surface, x, y + 1);

                // Only emit colour changes
                if current != Some((top, bottom)) {
                    writer.queue(SetForegroundColor(rgb(top)))?;
                    writer.queue(SetBackgroundColor(rgb(bottom)))?;
                    current = Some((top, bottom));
                }
                writer.queue(Print(HALF_BLOCK))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Default for HalfBlockPresenter {
    fn default() -> Self {
        Self::new([18, 18, 24])
    }
}

fn rgb([r, g, b]: [u8; 3]) -> TermColor {
    TermColor::Rgb { r, g, b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose() {
        let presenter = HalfBlockPresenter::new([10, 20, 30]);
        assert_eq!(presenter.compose(Color::TRANSPARENT), [10, 20, 30]);
        assert_eq!(presenter.compose(Color::rgb(200, 100, 50)), [200, 100, 50]);

        let half = presenter.compose(Color::rgba(210, 20, 30, 128));
        assert_eq!(half, [110, 20, 30]);
    }

    #[test]
    fn test_rows_for() {
        assert_eq!(HalfBlockPresenter::rows_for(0), 0);
        assert_eq!(HalfBlockPresenter::rows_for(1), 1);
        assert_eq!(HalfBlockPresenter::rows_for(48), 24);
        assert_eq!(HalfBlockPresenter::rows_for(49), 25);
    }

    #[test]
    fn test_draw_emits_one_glyph_per_cell() {
        let surface = Surface::new(4, 3);
        let mut out = Vec::new();
        HalfBlockPresenter::default().draw(&surface, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(HALF_BLOCK).count(), 8);
        // A blank surface needs a single colour change
        assert_eq!(text.matches("38;2;").count(), 1);
    }
}
