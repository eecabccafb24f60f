//! Reusable TUI widgets.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use mandelbrot_core::render::RenderedFrame;
use mandelbrot_shared::Rgb;

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '▀';

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}"))
        .style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White),
        )
}

/// Draws a rendered frame, two pixel rows per terminal row.
pub(crate) struct FractalView<'a> {
    frame: Option<&'a RenderedFrame>,
}

impl<'a> FractalView<'a> {
    pub(crate) fn new(frame: Option<&'a RenderedFrame>) -> Self {
        Self { frame }
    }
}

impl Widget for FractalView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame else {
            return;
        };

        for row in 0..area.height {
            for col in 0..area.width {
                let x = u32::from(col);
                let y = u32::from(row) * 2;
                let Some(top) = frame.pixel(x, y) else {
                    continue;
                };
                let bottom = frame.pixel(x, y + 1).map_or(Color::Reset, to_color);

                if let Some(cell) = buf.cell_mut(Position::new(area.x + col, area.y + row)) {
                    cell.set_char(HALF_BLOCK)
                        .set_fg(to_color(top))
                        .set_bg(bottom);
                }
            }
        }
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pixels_map_to_half_blocks() {
        let frame = RenderedFrame {
            width: 2,
            height: 3,
            pixels: vec![
                Rgb::new(255, 0, 0),
                Rgb::new(0, 255, 0),
                Rgb::new(0, 0, 255),
                Rgb::BLACK,
                Rgb::new(9, 9, 9),
                Rgb::new(7, 7, 7),
            ],
        };
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        FractalView::new(Some(&frame)).render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));

        // Odd height: the last row has no bottom pixel.
        let cell = &buf[(1, 1)];
        assert_eq!(cell.fg, Color::Rgb(7, 7, 7));
        assert_eq!(cell.bg, Color::Reset);
    }

    #[test]
    fn missing_frame_leaves_buffer_untouched() {
        let area = Rect::new(0, 0, 3, 1);
        let mut buf = Buffer::empty(area);
        FractalView::new(None).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }
}
