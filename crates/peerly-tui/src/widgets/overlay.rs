//! Centered dialogs drawn over the active screen.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Borders, Clear};

use crate::theme;

/// A `width` x `height` rect centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Clear `rect`, draw a rounded titled frame and return its inner area.
pub fn dialog(frame: &mut Frame, rect: Rect, title: &str, border: Color) -> Rect {
    frame.render_widget(Clear, rect);
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered(area, 50, 10);
        assert_eq!(rect, Rect::new(25, 15, 50, 10));

        let tiny = centered(Rect::new(0, 0, 20, 6), 50, 10);
        assert!(tiny.width <= 16 && tiny.height <= 4);
    }
}
