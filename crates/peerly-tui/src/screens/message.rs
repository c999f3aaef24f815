//! Not-found and error boundary screens.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

use peerly_core::PageId;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::data_table::hints;
use crate::widgets::overlay;

pub struct MessageScreen {
    title: String,
    headline: String,
    detail: String,
    color: ratatui::style::Color,
}

impl MessageScreen {
    pub fn not_found(path: String) -> Self {
        Self {
            title: "404".into(),
            headline: "Page not found".into(),
            detail: path,
            color: theme::AMBER,
        }
    }

    /// A page whose loader failed.
    pub fn failed(page: PageId, status: Option<u16>, message: String) -> Self {
        let title = match status {
            Some(code) => format!("Error {code}"),
            None => "Error".into(),
        };
        Self {
            title,
            headline: format!("{page} could not be loaded"),
            detail: message,
            color: theme::DANGER_RED,
        }
    }
}

impl Component for MessageScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Enter => Ok(Some(Action::Navigate("/".into()))),
            _ => Ok(None),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rect = overlay::centered(area, 60, 8);
        let inner = overlay::dialog(frame, rect, &self.title, self.color);
        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", self.headline),
                Style::default().fg(self.color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(format!(" {}", self.detail), Style::default().fg(theme::TEXT))),
            Line::from(""),
            hints(&[("Enter", "home"), ("Esc", "back")]),
        ];
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn id(&self) -> &'static str {
        "Message"
    }
}
