//! Single-line text field on top of `tui-input`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tui_input::{Input, InputRequest};

use crate::theme;

#[derive(Debug, Default, Clone)]
pub struct TextField {
    input: Input,
    masked: bool,
}

impl TextField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            input: Input::default().with_value(value.into()),
            masked: false,
        }
    }

    /// A field that renders bullets instead of its value.
    pub fn masked() -> Self {
        Self {
            input: Input::default(),
            masked: true,
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    /// Apply an editing key. Returns `false` for keys the field ignores
    /// (Enter, Esc, Tab, arrows up/down) so the caller can handle them.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(request) = to_request(key) else {
            return false;
        };
        self.input.handle(request);
        true
    }

    /// Render as `label value` with the cursor placed when `focused`.
    pub fn render(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let label_width = u16::try_from(label.chars().count() + 1).unwrap_or(u16::MAX);
        let width = usize::from(area.width.saturating_sub(label_width).max(1));
        let scroll = self.input.visual_scroll(width);

        let shown: String = if self.masked {
            "•".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_owned()
        };
        let visible: String = shown.chars().skip(scroll).take(width).collect();

        let value_style = if focused {
            Style::default().fg(theme::ACCENT)
        } else {
            theme::table_row()
        };
        let label_style = if focused {
            theme::key_hint_key()
        } else {
            theme::key_hint()
        };
        let line = Line::from(vec![
            Span::styled(format!("{label} "), label_style),
            Span::styled(visible, value_style),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        if focused {
            let offset = self.input.visual_cursor().saturating_sub(scroll);
            let x = area
                .x
                .saturating_add(label_width)
                .saturating_add(u16::try_from(offset).unwrap_or(u16::MAX));
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        }
    }
}

fn to_request(key: KeyEvent) -> Option<InputRequest> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
        KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
        KeyCode::Char('a') if ctrl => Some(InputRequest::GoToStart),
        KeyCode::Char('e') if ctrl => Some(InputRequest::GoToEnd),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(InputRequest::InsertChar(c)),
        KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
        KeyCode::Delete => Some(InputRequest::DeleteNextChar),
        KeyCode::Left => Some(InputRequest::GoToPrevChar),
        KeyCode::Right => Some(InputRequest::GoToNextChar),
        KeyCode::Home => Some(InputRequest::GoToStart),
        KeyCode::End => Some(InputRequest::GoToEnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_deleting() {
        let mut field = TextField::default();
        for c in "dutyx".chars() {
            assert!(field.handle_key(key(KeyCode::Char(c))));
        }
        field.handle_key(key(KeyCode::Backspace));
        assert_eq!(field.value(), "duty");
    }

    #[test]
    fn control_keys_fall_through() {
        let mut field = TextField::new("grade");
        assert!(!field.handle_key(key(KeyCode::Enter)));
        assert!(!field.handle_key(key(KeyCode::Tab)));
        assert!(!field.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        assert!(field.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL)));
        assert_eq!(field.value(), "");
    }
}
