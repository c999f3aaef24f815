//! Duty create/edit form, shared by the list modal and the routed editor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use peerly_core::model::DutyForm;
use peerly_core::{Editor, EditorMode};

use crate::theme;
use crate::widgets::overlay;
use crate::widgets::text_field::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    Handled,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Field {
    #[default]
    Name,
    Private,
}

#[derive(Debug, Default)]
pub struct DutyFormView {
    name: TextField,
    field: Field,
}

impl DutyFormView {
    pub fn new(editor: &Editor<DutyForm>) -> Self {
        Self {
            name: TextField::new(editor.values().name.clone()),
            field: Field::Name,
        }
    }

    /// Edit the form. Keys are ignored while a save is in flight.
    pub fn handle_key(&mut self, key: KeyEvent, editor: &mut Editor<DutyForm>) -> FormKey {
        if !editor.is_submit_enabled() {
            return FormKey::Handled;
        }
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return FormKey::Cancel,
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => return FormKey::Submit,
            (_, KeyCode::Enter) => {
                if self.field == Field::Name {
                    self.field = Field::Private;
                } else {
                    return FormKey::Submit;
                }
            }
            (_, KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up) => {
                self.field = match self.field {
                    Field::Name => Field::Private,
                    Field::Private => Field::Name,
                };
            }
            (_, KeyCode::Char(' ')) if self.field == Field::Private => {
                let values = editor.values_mut();
                values.private = !values.private;
            }
            _ if self.field == Field::Name => {
                if self.name.handle_key(key) {
                    self.name.value().clone_into(&mut editor.values_mut().name);
                }
            }
            _ => {}
        }
        FormKey::Handled
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, editor: &Editor<DutyForm>) {
        let title = match editor.mode() {
            Some(EditorMode::Update { .. }) => "Update Duty",
            _ => "Create Duty",
        };
        let rect = overlay::centered(area, 60, 10);
        let inner = overlay::dialog(frame, rect, title, theme::ACCENT);

        let [name_area, name_err, private_area, _, error_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.name.render(frame, name_area, " Name", self.field == Field::Name);
        if let Some(message) = editor.field_errors().get("name") {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("       {message}"), theme::field_error())),
                name_err,
            );
        }

        let checkbox = if editor.values().private { "[x]" } else { "[ ]" };
        let private_style = if self.field == Field::Private {
            theme::key_hint_key()
        } else {
            theme::key_hint()
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" Private ", private_style),
                Span::styled(checkbox, Style::default().fg(theme::TEXT)),
            ])),
            private_area,
        );

        if let Some(error) = editor.error() {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {error}"), theme::field_error())),
                error_area,
            );
        }

        let hint = if editor.is_submit_enabled() {
            crate::widgets::data_table::hints(&[
                ("Tab", "next field"),
                ("Space", "toggle"),
                ("Ctrl+s", "save"),
                ("Esc", "cancel"),
            ])
        } else {
            Line::from(Span::styled(" Saving…", theme::key_hint()))
        };
        frame.render_widget(Paragraph::new(hint), hint_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peerly_core::pages::duties::DutiesPage;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_updates_editor_values() {
        let mut page = DutiesPage::new(4);
        page.open_create();
        let editor = page.editor_mut().expect("editor open");
        let mut view = DutyFormView::new(editor);

        for c in "Reader".chars() {
            view.handle_key(press(KeyCode::Char(c)), editor);
        }
        assert_eq!(editor.values().name, "Reader");

        assert_eq!(view.handle_key(press(KeyCode::Tab), editor), FormKey::Handled);
        view.handle_key(press(KeyCode::Char(' ')), editor);
        assert!(editor.values().private);

        assert_eq!(view.handle_key(press(KeyCode::Enter), editor), FormKey::Submit);
        assert_eq!(view.handle_key(press(KeyCode::Esc), editor), FormKey::Cancel);
    }
}
