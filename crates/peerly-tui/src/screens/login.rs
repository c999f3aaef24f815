//! Login form. Submitting hands the credentials to the app, which owns
//! the session.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use secrecy::SecretString;

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::data_table::hints;
use crate::widgets::overlay;
use crate::widgets::text_field::TextField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    User,
    Password,
}

pub struct LoginScreen {
    redirect: String,
    user: TextField,
    password: TextField,
    focus: Focus,
    error: Option<String>,
    submitting: bool,
}

impl LoginScreen {
    pub fn new(redirect: String) -> Self {
        Self {
            redirect,
            user: TextField::default(),
            password: TextField::masked(),
            focus: Focus::User,
            error: None,
            submitting: false,
        }
    }

    fn submit(&mut self) -> Option<Action> {
        let user_name = self.user.value().trim().to_owned();
        if user_name.is_empty() {
            self.error = Some("User name is required".into());
            self.focus = Focus::User;
            return None;
        }
        self.error = None;
        self.submitting = true;
        Some(Action::Login {
            user_name,
            password: SecretString::from(self.password.value().to_owned()),
            redirect: self.redirect.clone(),
        })
    }
}

impl Component for LoginScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.submitting {
            return Ok(None);
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Focus::User => Focus::Password,
                    Focus::Password => Focus::User,
                };
            }
            KeyCode::Enter => match self.focus {
                Focus::User => self.focus = Focus::Password,
                Focus::Password => return Ok(self.submit()),
            },
            KeyCode::Esc => return Ok(Some(Action::Quit)),
            _ => {
                let field = match self.focus {
                    Focus::User => &mut self.user,
                    Focus::Password => &mut self.password,
                };
                field.handle_key(key);
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::LoginFailed(message) = action {
            self.submitting = false;
            self.error = Some(message.clone());
            self.password.clear();
            self.focus = Focus::Password;
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rect = overlay::centered(area, 52, 10);
        let inner = overlay::dialog(frame, rect, "Sign in", theme::ACCENT);
        let [_, user_area, password_area, _, status_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.user.render(frame, user_area, " User name", self.focus == Focus::User);
        self.password
            .render(frame, password_area, " Password ", self.focus == Focus::Password);

        let status = if self.submitting {
            Line::from(Span::styled(" Signing in…", theme::key_hint()))
        } else if let Some(error) = &self.error {
            Line::from(Span::styled(format!(" {error}"), theme::field_error()))
        } else {
            Line::default()
        };
        frame.render_widget(Paragraph::new(status), status_area);
        frame.render_widget(
            Paragraph::new(hints(&[("Tab", "switch"), ("Enter", "sign in"), ("Esc", "quit")])),
            hint_area,
        );
    }

    fn id(&self) -> &'static str {
        "Login"
    }
}
