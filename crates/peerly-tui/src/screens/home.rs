//! Home: who is signed in and a feed of recent domain events.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph};

use peerly_core::events::DUTIES_CHANGED;
use peerly_core::{AppEvent, Session};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

const MAX_ACTIVITY: usize = 50;

#[derive(Debug, Clone)]
struct Activity {
    at: DateTime<Local>,
    message: String,
}

#[derive(Default)]
pub struct HomeScreen {
    session: Session,
    activity: VecDeque<Activity>,
}

/// One-line description of a domain event.
fn describe(event: &AppEvent) -> String {
    if event.name == DUTIES_CHANGED {
        let action = event.detail["action"].as_str().unwrap_or("changed");
        match event.detail["id"].as_i64() {
            Some(id) => format!("Duty #{id} {action}"),
            None => format!("Duty {action}"),
        }
    } else {
        format!("{} {}", event.name, event.detail)
    }
}

impl HomeScreen {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, message: String) {
        self.activity.push_front(Activity {
            at: Local::now(),
            message,
        });
        self.activity.truncate(MAX_ACTIVITY);
    }
}

impl Component for HomeScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SessionChanged(session) => {
                if session.authenticated && !self.session.authenticated {
                    self.record(format!("Signed in as {}", session.user.display_name()));
                } else if !session.authenticated && self.session.authenticated {
                    self.record("Signed out".into());
                }
                self.session = session.clone();
            }
            Action::DomainEvent(event) => self.record(describe(event)),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [welcome_area, activity_area] =
            Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).areas(area);

        let label = Style::default().fg(theme::MUTED);
        let value = Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD);
        let lines = if self.session.authenticated {
            let user = &self.session.user;
            vec![
                Line::from(vec![
                    Span::styled(" Welcome, ", label),
                    Span::styled(user.display_name().to_owned(), value),
                ]),
                Line::from(vec![
                    Span::styled(" Role      ", label),
                    Span::styled(self.session.role().to_string(), Style::default().fg(theme::TEAL)),
                ]),
                Line::from(vec![
                    Span::styled(" User id   ", label),
                    Span::styled(user.id.to_string(), Style::default().fg(theme::TEXT)),
                ]),
            ]
        } else {
            vec![
                Line::from(Span::styled(" Not signed in.", value)),
                Line::from(Span::styled(" Press L or go to /login to sign in.", label)),
            ]
        };
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(" Peerly ")
                    .title_style(theme::title_style())
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(theme::border_default()),
            ),
            welcome_area,
        );

        let items: Vec<ListItem> = self
            .activity
            .iter()
            .map(|a| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", a.at.format("%H:%M:%S")), label),
                    Span::styled(a.message.clone(), Style::default().fg(theme::TEXT)),
                ]))
            })
            .collect();
        let list = List::new(items).block(
            Block::default()
                .title(" Activity ")
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default()),
        );
        frame.render_widget(list, activity_area);
    }

    fn id(&self) -> &'static str {
        "Home"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peerly_core::SessionUser;
    use serde_json::json;

    #[test]
    fn duty_events_are_described() {
        let event = AppEvent {
            name: DUTIES_CHANGED.into(),
            detail: json!({ "id": 7, "action": "deleted" }),
        };
        assert_eq!(describe(&event), "Duty #7 deleted");
    }

    #[test]
    fn activity_is_capped_newest_first() {
        let mut home = HomeScreen::new();
        for id in 0..60 {
            let event = AppEvent {
                name: DUTIES_CHANGED.into(),
                detail: json!({ "id": id, "action": "created" }),
            };
            home.update(&Action::DomainEvent(event)).unwrap();
        }
        assert_eq!(home.activity.len(), MAX_ACTIVITY);
        assert_eq!(home.activity[0].message, "Duty #59 created");
    }

    #[test]
    fn sign_in_is_recorded_once() {
        let mut home = HomeScreen::new();
        let session = Session::authenticated(SessionUser {
            id: 3,
            name: "ana".into(),
            ..SessionUser::default()
        });
        home.update(&Action::SessionChanged(session.clone())).unwrap();
        home.update(&Action::SessionChanged(session)).unwrap();
        assert_eq!(home.activity.len(), 1);
        assert_eq!(home.activity[0].message, "Signed in as ana");
    }
}
