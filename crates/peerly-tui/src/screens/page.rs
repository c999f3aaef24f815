//! Generic view for pages without a dedicated screen: the matched route
//! and whatever its loaders returned.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

use peerly_core::LoadedPage;
use peerly_core::routes::Params;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct PageScreen {
    page: LoadedPage,
    body: Vec<String>,
    scroll: u16,
}

impl PageScreen {
    pub fn new(page: LoadedPage) -> Self {
        let body = page
            .data
            .iter()
            .flat_map(|(loader, value)| {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                std::iter::once(format!("── {loader} ──"))
                    .chain(pretty.lines().map(str::to_owned).collect::<Vec<_>>())
                    .chain(std::iter::once(String::new()))
            })
            .collect();
        Self {
            page,
            body,
            scroll: 0,
        }
    }

    fn max_scroll(&self) -> u16 {
        u16::try_from(self.body.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

impl Component for PageScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_add(1).min(self.max_scroll());
            }
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = self.max_scroll(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let route = &self.page.route;
        let params = |p: &Params| {
            p.iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let label = Style::default().fg(theme::MUTED);
        let text = Style::default().fg(theme::TEXT);
        let mut header = vec![
            Line::from(vec![
                Span::styled(" Page   ", label),
                Span::styled(self.page.page().to_string(), theme::title_style()),
            ]),
            Line::from(vec![Span::styled(" Path   ", label), Span::styled(route.path.clone(), text)]),
        ];
        if !route.params.is_empty() {
            header.push(Line::from(vec![
                Span::styled(" Params ", label),
                Span::styled(params(&route.params), text),
            ]));
        }
        if !route.query.is_empty() {
            header.push(Line::from(vec![
                Span::styled(" Query  ", label),
                Span::styled(params(&route.query), text),
            ]));
        }

        let header_height = u16::try_from(header.len() + 2).unwrap_or(u16::MAX);
        let [header_area, body_area] =
            Layout::vertical([Constraint::Length(header_height), Constraint::Min(3)]).areas(area);

        let block = |title: &'static str| {
            Block::default()
                .title(title)
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default())
        };
        frame.render_widget(Paragraph::new(header).block(block(" Route ")), header_area);

        let body: Vec<Line> = if self.body.is_empty() {
            vec![Line::from(Span::styled(" No data for this page.", label))]
        } else {
            self.body
                .iter()
                .map(|l| Line::from(Span::styled(l.clone(), text)))
                .collect()
        };
        frame.render_widget(
            Paragraph::new(body)
                .block(block(" Data "))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            body_area,
        );
    }

    fn id(&self) -> &'static str {
        "Page"
    }
}
