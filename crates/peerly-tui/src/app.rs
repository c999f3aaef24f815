//! Application core: event loop, navigation, screen lifecycle and
//! action dispatch.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use peerly_core::alerts::ActiveAlert;
use peerly_core::{AppContext, PageId, PageOutcome, Session};

use crate::action::{Action, ScreenTx};
use crate::bridge::spawn_bridge;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::Section;
use crate::screens::{self, home::HomeScreen, message::MessageScreen};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::overlay;
use crate::widgets::text_field::TextField;

/// What fills the content area.
enum Active {
    /// The persistent home screen.
    Home,
    /// A routed screen, rebuilt on every navigation.
    Page(Box<dyn Component>),
}

/// A navigation that has been started but not finished.
#[derive(Debug, Clone)]
struct Pending {
    generation: u64,
    target: String,
    /// Push the current location onto the history when it lands.
    record: bool,
}

/// Prompt input as a location: trimmed, with a leading `/`.
fn normalize_target(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        None
    } else if input.starts_with('/') {
        Some(input.to_owned())
    } else {
        Some(format!("/{input}"))
    }
}

/// Top-level application state and event loop.
pub struct App {
    ctx: AppContext,
    running: bool,
    /// Location of the screen on display.
    location: String,
    history: Vec<String>,
    nav_generation: u64,
    pending: Option<Pending>,
    /// Id handed to the most recent routed screen.
    screen_seq: u64,
    active: Active,
    home: HomeScreen,
    session: Session,
    alert: Option<ActiveAlert>,
    help_visible: bool,
    /// The `:` location prompt.
    prompt: Option<TextField>,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    bridge_cancel: CancellationToken,
}

impl App {
    pub fn new(ctx: AppContext) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let session = ctx.session.current();
        Self {
            ctx,
            running: true,
            location: "/".into(),
            history: Vec::new(),
            nav_generation: 0,
            pending: None,
            screen_seq: 0,
            active: Active::Home,
            home: HomeScreen::new(),
            session,
            alert: None,
            help_visible: false,
            prompt: None,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            bridge_cancel: CancellationToken::new(),
        }
    }

    /// Run the main event loop until quit. `start` is the first location.
    pub async fn run(&mut self, start: &str) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));

        tokio::spawn(spawn_bridge(
            self.ctx.clone(),
            self.action_tx.clone(),
            self.bridge_cancel.clone(),
        ));
        self.start_navigation(start.to_owned(), false);

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(start, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                let render = matches!(action, Action::Render);
                self.process_action(action)?;
                if render {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.bridge_cancel.cancel();
        if let Active::Page(screen) = &mut self.active {
            screen.unmount();
        }
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Resolve and load `target` in the background. Any navigation still
    /// in flight is superseded.
    fn start_navigation(&mut self, target: String, record: bool) {
        self.nav_generation += 1;
        let generation = self.nav_generation;
        debug!(generation, target = %target, "navigating");
        self.pending = Some(Pending {
            generation,
            target: target.clone(),
            record,
        });

        let ctx = self.ctx.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let outcome = ctx.navigate(&target).await;
            let _ = tx.send(Action::PageLoaded {
                generation,
                target,
                outcome,
            });
        });
    }

    fn finish_navigation(&mut self, generation: u64, target: String, outcome: PageOutcome) -> Result<()> {
        let Some(pending) = self.pending.take_if(|p| p.generation == generation) else {
            debug!(generation, target = %target, "stale navigation ignored");
            return Ok(());
        };

        match outcome {
            PageOutcome::Redirect { to, reason } => {
                debug!(from = %target, to = %to, ?reason, "following redirect");
                self.start_navigation(to, pending.record);
                return Ok(());
            }
            PageOutcome::Ready(page) => match page.page() {
                PageId::Logout => {
                    self.ctx.logout();
                    self.start_navigation(peerly_core::routes::LOGIN_PATH.into(), false);
                    return Ok(());
                }
                PageId::Root | PageId::Home => self.set_active(Active::Home)?,
                _ => {
                    // The store, not the bridged copy, so a fresh login is seen.
                    let session = self.ctx.session.current();
                    let screen = screens::build(page, &self.ctx, &session);
                    self.set_active(Active::Page(screen))?;
                }
            },
            PageOutcome::NotFound { path } => {
                warn!(path = %path, "no route matched");
                self.set_active(Active::Page(Box::new(MessageScreen::not_found(path))))?;
            }
            PageOutcome::Failed {
                page,
                status,
                message,
            } => {
                warn!(%page, ?status, message = %message, "page failed to load");
                let screen = MessageScreen::failed(page, status, message);
                self.set_active(Active::Page(Box::new(screen)))?;
            }
        }

        if pending.record && self.location != target {
            let previous = std::mem::replace(&mut self.location, target);
            self.history.push(previous);
        } else {
            self.location = target;
        }
        Ok(())
    }

    /// Swap the content screen. The old routed screen is unmounted so its
    /// in-flight work is dropped.
    fn set_active(&mut self, next: Active) -> Result<()> {
        if let Active::Page(old) = &mut self.active {
            old.unmount();
        }
        self.active = next;
        if let Active::Page(screen) = &mut self.active {
            self.screen_seq += 1;
            screen.init(ScreenTx::new(self.action_tx.clone(), self.screen_seq))?;
            debug!(screen = screen.id(), id = self.screen_seq, "screen mounted");
        }
        Ok(())
    }

    fn active_component(&mut self) -> &mut dyn Component {
        match &mut self.active {
            Active::Home => &mut self.home,
            Active::Page(screen) => screen.as_mut(),
        }
    }

    fn current_section(&self) -> Option<Section> {
        Section::for_path(&self.location)
    }

    // ── Input ───────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
            return Ok(Some(Action::Quit));
        }

        if let Some(prompt) = self.prompt.as_mut() {
            match key.code {
                KeyCode::Esc => self.prompt = None,
                KeyCode::Enter => {
                    let target = normalize_target(prompt.value());
                    self.prompt = None;
                    return Ok(target.map(Action::Navigate));
                }
                _ => {
                    prompt.handle_key(key);
                }
            }
            return Ok(None);
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        if self.active_component().captures_input() {
            return self.active_component().handle_key_event(key);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char(':')) => return Ok(Some(Action::OpenPrompt)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                let n = u8::try_from(c).unwrap_or(b'0') - b'0';
                if let Some(section) = Section::from_number(n) {
                    return Ok(Some(Action::Navigate(section.path().into())));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                let next = self.current_section().map_or(Section::Home, Section::next);
                return Ok(Some(Action::Navigate(next.path().into())));
            }
            (_, KeyCode::BackTab) => {
                let prev = self.current_section().map_or(Section::Home, Section::prev);
                return Ok(Some(Action::Navigate(prev.path().into())));
            }
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),
            (KeyModifiers::NONE, KeyCode::Char('x')) if self.alert.is_some() => {
                return Ok(Some(Action::DismissAlert));
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('R')) => {
                return Ok(Some(Action::Reload));
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('L')) => {
                return Ok(Some(Action::Logout));
            }
            _ => {}
        }

        self.active_component().handle_key_event(key)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        self.active_component().handle_mouse_event(mouse)
    }

    // ── Actions ─────────────────────────────────────────────────────

    fn process_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Resize(w, h) => self.terminal_size = (w, h),
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::OpenPrompt => self.prompt = Some(TextField::new(self.location.clone())),
            Action::Render => {}

            Action::Navigate(target) => self.start_navigation(target, true),
            Action::GoBack => {
                if let Some(previous) = self.history.pop() {
                    self.start_navigation(previous, false);
                }
            }
            Action::Reload => self.start_navigation(self.location.clone(), false),
            Action::PageLoaded {
                generation,
                target,
                outcome,
            } => self.finish_navigation(generation, target, outcome)?,

            Action::Login {
                user_name,
                password,
                redirect,
            } => {
                let ctx = self.ctx.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let action = match ctx.login(&user_name, &password).await {
                        Ok(session) => {
                            info!(user = %session.user.name, "logged in");
                            Action::Navigate(redirect)
                        }
                        Err(e) => {
                            warn!(user = %user_name, error = %e, "login failed");
                            Action::LoginFailed(e.user_message("Login failed"))
                        }
                    };
                    let _ = tx.send(action);
                });
            }
            Action::Logout => self.start_navigation("/logout".into(), false),

            Action::AlertChanged(alert) => self.alert = alert,
            Action::DismissAlert => self.ctx.alerts.dismiss(),

            Action::Screen { screen, update } => {
                let current = matches!(self.active, Active::Page(_)) && screen == self.screen_seq;
                if !current {
                    debug!(screen, active = self.screen_seq, "dropped update for unmounted screen");
                    return Ok(());
                }
                if let Some(follow_up) = self.active_component().apply(update)? {
                    self.action_tx.send(follow_up)?;
                }
            }

            // Session and domain events reach home even while it is hidden.
            other @ (Action::SessionChanged(_) | Action::DomainEvent(_)) => {
                if let Action::SessionChanged(session) = &other {
                    self.session = session.clone();
                }
                self.home.update(&other)?;
                if let Active::Page(screen) = &mut self.active {
                    if let Some(follow_up) = screen.update(&other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            other @ (Action::Tick | Action::LoginFailed(_)) => {
                if let Some(follow_up) = self.active_component().update(&other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let alert_height = if self.alert.is_some() { 3 } else { 0 };

        let [alert_area, content_area, tab_area, status_area] = Layout::vertical([
            Constraint::Length(alert_height),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(alert) = &self.alert {
            render_alert(frame, alert_area, alert);
        }

        match &self.active {
            Active::Home => self.home.render(frame, content_area),
            Active::Page(screen) => screen.render(frame, content_area),
        }

        self.render_tab_bar(frame, tab_area);
        self.render_status_bar(frame, status_area);

        if self.help_visible {
            render_help_overlay(frame, area);
        }
        if let Some(prompt) = &self.prompt {
            let rect = overlay::centered(area, 64, 3);
            let inner = overlay::dialog(frame, rect, "Go to", theme::ACCENT);
            prompt.render(frame, inner, " :", true);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Section::ALL
            .iter()
            .map(|&section| {
                let style = if Some(section) == self.current_section() {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", section.number(), section.label()),
                    style,
                ))
            })
            .collect();

        let mut tabs = Tabs::new(titles).divider(Span::styled(" ", theme::key_hint()));
        if let Some(index) = self
            .current_section()
            .and_then(|s| Section::ALL.iter().position(|&x| x == s))
        {
            tabs = tabs.select(index);
        }
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let session = if self.session.authenticated {
            Span::styled(
                format!(
                    "● {} ({})",
                    self.session.user.display_name(),
                    self.session.role()
                ),
                Style::default().fg(theme::SUCCESS_GREEN),
            )
        } else {
            Span::styled("○ guest", Style::default().fg(theme::MUTED))
        };

        let mut spans = vec![
            Span::raw(" "),
            session,
            Span::styled(" │ ", theme::key_hint()),
            Span::styled(self.location.clone(), Style::default().fg(theme::TEXT)),
        ];
        if let Some(pending) = &self.pending {
            spans.push(Span::styled(
                format!("  ◐ loading {}", pending.target),
                Style::default().fg(theme::AMBER),
            ));
        }
        let hints = if self.terminal_size.0 < 80 {
            " │ ? help"
        } else {
            " │ ? help  : go  q quit"
        };
        spans.push(Span::styled(hints, theme::key_hint()));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn render_alert(frame: &mut Frame, area: Rect, alert: &ActiveAlert) {
    let (color, icon) = theme::alert_style(alert.alert.variant);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(alert.alert.message.clone(), Style::default().fg(theme::TEXT)),
        Span::styled("   x ", theme::key_hint_key()),
        Span::styled("dismiss", theme::key_hint()),
    ]);
    frame.render_widget(Paragraph::new(line).block(block).wrap(Wrap { trim: true }), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let rect = overlay::centered(area, 60, 24);
    let inner = overlay::dialog(frame, rect, "Keyboard Shortcuts", theme::ACCENT);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(theme::TEAL)));
    let row = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(key, theme::key_hint_key()),
            Span::styled(desc, theme::key_hint()),
        ])
    };

    let help_text = vec![
        heading("  Navigation"),
        Line::from(Span::styled("  ──────────", theme::key_hint())),
        row("  1-3       ", "Home / Assignments / Duties"),
        row("  Tab       ", "Next section"),
        row("  :         ", "Go to a location"),
        row("  Esc       ", "Back"),
        row("  R         ", "Reload page"),
        Line::from(""),
        heading("  Tables"),
        Line::from(Span::styled("  ──────", theme::key_hint())),
        row("  j/k ↑/↓   ", "Move up/down"),
        row("  g/G       ", "Top / bottom"),
        row("  h/l       ", "Pick column"),
        row("  s  f  a   ", "Sort / filter / row actions"),
        row("  [ ]       ", "Previous / next page"),
        Line::from(""),
        heading("  Session"),
        Line::from(Span::styled("  ───────", theme::key_hint())),
        row("  L         ", "Log out"),
        row("  x         ", "Dismiss alert"),
        row("  q         ", "Quit"),
        Line::from(""),
        Line::from(Span::styled("                         Esc or ? to close", theme::key_hint())),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peerly_core::AppConfig;
    use pretty_assertions::assert_eq;

    fn app() -> App {
        let url = peerly_config::parse_server("http://localhost:3002").unwrap();
        let ctx = AppContext::from_config(&AppConfig::new(url)).unwrap();
        App::new(ctx)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn prompt_targets_are_normalized() {
        assert_eq!(normalize_target(" duties "), Some("/duties".into()));
        assert_eq!(normalize_target("/courses/3/assignments"), Some("/courses/3/assignments".into()));
        assert_eq!(normalize_target("   "), None);
    }

    #[tokio::test]
    async fn section_keys_navigate() {
        let mut app = app();
        let action = app.handle_key_event(press(KeyCode::Char('3'))).unwrap();
        assert!(matches!(action, Some(Action::Navigate(ref to)) if to == "/duties"));

        let action = app.handle_key_event(press(KeyCode::Tab)).unwrap();
        assert!(matches!(action, Some(Action::Navigate(ref to)) if to == "/assignments"));
    }

    #[tokio::test]
    async fn prompt_captures_keys_until_enter() {
        let mut app = app();
        app.process_action(Action::OpenPrompt).unwrap();
        assert_eq!(app.prompt.as_ref().unwrap().value(), "/");

        for c in "duties".chars() {
            assert!(app.handle_key_event(press(KeyCode::Char(c))).unwrap().is_none());
        }
        let action = app.handle_key_event(press(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::Navigate(ref to)) if to == "/duties"));
        assert!(app.prompt.is_none());
    }

    #[tokio::test]
    async fn stale_page_loads_are_ignored() {
        let mut app = app();
        app.start_navigation("/duties".into(), true);
        let stale = app.nav_generation;
        app.start_navigation("/assignments".into(), true);

        app.process_action(Action::PageLoaded {
            generation: stale,
            target: "/duties".into(),
            outcome: PageOutcome::NotFound {
                path: "/duties".into(),
            },
        })
        .unwrap();

        assert_eq!(app.location, "/");
        assert!(matches!(app.active, Active::Home));
        assert_eq!(app.pending.as_ref().unwrap().target, "/assignments");
    }

    #[tokio::test]
    async fn not_found_replaces_screen_and_records_history() {
        let mut app = app();
        app.start_navigation("/nowhere".into(), true);
        let generation = app.nav_generation;
        app.process_action(Action::PageLoaded {
            generation,
            target: "/nowhere".into(),
            outcome: PageOutcome::NotFound {
                path: "/nowhere".into(),
            },
        })
        .unwrap();

        assert_eq!(app.location, "/nowhere");
        assert_eq!(app.history, vec!["/".to_owned()]);
        assert!(matches!(app.active, Active::Page(_)));
        assert_eq!(app.screen_seq, 1);
    }

    #[tokio::test]
    async fn updates_for_replaced_screens_are_dropped() {
        let mut app = app();
        app.set_active(Active::Page(Box::new(MessageScreen::not_found("/a".into()))))
            .unwrap();
        app.set_active(Active::Page(Box::new(MessageScreen::not_found("/b".into()))))
            .unwrap();

        // Screen 1 is gone; its result must not reach screen 2.
        app.process_action(Action::Screen {
            screen: 1,
            update: crate::action::ScreenUpdate::Saved(Ok(serde_json::json!({}))),
        })
        .unwrap();
        assert_eq!(app.screen_seq, 2);
    }
}
