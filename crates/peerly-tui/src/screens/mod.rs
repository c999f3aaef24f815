//! Routed screens and the helpers they share.

pub mod assignments;
pub mod duties;
pub mod duty_form;
pub mod home;
pub mod login;
pub mod message;
pub mod page;
pub mod review_report;

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use serde_json::Value;
use tracing::debug;

use peerly_core::editor::DeleteConfirmation;
use peerly_core::{AppContext, CoreError, LoadedPage, Mutation, PageId, Session};

use crate::action::{ScreenTx, ScreenUpdate};
use crate::component::Component;
use crate::theme;
use crate::widgets::overlay;

/// The screen for a loaded page. Home and logout are handled by the app.
pub fn build(page: LoadedPage, ctx: &AppContext, session: &Session) -> Box<dyn Component> {
    let user_id = session.user_id().unwrap_or_default();
    match page.page() {
        PageId::Login => {
            let redirect = page.route.query_param("from").unwrap_or("/").to_owned();
            Box::new(login::LoginScreen::new(redirect))
        }
        PageId::Duties => Box::new(duties::DutiesScreen::new(ctx.clone(), user_id)),
        PageId::DutyEditor => match peerly_core::pages::duties::routed_duty_editor(&page, user_id) {
            Ok(editor) => Box::new(duties::DutyEditorScreen::new(ctx.clone(), editor)),
            Err(e) => Box::new(message::MessageScreen::failed(
                PageId::DutyEditor,
                e.status(),
                e.user_message("Failed to load duty"),
            )),
        },
        PageId::Assignments => Box::new(assignments::AssignmentsScreen::all(ctx.clone())),
        PageId::CourseAssignments => match page.route.param_id("id") {
            Some(course_id) => Box::new(assignments::AssignmentsScreen::course(ctx.clone(), course_id)),
            None => Box::new(message::MessageScreen::not_found(page.route.path)),
        },
        PageId::ReviewReport => {
            match peerly_core::pages::review_report::ReviewReportPage::from_loaded(&page) {
                Ok(report) => Box::new(review_report::ReviewReportScreen::new(ctx.clone(), report)),
                Err(e) => Box::new(message::MessageScreen::failed(
                    PageId::ReviewReport,
                    e.status(),
                    e.user_message("Failed to load review report"),
                )),
            }
        }
        _ => Box::new(page::PageScreen::new(page)),
    }
}

/// Run a prepared write in the background and hand its result back
/// through `wrap`.
pub fn spawn_mutation(
    ctx: &AppContext,
    tx: &ScreenTx,
    mutation: Mutation,
    wrap: fn(Result<Value, CoreError>) -> ScreenUpdate,
) {
    let client = Arc::clone(&ctx.client);
    let tx = tx.clone();
    debug!(screen = tx.screen(), ?mutation, "mutation started");
    tokio::spawn(async move {
        let result = mutation.execute(&client).await;
        tx.update(wrap(result));
    });
}

/// Centered confirmation for a pending delete.
pub fn render_delete_dialog(frame: &mut Frame, area: Rect, dialog: &DeleteConfirmation) {
    let rect = overlay::centered(area, 56, 7);
    let inner = overlay::dialog(frame, rect, "Confirm", theme::AMBER);

    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", dialog.prompt()), Style::default().fg(theme::TEXT))),
        Line::from(""),
    ];
    if let Some(error) = dialog.error() {
        lines.push(Line::from(Span::styled(format!(" {error}"), theme::field_error())));
    }
    if dialog.modal().is_submitting() {
        lines.push(Line::from(Span::styled(" Deleting…", theme::key_hint())));
    } else {
        lines.push(Line::from(vec![
            Span::styled(" y ", theme::key_hint_key()),
            Span::styled("delete    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
