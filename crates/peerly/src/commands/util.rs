//! Shared helpers for command handlers.

use serde::Serialize;

use peerly_core::editor::DeleteResult;
use peerly_core::pages::ResourcePage;
use peerly_core::{
    AppContext, CoreError, FetchTicket, RedirectReason, Resolution, Session, Table, TableRow,
};

use crate::cli::{GlobalOpts, TableArgs};
use crate::error::CliError;
use crate::output;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Route guard ─────────────────────────────────────────────────────

/// Run the route guard for `path` against the current session, the
/// same check the UI makes before rendering the page.
pub fn guard(ctx: &AppContext, path: &str, profile: &str) -> Result<Session, CliError> {
    let session = ctx.session.current();
    match ctx.routes.resolve(path, &session) {
        Resolution::Redirect {
            reason: RedirectReason::Login,
            ..
        } => Err(CliError::NotLoggedIn {
            profile: profile.into(),
        }),
        Resolution::Redirect {
            reason: RedirectReason::Unauthorized,
            ..
        } => Err(CliError::Forbidden { path: path.into() }),
        Resolution::NotFound { path } => Err(CliError::NotFound {
            resource_type: "route".into(),
            identifier: path,
            list_command: "routes list".into(),
        }),
        Resolution::Render(_)
        | Resolution::Redirect {
            reason: RedirectReason::Navigate,
            ..
        } => Ok(session),
    }
}

// ── List pages ──────────────────────────────────────────────────────

/// Mount a page and take its first fetch ticket.
pub fn first_ticket<R: TableRow + Clone>(
    page: &mut ResourcePage<R>,
) -> Result<FetchTicket, CliError> {
    page.mount();
    page.begin_fetch().ok_or_else(|| CliError::ApiError {
        status: None,
        message: format!("{} list is not ready to fetch", page.resource().singular),
    })
}

/// Apply a fetch result to a page, surfacing errors instead of the
/// alert the UI would show.
pub fn apply_fetch<R: TableRow + Clone>(
    page: &mut ResourcePage<R>,
    ticket: &FetchTicket,
    result: Result<Vec<R>, CoreError>,
    ctx: &AppContext,
) -> Result<(), CliError> {
    let rows = result?;
    page.finish_fetch(ticket, Ok(rows), &ctx.alerts);
    Ok(())
}

/// Apply `--sort`, `--filter`, `--search`, `--show` and `--page`.
pub fn apply_table_args<T: TableRow>(table: &mut Table<T>, args: &TableArgs) -> Result<(), CliError> {
    for column in &args.show {
        table.set_visible(column, true);
    }
    for column in &args.sort {
        table.toggle_sort(column);
    }
    for filter in &args.filter {
        let (column, text) = filter.split_once('=').ok_or_else(|| CliError::Validation {
            field: "filter".into(),
            reason: format!("expected COLUMN=TEXT, got '{filter}'"),
        })?;
        table.set_column_filter(column.trim(), text);
    }
    if let Some(search) = &args.search {
        table.set_global_filter(search);
    }
    table.set_page(args.page.saturating_sub(1));
    Ok(())
}

/// Render a table page (or every page with `--all`) and print it.
pub fn print_table<T: TableRow + Serialize>(
    table: &mut Table<T>,
    args: &TableArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut view = table.view();
    if args.all {
        let current = table.page_index();
        for index in 1..table.page_count() {
            table.set_page(index);
            view.rows.extend(table.view().rows);
        }
        table.set_page(current);
        view.page.index = 0;
        view.page.count = 1;
    }
    let data: Vec<&T> = view.rows.iter().filter_map(|r| table.row(r.id)).collect();
    let out = output::render_view(global.output, &view, &data)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Print whatever the core left on the alert bus.
pub fn report_alert(ctx: &AppContext, global: &GlobalOpts) {
    if let Some(alert) = ctx.alerts.current() {
        output::print_alert(&alert, output::should_color(global.color), global.quiet);
    }
}

/// Turn a delete dialog's outcome into a CLI result.
pub fn finish_delete(
    outcome: Option<DeleteResult>,
    ctx: &AppContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match outcome {
        Some(DeleteResult::Deleted { .. }) => {
            report_alert(ctx, global);
            Ok(())
        }
        Some(DeleteResult::Failed(message)) => Err(CliError::ApiError {
            status: None,
            message,
        }),
        None => Ok(()),
    }
}
