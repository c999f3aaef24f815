//! Duty command handlers.

use peerly_core::pages::duties::{DUTY_RESOURCE, DutiesPage};
use peerly_core::{AppContext, EditorResult};

use crate::cli::{DutiesArgs, DutiesCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

/// Mount a duties page for the acting user and load it.
async fn load_page(ctx: &AppContext, profile: &str) -> Result<DutiesPage, CliError> {
    let session = util::guard(ctx, DUTY_RESOURCE.list_route, profile)?;
    let mut page = DutiesPage::new(session.user.id);
    page.mount();
    let ticket = page.begin_fetch().ok_or_else(|| CliError::ApiError {
        status: None,
        message: "duty list is not ready to fetch".into(),
    })?;
    let listing = DutiesPage::fetch(&ctx.client, page.user_id()).await?;
    page.finish_fetch(&ticket, Ok(listing), ctx);
    Ok(page)
}

fn not_found(id: i64) -> CliError {
    CliError::NotFound {
        resource_type: "duty".into(),
        identifier: id.to_string(),
        list_command: "duties list".into(),
    }
}

/// Send the open editor and report the outcome.
async fn submit(page: &mut DutiesPage, ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    match page.submit_editor(ctx).await? {
        Some(EditorResult::Failed(message)) => Err(CliError::ApiError {
            status: None,
            message,
        }),
        Some(_) => {
            util::report_alert(ctx, global);
            Ok(())
        }
        None => Ok(()),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &AppContext,
    args: DutiesArgs,
    global: &GlobalOpts,
    profile: &str,
) -> Result<(), CliError> {
    match args.command {
        DutiesCommand::List(table) => {
            let mut page = load_page(ctx, profile).await?;
            let t = page.page_mut().table_mut();
            util::apply_table_args(t, &table)?;
            util::print_table(t, &table, global)
        }

        DutiesCommand::Create { name, private } => {
            let session = util::guard(ctx, DUTY_RESOURCE.list_route, profile)?;
            let mut page = DutiesPage::new(session.user.id);
            page.open_create();
            if let Some(editor) = page.editor_mut() {
                let form = editor.values_mut();
                form.name = name;
                form.private = private;
            }
            submit(&mut page, ctx, global).await
        }

        DutiesCommand::Update { id, name, private } => {
            let mut page = load_page(ctx, profile).await?;
            page.open_edit(id);
            let editor = page.editor_mut().ok_or_else(|| not_found(id))?;
            let form = editor.values_mut();
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(private) = private {
                form.private = private;
            }
            submit(&mut page, ctx, global).await
        }

        DutiesCommand::Delete { id } => {
            let mut page = load_page(ctx, profile).await?;
            page.open_delete(id);
            let prompt = page
                .page()
                .delete_dialog()
                .map(|d| d.prompt())
                .ok_or_else(|| not_found(id))?;
            if !util::confirm(&prompt, global.yes)? {
                page.cancel_modal();
                return Ok(());
            }
            let outcome = page.confirm_delete(ctx).await?;
            util::finish_delete(outcome, ctx, global)
        }
    }
}
