//! Assignment command handlers.

use peerly_core::AppContext;
use peerly_core::pages::assignments::{ASSIGNMENTS_ROUTE, AssignmentsPage};

use crate::cli::{AssignmentsArgs, AssignmentsCommand, GlobalOpts};
use crate::error::CliError;

use super::util;

async fn load_page(ctx: &AppContext, profile: &str) -> Result<AssignmentsPage, CliError> {
    util::guard(ctx, ASSIGNMENTS_ROUTE, profile)?;
    let mut page = AssignmentsPage::new();
    let ticket = util::first_ticket(page.page_mut())?;
    let result = AssignmentsPage::fetch(&ctx.client).await;
    util::apply_fetch(page.page_mut(), &ticket, result, ctx)?;
    Ok(page)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &AppContext,
    args: AssignmentsArgs,
    global: &GlobalOpts,
    profile: &str,
) -> Result<(), CliError> {
    match args.command {
        AssignmentsCommand::List(table) => {
            let mut page = load_page(ctx, profile).await?;
            let t = page.page_mut().table_mut();
            util::apply_table_args(t, &table)?;
            util::print_table(t, &table, global)
        }

        AssignmentsCommand::Delete { id } => {
            let mut page = load_page(ctx, profile).await?;
            page.handle_action(id, "delete");
            let prompt = page
                .page()
                .delete_dialog()
                .map(|d| d.prompt())
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "assignment".into(),
                    identifier: id.to_string(),
                    list_command: "assignments list".into(),
                })?;
            if !util::confirm(&prompt, global.yes)? {
                page.page_mut().cancel_delete();
                return Ok(());
            }
            let outcome = page.confirm_delete(ctx).await?;
            util::finish_delete(outcome, ctx, global)
        }
    }
}
