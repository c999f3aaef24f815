//! Course command handlers.

use peerly_core::pages::course_assignments::CourseAssignmentsPage;
use peerly_core::{AppContext, RowCommand};

use crate::cli::{CoursesArgs, CoursesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

async fn load_page(
    ctx: &AppContext,
    course_id: i64,
    profile: &str,
) -> Result<CourseAssignmentsPage, CliError> {
    util::guard(ctx, &CourseAssignmentsPage::route_for(course_id), profile)?;
    let mut page = CourseAssignmentsPage::new(course_id);
    let ticket = util::first_ticket(page.page_mut())?;
    let result = CourseAssignmentsPage::fetch(&ctx.client, course_id).await;
    util::apply_fetch(page.page_mut(), &ticket, result, ctx)?;
    Ok(page)
}

pub async fn handle(
    ctx: &AppContext,
    args: CoursesArgs,
    global: &GlobalOpts,
    profile: &str,
) -> Result<(), CliError> {
    match args.command {
        CoursesCommand::Assignments { course_id, table } => {
            let mut page = load_page(ctx, course_id, profile).await?;
            let t = page.page_mut().table_mut();
            util::apply_table_args(t, &table)?;
            util::print_table(t, &table, global)
        }

        CoursesCommand::Action {
            course_id,
            assignment_id,
            action,
        } => {
            let mut page = load_page(ctx, course_id, profile).await?;
            let command = page
                .handle_action(assignment_id, &action)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "assignment action".into(),
                    identifier: format!("{assignment_id}/{action}"),
                    list_command: format!("courses assignments {course_id}"),
                })?;

            match &command {
                RowCommand::Delete(_) => {
                    let prompt = page
                        .page()
                        .delete_dialog()
                        .map(|d| d.prompt())
                        .unwrap_or_default();
                    if !util::confirm(&prompt, global.yes)? {
                        page.page_mut().cancel_delete();
                        return Ok(());
                    }
                    let outcome = page.confirm_delete(ctx).await?;
                    util::finish_delete(outcome, ctx, global)
                }
                other => {
                    let out = output::render_single(
                        global.output,
                        other,
                        |c| match c {
                            RowCommand::Navigate(nav) => match &nav.from {
                                Some(from) => format!("{} (back to {from})", nav.to),
                                None => nav.to.clone(),
                            },
                            RowCommand::Log(message) => message.clone(),
                            RowCommand::Edit(id) | RowCommand::Delete(id) => id.to_string(),
                        },
                        |c| match c {
                            RowCommand::Navigate(nav) => nav.to.clone(),
                            _ => String::new(),
                        },
                    )?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
            }
        }
    }
}
