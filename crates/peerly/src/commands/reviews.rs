//! Review report command handlers.

use peerly_core::AppContext;
use peerly_core::pages::review_report::{ReviewReportPage, parse_grade};

use crate::cli::{GlobalOpts, ReviewsArgs, ReviewsCommand};
use crate::error::CliError;

use super::util;

fn report_route(assignment_id: i64) -> String {
    format!("/assignments/{assignment_id}/review")
}

async fn load_report(
    ctx: &AppContext,
    assignment_id: i64,
    profile: &str,
) -> Result<ReviewReportPage, CliError> {
    util::guard(ctx, &report_route(assignment_id), profile)?;
    let report = ReviewReportPage::fetch(&ctx.client, assignment_id).await?;
    Ok(ReviewReportPage::new(assignment_id, report))
}

pub async fn handle(
    ctx: &AppContext,
    args: ReviewsArgs,
    global: &GlobalOpts,
    profile: &str,
) -> Result<(), CliError> {
    match args.command {
        ReviewsCommand::Show {
            assignment_id,
            mut table,
        } => {
            let mut page = load_report(ctx, assignment_id, profile).await?;
            if let Some(term) = table.search.take() {
                page.set_search(&term);
            }
            table.all = table.all || !page.show_pagination();
            let t = page.table_mut();
            util::apply_table_args(t, &table)?;
            util::print_table(t, &table, global)
        }

        ReviewsCommand::Grade {
            assignment_id,
            review_id,
            grade,
            comment,
        } => {
            let grade = parse_grade(&grade)?;
            let mut page = load_report(ctx, assignment_id, profile).await?;
            if !page.rows().iter().any(|r| r.id == review_id) {
                return Err(CliError::NotFound {
                    resource_type: "review".into(),
                    identifier: review_id.to_string(),
                    list_command: format!("reviews show {assignment_id}"),
                });
            }
            let result = page
                .update_grade(&ctx.client, &ctx.alerts, review_id, grade, &comment)
                .await;
            util::report_alert(ctx, global);
            result.map_err(CliError::from)
        }

        ReviewsCommand::Export {
            assignment_id,
            file,
        } => {
            let page = load_report(ctx, assignment_id, profile).await?;
            page.export_csv(&file)?;
            if !global.quiet {
                eprintln!(
                    "✓ Exported {} rows to {}",
                    page.rows().len(),
                    file.display()
                );
            }
            Ok(())
        }
    }
}
