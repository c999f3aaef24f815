// ── Column builders ──
//
// One function per entity. Each returns a fresh column list; actions
// produce `RowCommand`s for the owning page to carry out.

use crate::model::{Assignment, Duty, ReviewRow, UserDirectory};
use crate::table::{CellValue, ColumnDef, RowAction, RowCommand};

// ── Duties ───────────────────────────────────────────────────────────

pub fn duty_columns(creators: UserDirectory) -> Vec<ColumnDef<Duty>> {
    vec![
        ColumnDef::accessor("name", "Name", |d: &Duty| d.name.as_str().into()),
        ColumnDef::accessor("creator", "Creator", move |d: &Duty| {
            creators.name(d.instructor_id).into()
        })
        .filterable(false),
        ColumnDef::accessor("private", "Private", |d: &Duty| d.private.into())
            .sortable(false)
            .filterable(false),
        ColumnDef::actions(
            "actions",
            "Actions",
            vec![
                RowAction::new("edit", "Edit Duty", |d: &Duty| RowCommand::Edit(d.id)),
                RowAction::new("delete", "Delete Duty", |d: &Duty| RowCommand::Delete(d.id)),
            ],
        ),
    ]
}

// ── Assignments ──────────────────────────────────────────────────────

fn assignment_base(with_course: bool) -> Vec<ColumnDef<Assignment>> {
    let mut columns = vec![
        ColumnDef::accessor("id", "Id", |a: &Assignment| a.id.into()).hidden(),
        ColumnDef::accessor("name", "Name", |a: &Assignment| a.name.as_str().into()),
    ];
    if with_course {
        columns.push(ColumnDef::accessor("course_name", "Course Name", |a: &Assignment| {
            a.course_name.as_deref().into()
        }));
    }
    columns.push(ColumnDef::accessor("created_at", "Creation Date", |a: &Assignment| {
        CellValue::Text(a.created())
    }));
    columns.push(ColumnDef::accessor("updated_at", "Updated Date", |a: &Assignment| {
        CellValue::Text(a.updated())
    }));
    columns
}

/// Columns for the assignment list mounted at `base` (normally
/// `/assignments`).
pub fn assignment_columns(base: &str) -> Vec<ColumnDef<Assignment>> {
    let base = base.trim_end_matches('/').to_owned();
    let mut columns = assignment_base(true);
    columns.push(ColumnDef::actions(
        "actions",
        "Actions",
        vec![
            RowAction::new("edit", "Edit", move |a: &Assignment| {
                RowCommand::navigate(format!("{base}/edit/{}", a.id))
            }),
            RowAction::new("review", "Review", |a: &Assignment| {
                RowCommand::navigate(format!("/assignments/{}/review", a.id))
            }),
            RowAction::new("delete", "Delete", |a: &Assignment| RowCommand::Delete(a.id)),
        ],
    ));
    columns
}

fn assignment_link(id: &str, label: &str, suffix: &'static str) -> RowAction<Assignment> {
    RowAction::new(id, label, move |a: &Assignment| {
        RowCommand::navigate(format!("/assignments/edit/{}/{suffix}", a.id))
    })
}

/// Columns for a course's assignment list. `from` is the page to return
/// to after editing.
pub fn course_assignment_columns(from: &str) -> Vec<ColumnDef<Assignment>> {
    let from = from.to_owned();
    let mut columns = assignment_base(false);
    columns.push(ColumnDef::actions(
        "actions",
        "Actions",
        vec![
            RowAction::new("edit", "Edit", move |a: &Assignment| {
                RowCommand::navigate_from(format!("/assignments/edit/{}", a.id), from.clone())
            }),
            RowAction::new("delete", "Delete", |a: &Assignment| RowCommand::Delete(a.id)),
            assignment_link("add_participant", "Add Participant", "participants"),
            assignment_link("assign_reviewers", "Assign Reviewers", "assignreviewer"),
            assignment_link("create_teams", "Create Teams", "createteams"),
            assignment_link("view_review_report", "View Review Report", "viewreports"),
            assignment_link("view_scores", "View Scores", "viewscores"),
            assignment_link("view_submissions", "View Submissions", "viewsubmissions"),
            RowAction::new("copy", "Copy Assignment", |a: &Assignment| {
                RowCommand::Log(format!("copy assignment {}", a.id))
            }),
            RowAction::new("export", "Export", |a: &Assignment| {
                RowCommand::Log(format!("export assignment {}", a.id))
            }),
        ],
    ));
    columns
}

// ── Review report ────────────────────────────────────────────────────

fn scores_cell(row: &ReviewRow) -> String {
    if row.rounds.is_empty() {
        return "-".into();
    }
    row.rounds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn metrics_cell(row: &ReviewRow, average_volume: f64) -> String {
    if row.rounds.is_empty() {
        return "-".into();
    }
    let multi = row.rounds.len() > 1;
    row.rounds
        .iter()
        .map(|r| {
            let body = format!(
                "{} words ({average_volume:.1} Avg.), {} comments",
                r.review_volume, r.review_comment_count
            );
            if multi {
                format!("Round {}: {body}", r.round)
            } else {
                body
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn grade_cell(row: &ReviewRow) -> String {
    let grade = row
        .assigned_grade
        .map_or_else(|| "-".to_owned(), |g| format!("{g}"));
    match row.instructor_comment.as_deref().filter(|c| !c.is_empty()) {
        Some(comment) => format!("{grade}/100 ({comment})"),
        None => format!("{grade}/100"),
    }
}

pub fn review_report_columns(average_volume: f64) -> Vec<ColumnDef<ReviewRow>> {
    vec![
        ColumnDef::accessor("reviewer", "Reviewer", |r: &ReviewRow| {
            r.reviewer_name.as_str().into()
        })
        .render(|r: &ReviewRow| format!("{} ({})", r.reviewer_name, r.reviewer_username)),
        ColumnDef::accessor("reviews_done", "Reviews Done", |r: &ReviewRow| {
            i64::from(r.reviews_completed).into()
        })
        .render(|r: &ReviewRow| format!("{}/{}", r.reviews_completed, r.reviews_selected)),
        ColumnDef::accessor("team_reviewed", "Team reviewed", |r: &ReviewRow| {
            r.team_reviewed_name.as_str().into()
        })
        .render(|r: &ReviewRow| {
            let consent = if r.has_consent { " \u{2714}" } else { "" };
            format!(
                "{} [{}]{consent}",
                r.team_reviewed_name,
                r.team_reviewed_status.label()
            )
        }),
        ColumnDef::display("scores_awarded", "Scores Awarded", scores_cell)
            .sort_by(|a: &ReviewRow, b: &ReviewRow| a.score_key().total_cmp(&b.score_key())),
        ColumnDef::display("metrics", "Metrics (Volume)", move |r: &ReviewRow| {
            metrics_cell(r, average_volume)
        })
        .sort_by(|a: &ReviewRow, b: &ReviewRow| a.volume_key().cmp(&b.volume_key())),
        ColumnDef::display("assigned_grade", "Assigned grade", grade_cell),
    ]
}
