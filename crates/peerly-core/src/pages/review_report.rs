// ── Review report ──
//
// Per-assignment review report: search, sortable score/volume columns,
// grade assignment and CSV export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use peerly_api::ResourceClient;

use crate::alerts::{Alert, AlertBus};
use crate::columns::review_report_columns;
use crate::editor::FieldErrors;
use crate::error::CoreError;
use crate::model::{GradeUpdate, ReviewReport, ReviewRow, TeamStatus};
use crate::routes::{LoadedPage, LoaderId};
use crate::table::{Table, TableOptions};

pub const GRADE_UPDATED: &str = "Grade updated successfully";
pub const GRADE_FAILED: &str = "Failed to update grade";
pub const DEFAULT_EXPORT_FILE: &str = "review_report.csv";
pub const CSV_HEADERS: [&str; 6] = [
    "Reviewer Name",
    "Reviewer Username",
    "Team Reviewed",
    "Score",
    "Assigned Grade",
    "Instructor Comment",
];

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Pagination appears only once the filtered set reaches this size.
const PAGINATION_THRESHOLD: usize = 10;

/// Parse a grade field: blank clears the grade, otherwise a number in
/// `0..=100`.
pub fn parse_grade(input: &str) -> Result<Option<f64>, CoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    match input.parse::<f64>() {
        Ok(grade) if (0.0..=100.0).contains(&grade) => Ok(Some(grade)),
        _ => Err(CoreError::Validation(FieldErrors::single(
            "assigned_grade",
            "Grade must be a number between 0 and 100",
        ))),
    }
}

/// One grade edit, detached from the page so it can be sent from a
/// spawned task.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeChange {
    pub review_id: i64,
    pub grade: Option<f64>,
    pub comment: String,
}

impl GradeChange {
    pub fn new(review_id: i64, grade: Option<f64>, comment: &str) -> Self {
        Self {
            review_id,
            grade,
            comment: comment.to_owned(),
        }
    }

    pub async fn send(&self, client: &ResourceClient) -> Result<(), CoreError> {
        let body = GradeUpdate {
            assigned_grade: self.grade,
            instructor_comment: self.comment.clone(),
        };
        let path = format!("review_reports/{}/update_grade", self.review_id);
        client.patch_json::<Value, _>(&path, &body).await?;
        Ok(())
    }
}

pub struct ReviewReportPage {
    assignment_id: i64,
    rows: Vec<ReviewRow>,
    average_volume: f64,
    search: String,
    table: Table<ReviewRow>,
}

impl ReviewReportPage {
    pub fn new(assignment_id: i64, report: ReviewReport) -> Self {
        let options = TableOptions {
            global_filter: false,
            ..TableOptions::default()
        };
        let mut page = Self {
            assignment_id,
            rows: report.report_data,
            average_volume: report.average_volume,
            search: String::new(),
            table: Table::new(review_report_columns(report.average_volume), options),
        };
        page.sync_table();
        page
    }

    /// Build from the route's loader data.
    pub fn from_loaded(page: &LoadedPage) -> Result<Self, CoreError> {
        let assignment_id = page.route.param_id("id").unwrap_or_default();
        let value = page.get(LoaderId::ReviewReport).cloned().unwrap_or(Value::Null);
        let report: ReviewReport = serde_json::from_value(value).map_err(|e| CoreError::Api {
            message: format!("unexpected review report: {e}"),
        })?;
        Ok(Self::new(assignment_id, report))
    }

    pub async fn fetch(client: &ResourceClient, assignment_id: i64) -> Result<ReviewReport, CoreError> {
        Ok(client.read("review_reports", assignment_id).await?)
    }

    pub fn assignment_id(&self) -> i64 {
        self.assignment_id
    }

    pub fn average_volume(&self) -> f64 {
        self.average_volume
    }

    pub fn rows(&self) -> &[ReviewRow] {
        &self.rows
    }

    pub fn table(&self) -> &Table<ReviewRow> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table<ReviewRow> {
        &mut self.table
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Case-insensitive match on reviewer name or username.
    pub fn set_search(&mut self, term: &str) {
        if self.search != term {
            term.clone_into(&mut self.search);
            self.table.set_page(0);
            self.sync_table();
        }
    }

    pub fn filtered(&self) -> Vec<&ReviewRow> {
        self.rows.iter().filter(|r| r.matches_search(&self.search)).collect()
    }

    pub fn show_pagination(&self) -> bool {
        self.filtered().len() >= PAGINATION_THRESHOLD
    }

    fn sync_table(&mut self) {
        let rows = self.filtered().into_iter().cloned().collect();
        self.table.set_rows(rows);
    }

    // ── Grades ──

    /// `PATCH /review_reports/<id>/update_grade`. Success updates the row
    /// in place; either way an alert is published.
    pub async fn update_grade(
        &mut self,
        client: &ResourceClient,
        alerts: &AlertBus,
        review_id: i64,
        grade: Option<f64>,
        comment: &str,
    ) -> Result<(), CoreError> {
        let change = GradeChange::new(review_id, grade, comment);
        let result = change.send(client).await;
        self.complete_grade(&change, result, alerts)
    }

    /// Apply a finished grade request.
    pub fn complete_grade(
        &mut self,
        change: &GradeChange,
        result: Result<(), CoreError>,
        alerts: &AlertBus,
    ) -> Result<(), CoreError> {
        match result {
            Ok(()) => {
                self.apply_grade(change.review_id, change.grade, &change.comment);
                info!(review_id = change.review_id, grade = ?change.grade, "grade updated");
                alerts.show(Alert::success(GRADE_UPDATED));
                Ok(())
            }
            Err(e) => {
                warn!(review_id = change.review_id, error = %e, "grade update failed");
                alerts.show(Alert::danger(GRADE_FAILED));
                Err(e)
            }
        }
    }

    fn apply_grade(&mut self, review_id: i64, grade: Option<f64>, comment: &str) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.id == review_id) {
            row.assigned_grade = grade;
            row.instructor_comment = Some(comment.to_owned());
            row.team_reviewed_status = TeamStatus::Brown;
        }
        self.sync_table();
    }

    // ── Export ──

    /// Write every row (ignoring the search) as CSV. Text fields are
    /// always quoted; numbers are not, and a missing number is a bare
    /// empty field.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), CoreError> {
        let export = |e: &dyn std::fmt::Display| CoreError::Export {
            message: e.to_string(),
        };
        let number = |n: Option<f64>| n.map(|n| n.to_string()).unwrap_or_default();

        // Quoting is decided per column, so the writer itself never quotes.
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);
        writer.write_record(CSV_HEADERS).map_err(|e| export(&e))?;
        for row in &self.rows {
            writer
                .write_record([
                    quoted(&row.reviewer_name),
                    quoted(&row.reviewer_username),
                    quoted(&row.team_reviewed_name),
                    number(row.calculated_score),
                    number(row.assigned_grade),
                    quoted(row.instructor_comment.as_deref().unwrap_or_default()),
                ])
                .map_err(|e| export(&e))?;
        }
        writer.flush().map_err(|e| export(&e))?;
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<(), CoreError> {
        let file = File::create(path).map_err(|e| CoreError::Export {
            message: format!("{}: {e}", path.display()),
        })?;
        self.write_csv(file)?;
        info!(path = %path.display(), rows = self.rows.len(), "review report exported");
        Ok(())
    }
}
