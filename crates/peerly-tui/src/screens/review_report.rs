//! Review report: searchable reviewer table with grading and CSV export.

use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing::warn;

use peerly_core::pages::review_report::{
    DEFAULT_EXPORT_FILE, GradeChange, ReviewReportPage, parse_grade,
};
use peerly_core::{Alert, AppContext, CoreError};

use crate::action::{Action, ScreenTx, ScreenUpdate};
use crate::component::Component;
use crate::theme;
use crate::widgets::data_table::{self, TableCursor};
use crate::widgets::overlay;
use crate::widgets::text_field::TextField;

// ── Grade form ───────────────────────────────────────────────────────

#[derive(Debug)]
struct GradeForm {
    review_id: i64,
    reviewer: String,
    grade: TextField,
    comment: TextField,
    on_comment: bool,
    error: Option<String>,
    saving: bool,
}

impl GradeForm {
    fn render(&self, frame: &mut Frame, area: Rect) {
        let rect = overlay::centered(area, 64, 9);
        let title = format!("Grade {}", self.reviewer);
        let inner = overlay::dialog(frame, rect, &title, theme::ACCENT);
        let [grade_area, comment_area, _, error_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.grade.render(frame, grade_area, " Grade  ", !self.on_comment);
        self.comment.render(frame, comment_area, " Comment", self.on_comment);
        if let Some(error) = &self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" {error}"), theme::field_error())),
                error_area,
            );
        }
        let hint = if self.saving {
            Line::from(Span::styled(" Saving…", theme::key_hint()))
        } else {
            data_table::hints(&[("Tab", "next field"), ("Enter", "save"), ("Esc", "cancel")])
        };
        frame.render_widget(Paragraph::new(hint), hint_area);
    }
}

enum Mode {
    Browse,
    Search(TextField),
    Grade(GradeForm),
    Export(TextField),
}

pub struct ReviewReportScreen {
    ctx: AppContext,
    tx: Option<ScreenTx>,
    page: ReviewReportPage,
    cursor: TableCursor,
    mode: Mode,
    reloading: bool,
}

impl ReviewReportScreen {
    pub fn new(ctx: AppContext, page: ReviewReportPage) -> Self {
        Self {
            ctx,
            tx: None,
            page,
            cursor: TableCursor::default(),
            mode: Mode::Browse,
            reloading: false,
        }
    }

    fn reload(&mut self) {
        let Some(tx) = self.tx.clone() else { return };
        self.reloading = true;
        let client = Arc::clone(&self.ctx.client);
        let id = self.page.assignment_id();
        tokio::spawn(async move {
            let result = ReviewReportPage::fetch(&client, id).await;
            tx.update(ScreenUpdate::ReportFetched(result));
        });
    }

    fn open_grade(&mut self) {
        let view = self.page.table().view();
        let Some(id) = self.cursor.selected_id(&view) else {
            return;
        };
        let Some(row) = self.page.rows().iter().find(|r| r.id == id) else {
            return;
        };
        let grade = row.assigned_grade.map(|g| g.to_string()).unwrap_or_default();
        self.mode = Mode::Grade(GradeForm {
            review_id: id,
            reviewer: row.reviewer_name.clone(),
            grade: TextField::new(grade),
            comment: TextField::new(row.instructor_comment.clone().unwrap_or_default()),
            on_comment: false,
            error: None,
            saving: false,
        });
    }

    fn submit_grade(&mut self) {
        let Mode::Grade(form) = &mut self.mode else { return };
        let Some(tx) = self.tx.clone() else { return };
        let grade = match parse_grade(form.grade.value()) {
            Ok(grade) => grade,
            Err(CoreError::Validation(errors)) => {
                form.error = errors.get("assigned_grade").map(str::to_owned);
                return;
            }
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        form.error = None;
        form.saving = true;
        let change = GradeChange::new(form.review_id, grade, form.comment.value());
        let client = Arc::clone(&self.ctx.client);
        tokio::spawn(async move {
            let result = change.send(&client).await;
            tx.update(ScreenUpdate::GradeSaved { change, result });
        });
    }

    fn export(&mut self, file: &str) {
        let file = file.trim();
        let path = PathBuf::from(if file.is_empty() { DEFAULT_EXPORT_FILE } else { file });
        match self.page.export_csv(&path) {
            Ok(()) => {
                self.ctx
                    .alerts
                    .show(Alert::success(format!("Exported to {}", path.display())));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.ctx.alerts.show(Alert::danger(e.to_string()));
            }
        }
    }

    fn handle_grade_key(&mut self, key: KeyEvent) {
        let Mode::Grade(form) = &mut self.mode else { return };
        if form.saving {
            return;
        }
        match key.code {
            KeyCode::Esc => self.mode = Mode::Browse,
            KeyCode::Enter => self.submit_grade(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.on_comment = !form.on_comment;
            }
            _ => {
                let field = if form.on_comment { &mut form.comment } else { &mut form.grade };
                field.handle_key(key);
            }
        }
    }
}

impl Component for ReviewReportScreen {
    fn init(&mut self, tx: ScreenTx) -> Result<()> {
        self.tx = Some(tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if matches!(self.mode, Mode::Grade(_)) {
            self.handle_grade_key(key);
            return Ok(None);
        }
        match &mut self.mode {
            Mode::Search(field) => {
                match key.code {
                    KeyCode::Esc => {
                        self.page.set_search("");
                        self.mode = Mode::Browse;
                    }
                    KeyCode::Enter => self.mode = Mode::Browse,
                    _ => {
                        if field.handle_key(key) {
                            let term = field.value().to_owned();
                            self.page.set_search(&term);
                        }
                    }
                }
                self.cursor.clamp(self.page.table());
                return Ok(None);
            }
            Mode::Export(field) => {
                match key.code {
                    KeyCode::Esc => self.mode = Mode::Browse,
                    KeyCode::Enter => {
                        let file = field.value().to_owned();
                        self.mode = Mode::Browse;
                        self.export(&file);
                    }
                    _ => {
                        field.handle_key(key);
                    }
                }
                return Ok(None);
            }
            Mode::Browse | Mode::Grade(_) => {}
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Char('/')) => {
                self.mode = Mode::Search(TextField::new(self.page.search().to_owned()));
            }
            (_, KeyCode::Char('e') | KeyCode::Enter) => self.open_grade(),
            (_, KeyCode::Char('w')) => {
                self.mode = Mode::Export(TextField::new(DEFAULT_EXPORT_FILE.to_owned()));
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => self.reload(),
            _ => {
                self.cursor.handle_key(key, self.page.table_mut());
            }
        }
        Ok(None)
    }

    fn apply(&mut self, update: ScreenUpdate) -> Result<Option<Action>> {
        match update {
            ScreenUpdate::ReportFetched(result) => {
                self.reloading = false;
                match result {
                    Ok(report) => {
                        let search = self.page.search().to_owned();
                        self.page = ReviewReportPage::new(self.page.assignment_id(), report);
                        self.page.set_search(&search);
                        self.cursor.clamp(self.page.table());
                    }
                    Err(e) => {
                        warn!(error = %e, "review report reload failed");
                        self.ctx
                            .alerts
                            .show(Alert::danger(e.user_message("Failed to load review report")));
                    }
                }
            }
            ScreenUpdate::GradeSaved { change, result } => {
                match self.page.complete_grade(&change, result, &self.ctx.alerts) {
                    Ok(()) => self.mode = Mode::Browse,
                    Err(e) => {
                        if let Mode::Grade(form) = &mut self.mode {
                            form.saving = false;
                            form.error = Some(e.user_message("Failed to update grade"));
                        }
                    }
                }
                self.cursor.clamp(self.page.table());
            }
            _ => {}
        }
        Ok(None)
    }

    fn captures_input(&self) -> bool {
        !matches!(self.mode, Mode::Browse)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [summary_area, search_area, table_area, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

        let shown = self.page.filtered().len();
        let summary = Line::from(vec![
            Span::styled(
                format!(" Assignment #{}", self.page.assignment_id()),
                theme::title_style(),
            ),
            Span::styled(
                format!(
                    "   {shown}/{} reviewers   average volume {:.1}",
                    self.page.rows().len(),
                    self.page.average_volume()
                ),
                theme::key_hint(),
            ),
        ]);
        frame.render_widget(Paragraph::new(summary), summary_area);

        if let Mode::Search(field) = &self.mode {
            field.render(frame, search_area, " Search", true);
        } else if !self.page.search().is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!(" Search: {}", self.page.search()),
                    theme::key_hint(),
                )),
                search_area,
            );
        }

        let view = self.page.table().view();
        data_table::render_table(
            frame,
            table_area,
            "Review Report",
            &view,
            &self.cursor,
            self.reloading,
        );

        let hints = data_table::hints(&[
            ("j/k", "move"),
            ("/", "search"),
            ("e", "grade"),
            ("s", "sort"),
            ("w", "export csv"),
            ("r", "reload"),
        ]);
        frame.render_widget(Paragraph::new(hints), hint_area);

        match &self.mode {
            Mode::Grade(form) => form.render(frame, area),
            Mode::Export(field) => {
                let rect = overlay::centered(area, 60, 5);
                let inner = overlay::dialog(frame, rect, "Export CSV", theme::TEAL);
                let [input_area, _, hint_area] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(inner);
                field.render(frame, input_area, " File", true);
                frame.render_widget(
                    Paragraph::new(data_table::hints(&[("Enter", "write"), ("Esc", "cancel")])),
                    hint_area,
                );
            }
            Mode::Browse | Mode::Search(_) => {}
        }
    }

    fn id(&self) -> &'static str {
        "ReviewReport"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peerly_core::{AlertVariant, AppConfig};
    use serde_json::json;

    fn screen() -> ReviewReportScreen {
        let url = peerly_config::parse_server("http://localhost:3002").unwrap();
        let ctx = AppContext::from_config(&AppConfig::new(url)).unwrap();
        let report = serde_json::from_value(json!({
            "reportData": [{
                "id": 1,
                "reviewerName": "Ana Diaz",
                "reviewerUsername": "ana",
                "teamReviewedName": "Team 1",
                "teamReviewedStatus": "blue",
                "calculatedScore": 8,
                "rounds": []
            }],
            "averageVolume": 4.0
        }))
        .unwrap();
        ReviewReportScreen::new(ctx, ReviewReportPage::new(9, report))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn export_writes_file_and_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let mut screen = screen();

        screen.export(path.to_str().unwrap());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Reviewer Name,"));
        assert!(written.contains("\"Ana Diaz\""));
        let alert = screen.ctx.alerts.current().unwrap();
        assert_eq!(alert.variant, AlertVariant::Success);
    }

    #[tokio::test]
    async fn out_of_range_grade_stays_in_form() {
        let mut screen = screen();
        screen.init(ScreenTx::new(tokio::sync::mpsc::unbounded_channel().0, 1)).unwrap();
        screen.handle_key_event(press(KeyCode::Char('e'))).unwrap();
        assert!(screen.captures_input());

        for c in "150".chars() {
            screen.handle_key_event(press(KeyCode::Char(c))).unwrap();
        }
        screen.handle_key_event(press(KeyCode::Enter)).unwrap();

        let Mode::Grade(form) = &screen.mode else {
            panic!("grade form closed");
        };
        assert!(!form.saving);
        assert_eq!(form.error.as_deref(), Some("Grade must be a number between 0 and 100"));
    }

    #[tokio::test]
    async fn search_narrows_rows_and_escape_clears() {
        let mut screen = screen();
        screen.handle_key_event(press(KeyCode::Char('/'))).unwrap();
        for c in "zzz".chars() {
            screen.handle_key_event(press(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(screen.page.filtered().len(), 0);

        screen.handle_key_event(press(KeyCode::Esc)).unwrap();
        assert_eq!(screen.page.search(), "");
        assert_eq!(screen.page.filtered().len(), 1);
    }
}
