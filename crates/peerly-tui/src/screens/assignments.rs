//! Assignment tables: every assignment, or one course's assignments.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Paragraph;

use peerly_core::model::Assignment;
use peerly_core::pages::ResourcePage;
use peerly_core::pages::assignments::{self, AssignmentsPage};
use peerly_core::pages::course_assignments::CourseAssignmentsPage;
use peerly_core::{AppContext, RowCommand};

use super::{render_delete_dialog, spawn_mutation};
use crate::action::{Action, ScreenTx, ScreenUpdate};
use crate::component::Component;
use crate::widgets::data_table::{
    self, ActionMenu, FilterPrompt, MenuChoice, TableCursor, TableKey,
};

enum Source {
    All(AssignmentsPage),
    Course(CourseAssignmentsPage),
}

impl Source {
    fn page(&self) -> &ResourcePage<Assignment> {
        match self {
            Source::All(p) => p.page(),
            Source::Course(p) => p.page(),
        }
    }

    fn page_mut(&mut self) -> &mut ResourcePage<Assignment> {
        match self {
            Source::All(p) => p.page_mut(),
            Source::Course(p) => p.page_mut(),
        }
    }

    fn handle_action(&mut self, row_id: i64, action: &str) -> Option<RowCommand> {
        match self {
            Source::All(p) => p.handle_action(row_id, action),
            Source::Course(p) => p.handle_action(row_id, action),
        }
    }
}

pub struct AssignmentsScreen {
    ctx: AppContext,
    tx: Option<ScreenTx>,
    source: Source,
    cursor: TableCursor,
    filter: Option<FilterPrompt>,
    menu: Option<ActionMenu>,
}

impl AssignmentsScreen {
    pub fn all(ctx: AppContext) -> Self {
        Self::with_source(ctx, Source::All(AssignmentsPage::new()))
    }

    pub fn course(ctx: AppContext, course_id: i64) -> Self {
        Self::with_source(ctx, Source::Course(CourseAssignmentsPage::new(course_id)))
    }

    fn with_source(ctx: AppContext, source: Source) -> Self {
        Self {
            ctx,
            tx: None,
            source,
            cursor: TableCursor::default(),
            filter: None,
            menu: None,
        }
    }

    fn title(&self) -> String {
        match &self.source {
            Source::All(_) => "Assignments".into(),
            Source::Course(p) => format!("Course #{} Assignments", p.course_id()),
        }
    }

    fn schedule_fetch(&mut self) {
        let Some(tx) = self.tx.clone() else { return };
        let Some(ticket) = self.source.page_mut().begin_fetch() else {
            return;
        };
        let client = Arc::clone(&self.ctx.client);
        let course_id = match &self.source {
            Source::All(_) => None,
            Source::Course(p) => Some(p.course_id()),
        };
        tokio::spawn(async move {
            let cancel = ticket.cancellation();
            let fetch = async {
                match course_id {
                    Some(id) => CourseAssignmentsPage::fetch(&client, id).await,
                    None => AssignmentsPage::fetch(&client).await,
                }
            };
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = fetch => result,
            };
            tx.update(ScreenUpdate::AssignmentsFetched { ticket, result });
        });
    }

    fn run(&mut self, row_id: i64, action: &str) -> Option<Action> {
        match self.source.handle_action(row_id, action)? {
            RowCommand::Navigate(nav) => Some(Action::Navigate(nav.to)),
            RowCommand::Edit(_) | RowCommand::Delete(_) | RowCommand::Log(_) => None,
        }
    }
}

impl Component for AssignmentsScreen {
    fn init(&mut self, tx: ScreenTx) -> Result<()> {
        self.tx = Some(tx);
        self.source.page_mut().mount();
        self.schedule_fetch();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(dialog) = self.source.page().delete_dialog() {
            if !dialog.modal().is_submitting() {
                match key.code {
                    KeyCode::Char('y' | 'Y') => {
                        let tx = self.tx.clone();
                        let mutation = self
                            .source
                            .page_mut()
                            .delete_dialog_mut()
                            .and_then(|d| d.prepare().ok());
                        if let (Some(tx), Some(mutation)) = (tx, mutation) {
                            spawn_mutation(&self.ctx, &tx, mutation, ScreenUpdate::Deleted);
                        }
                    }
                    KeyCode::Char('n' | 'N') | KeyCode::Esc => self.source.page_mut().cancel_delete(),
                    _ => {}
                }
            }
            return Ok(None);
        }

        if let Some(filter) = self.filter.as_mut() {
            if filter.handle_key(key, self.source.page_mut().table_mut()) {
                self.filter = None;
            }
            self.cursor.clamp(self.source.page().table());
            return Ok(None);
        }

        if let Some(menu) = self.menu.as_mut() {
            return Ok(match menu.handle_key(key) {
                MenuChoice::Pending => None,
                MenuChoice::Cancelled => {
                    self.menu = None;
                    None
                }
                MenuChoice::Chosen { row_id, action } => {
                    self.menu = None;
                    self.run(row_id, &action)
                }
            });
        }

        match key.code {
            KeyCode::Char('n') if matches!(self.source, Source::All(_)) => {
                return Ok(Some(Action::Navigate(assignments::create_route())));
            }
            KeyCode::Char('d') => {
                let view = self.source.page().table().view();
                if let Some(id) = self.cursor.selected_id(&view) {
                    self.source.handle_action(id, "delete");
                }
                return Ok(None);
            }
            KeyCode::Char('r') => {
                self.source.page().list().request_refresh();
                self.schedule_fetch();
                return Ok(None);
            }
            KeyCode::Enter => {
                self.menu = ActionMenu::open(self.source.page().table(), &self.cursor);
                return Ok(None);
            }
            _ => {}
        }

        match self.cursor.handle_key(key, self.source.page_mut().table_mut()) {
            TableKey::OpenFilter => {
                self.filter = FilterPrompt::open(self.source.page().table(), &self.cursor);
            }
            TableKey::OpenActions => {
                self.menu = ActionMenu::open(self.source.page().table(), &self.cursor);
            }
            TableKey::Handled | TableKey::Unhandled => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::Tick = action {
            self.schedule_fetch();
        }
        Ok(None)
    }

    fn apply(&mut self, update: ScreenUpdate) -> Result<Option<Action>> {
        match update {
            ScreenUpdate::AssignmentsFetched { ticket, result } => {
                self.source
                    .page_mut()
                    .finish_fetch(&ticket, result, &self.ctx.alerts);
                self.cursor.clamp(self.source.page().table());
            }
            ScreenUpdate::Deleted(result) => {
                self.source
                    .page_mut()
                    .complete_delete(result, &self.ctx.alerts);
                self.schedule_fetch();
            }
            _ => {}
        }
        Ok(None)
    }

    fn unmount(&mut self) {
        self.source.page_mut().unmount();
    }

    fn captures_input(&self) -> bool {
        self.filter.is_some() || self.menu.is_some() || self.source.page().delete_dialog().is_some()
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table_area, hint_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let page = self.source.page();
        let view = page.table().view();
        data_table::render_table(
            frame,
            table_area,
            &self.title(),
            &view,
            &self.cursor,
            page.list().is_loading(),
        );

        let mut pairs = vec![("j/k", "move"), ("Enter", "actions"), ("d", "delete"), ("s", "sort")];
        if page.table().options().column_filters {
            pairs.push(("f", "filter"));
        }
        if matches!(self.source, Source::All(_)) {
            pairs.push(("n", "new"));
        }
        pairs.push(("r", "refresh"));
        frame.render_widget(Paragraph::new(data_table::hints(&pairs)), hint_area);

        if let Some(dialog) = page.delete_dialog() {
            render_delete_dialog(frame, area, dialog);
        }
        if let Some(filter) = &self.filter {
            filter.render(frame, area);
        }
        if let Some(menu) = &self.menu {
            menu.render(frame, area);
        }
    }

    fn id(&self) -> &'static str {
        "Assignments"
    }
}
