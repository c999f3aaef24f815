//! Duties screen: the duty table with an embedded editor and delete
//! confirmation, plus the routed editor for `/duties/new` and
//! `/duties/edit/:id`.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::widgets::Paragraph;
use serde_json::json;
use tracing::debug;

use peerly_core::events::DUTIES_CHANGED;
use peerly_core::model::DutyForm;
use peerly_core::pages::duties::DutiesPage;
use peerly_core::{AppContext, Editor, EditorMode, EditorResult, RowCommand};

use super::duty_form::{DutyFormView, FormKey};
use super::{render_delete_dialog, spawn_mutation};
use crate::action::{Action, ScreenTx, ScreenUpdate};
use crate::component::Component;
use crate::widgets::data_table::{
    self, ActionMenu, FilterPrompt, MenuChoice, TableCursor, TableKey,
};

pub struct DutiesScreen {
    ctx: AppContext,
    tx: Option<ScreenTx>,
    page: DutiesPage,
    cursor: TableCursor,
    form: Option<DutyFormView>,
    filter: Option<FilterPrompt>,
    menu: Option<ActionMenu>,
}

impl DutiesScreen {
    pub fn new(ctx: AppContext, user_id: i64) -> Self {
        Self {
            ctx,
            tx: None,
            page: DutiesPage::new(user_id),
            cursor: TableCursor::default(),
            form: None,
            filter: None,
            menu: None,
        }
    }

    fn selected_id(&self) -> Option<i64> {
        self.cursor.selected_id(&self.page.page().table().view())
    }

    /// Start a fetch if the list wants one.
    fn schedule_fetch(&mut self) {
        let Some(tx) = self.tx.clone() else { return };
        let Some(ticket) = self.page.begin_fetch() else {
            return;
        };
        let client = Arc::clone(&self.ctx.client);
        let user_id = self.page.user_id();
        tokio::spawn(async move {
            let cancel = ticket.cancellation();
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = DutiesPage::fetch(&client, user_id) => result,
            };
            tx.update(ScreenUpdate::DutiesFetched { ticket, result });
        });
    }

    fn open_form(&mut self) {
        self.form = self.page.editor().map(DutyFormView::new);
    }

    fn submit_form(&mut self) {
        let Some(tx) = self.tx.clone() else { return };
        match self.page.prepare_editor() {
            Ok(mutation) => spawn_mutation(&self.ctx, &tx, mutation, ScreenUpdate::Saved),
            // Field errors are shown by the form.
            Err(e) => debug!(error = %e, "duty submit rejected"),
        }
    }

    fn confirm_delete(&mut self) {
        let Some(tx) = self.tx.clone() else { return };
        let Some(dialog) = self.page.page_mut().delete_dialog_mut() else {
            return;
        };
        if let Ok(mutation) = dialog.prepare() {
            spawn_mutation(&self.ctx, &tx, mutation, ScreenUpdate::Deleted);
        }
    }

    fn run_command(&mut self, command: Option<RowCommand>) -> Option<Action> {
        match command? {
            RowCommand::Edit(_) => {
                self.open_form();
                None
            }
            RowCommand::Navigate(nav) => Some(Action::Navigate(nav.to)),
            RowCommand::Delete(_) | RowCommand::Log(_) => None,
        }
    }
}

impl Component for DutiesScreen {
    fn init(&mut self, tx: ScreenTx) -> Result<()> {
        self.tx = Some(tx);
        self.page.mount();
        self.schedule_fetch();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Editor modal
        if let (Some(form), Some(editor)) = (self.form.as_mut(), self.page.editor_mut()) {
            match form.handle_key(key, editor) {
                FormKey::Submit => self.submit_form(),
                FormKey::Cancel => {
                    self.page.cancel_modal();
                    self.form = None;
                }
                FormKey::Handled => {}
            }
            return Ok(None);
        }

        // Delete confirmation
        if let Some(dialog) = self.page.page().delete_dialog() {
            if !dialog.modal().is_submitting() {
                match key.code {
                    KeyCode::Char('y' | 'Y') => self.confirm_delete(),
                    KeyCode::Char('n' | 'N') | KeyCode::Esc => self.page.cancel_modal(),
                    _ => {}
                }
            }
            return Ok(None);
        }

        if let Some(filter) = self.filter.as_mut() {
            if filter.handle_key(key, self.page.page_mut().table_mut()) {
                self.filter = None;
            }
            self.cursor.clamp(self.page.page().table());
            return Ok(None);
        }

        if let Some(menu) = self.menu.as_mut() {
            match menu.handle_key(key) {
                MenuChoice::Pending => {}
                MenuChoice::Cancelled => self.menu = None,
                MenuChoice::Chosen { row_id, action } => {
                    self.menu = None;
                    let command = self.page.handle_action(row_id, &action);
                    return Ok(self.run_command(command));
                }
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('n') => {
                self.page.open_create();
                self.open_form();
                return Ok(None);
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    let command = self.page.handle_action(id, "edit");
                    return Ok(self.run_command(command));
                }
                return Ok(None);
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_id() {
                    self.page.handle_action(id, "delete");
                }
                return Ok(None);
            }
            KeyCode::Char('r') => {
                self.page.page().list().request_refresh();
                self.schedule_fetch();
                return Ok(None);
            }
            _ => {}
        }

        match self.cursor.handle_key(key, self.page.page_mut().table_mut()) {
            TableKey::OpenFilter => {
                self.filter = FilterPrompt::open(self.page.page().table(), &self.cursor);
            }
            TableKey::OpenActions => {
                self.menu = ActionMenu::open(self.page.page().table(), &self.cursor);
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
            ScreenUpdate::DutiesFetched { ticket, result } => {
                self.page.finish_fetch(&ticket, result, &self.ctx);
                self.cursor.clamp(self.page.page().table());
            }
            ScreenUpdate::Saved(result) => {
                if self
                    .page
                    .complete_editor(result, &self.ctx)
                    .is_some_and(|outcome| outcome.is_success())
                {
                    self.form = None;
                }
                // The closed modal requested a refetch.
                self.schedule_fetch();
            }
            ScreenUpdate::Deleted(result) => {
                self.page.complete_delete(result, &self.ctx);
                self.schedule_fetch();
            }
            _ => {}
        }
        Ok(None)
    }

    fn unmount(&mut self) {
        self.page.unmount();
    }

    fn captures_input(&self) -> bool {
        self.form.is_some()
            || self.filter.is_some()
            || self.menu.is_some()
            || self.page.page().delete_dialog().is_some()
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table_area, hint_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

        let list = self.page.page().list();
        let view = self.page.page().table().view();
        data_table::render_table(frame, table_area, "Duties", &view, &self.cursor, list.is_loading());

        let hints = data_table::hints(&[
            ("j/k", "move"),
            ("n", "new"),
            ("e", "edit"),
            ("d", "delete"),
            ("a", "actions"),
            ("s", "sort"),
            ("f", "filter"),
            ("r", "refresh"),
        ]);
        frame.render_widget(Paragraph::new(hints), hint_area);

        if let (Some(form), Some(editor)) = (&self.form, self.page.editor()) {
            form.render(frame, area, editor);
        }
        if let Some(dialog) = self.page.page().delete_dialog() {
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
        "Duties"
    }
}

// ── Routed editor ────────────────────────────────────────────────────

/// Full-screen duty editor. Saving navigates back to the duty list.
pub struct DutyEditorScreen {
    ctx: AppContext,
    tx: Option<ScreenTx>,
    editor: Editor<DutyForm>,
    form: DutyFormView,
}

impl DutyEditorScreen {
    pub fn new(ctx: AppContext, editor: Editor<DutyForm>) -> Self {
        let form = DutyFormView::new(&editor);
        Self {
            ctx,
            tx: None,
            editor,
            form,
        }
    }
}

impl Component for DutyEditorScreen {
    fn init(&mut self, tx: ScreenTx) -> Result<()> {
        self.tx = Some(tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.form.handle_key(key, &mut self.editor) {
            FormKey::Submit => {
                if let (Some(tx), Ok(mutation)) = (self.tx.as_ref(), self.editor.prepare()) {
                    spawn_mutation(&self.ctx, tx, mutation, ScreenUpdate::Saved);
                }
                Ok(None)
            }
            FormKey::Cancel => Ok(Some(Action::GoBack)),
            FormKey::Handled => Ok(None),
        }
    }

    fn apply(&mut self, update: ScreenUpdate) -> Result<Option<Action>> {
        let ScreenUpdate::Saved(result) = update else {
            return Ok(None);
        };
        let mode = self.editor.mode();
        match self.editor.complete(result, &self.ctx.alerts) {
            EditorResult::Navigate { to, record } => {
                let (id, action) = match mode {
                    Some(EditorMode::Update { id }) => (Some(id), "updated"),
                    _ => (record["id"].as_i64(), "created"),
                };
                self.ctx
                    .events
                    .emit(DUTIES_CHANGED, json!({ "id": id, "action": action }));
                Ok(Some(Action::Navigate(to)))
            }
            EditorResult::Closed(_) | EditorResult::Failed(_) => Ok(None),
        }
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.form.render(frame, area, &self.editor);
    }

    fn id(&self) -> &'static str {
        "DutyEditor"
    }
}
