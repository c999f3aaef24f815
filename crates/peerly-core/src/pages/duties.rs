// ── Duties ──
//
// Duty list with embedded create/edit editor and delete confirmation.
// Private duties are shown only to their creator; the caller's own
// duties are listed first.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use peerly_api::ResourceClient;

use super::ResourcePage;
use crate::columns::duty_columns;
use crate::context::AppContext;
use crate::editor::{
    DeleteResult, Editor, EditorHost, EditorMode, EditorResult, FieldRule, Mutation,
    ResourceSpec, Schema,
};
use crate::error::CoreError;
use crate::events::DUTIES_CHANGED;
use crate::list_page::{FetchApplied, FetchTicket};
use crate::model::{Duty, DutyForm, User, UserDirectory};
use crate::routes::{LoadedPage, LoaderId};
use crate::table::{RowCommand, TableOptions};

pub static DUTY_RESOURCE: ResourceSpec = ResourceSpec {
    path: "duties",
    singular: "duty",
    label: "Duty",
    list_route: "/duties",
    created: "New duty created successfully!",
    updated: "Duty updated successfully!",
    save_failed: "An error occurred",
    delete_failed: "Failed to delete duty",
};

pub fn duty_schema() -> Schema {
    Schema::new(vec![FieldRule::new("name").required().min(3).max(50)])
}

/// Duties `user_id` may see, own duties first, then by name ignoring case.
pub fn visible_duties(duties: Vec<Duty>, user_id: i64) -> Vec<Duty> {
    let mut visible: Vec<Duty> = duties.into_iter().filter(|d| d.visible_to(user_id)).collect();
    visible.sort_by(|a, b| {
        b.is_owned_by(user_id)
            .cmp(&a.is_owned_by(user_id))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    visible
}

/// Rows and the creator directory from one fetch.
#[derive(Debug, Clone, Default)]
pub struct DutyListing {
    pub duties: Vec<Duty>,
    pub users: Vec<User>,
}

pub struct DutiesPage {
    user_id: i64,
    page: ResourcePage<Duty>,
    editor: Option<Editor<DutyForm>>,
}

impl DutiesPage {
    pub fn new(user_id: i64) -> Self {
        let options = TableOptions {
            global_filter: false,
            column_filters: true,
            ..TableOptions::default()
        };
        Self {
            user_id,
            page: ResourcePage::new(
                &DUTY_RESOURCE,
                duty_columns(UserDirectory::default()),
                options,
                "Failed to fetch duties",
            ),
            editor: None,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn page(&self) -> &ResourcePage<Duty> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Duty> {
        &mut self.page
    }

    pub fn mount(&mut self) {
        self.page.mount();
    }

    pub fn unmount(&mut self) {
        self.page.unmount();
    }

    // ── Fetch ──

    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        self.page.begin_fetch()
    }

    /// `GET /duties?visible_to=<user>` and `GET /users`. A failed user
    /// fetch only costs the creator names.
    pub async fn fetch(client: &ResourceClient, user_id: i64) -> Result<DutyListing, CoreError> {
        let params = [("visible_to", user_id.to_string())];
        let (duties, users) = tokio::join!(
            client.list_with_params::<Duty>("duties", &params),
            client.list::<User>("users"),
        );
        let users = users.unwrap_or_else(|e| {
            warn!(error = %e, "user directory unavailable");
            Vec::new()
        });
        Ok(DutyListing {
            duties: duties?,
            users,
        })
    }

    pub fn finish_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<DutyListing, CoreError>,
        ctx: &AppContext,
    ) -> FetchApplied {
        let user_id = self.user_id;
        let mut directory = None;
        let rows = result.map(|listing| {
            directory = Some(listing.users.into_iter().collect::<UserDirectory>());
            visible_duties(listing.duties, user_id)
        });
        let applied = self.page.finish_fetch(ticket, rows, &ctx.alerts);
        if let (FetchApplied::Applied, Some(directory)) = (applied, directory) {
            self.page.table_mut().set_columns(duty_columns(directory));
        }
        applied
    }

    /// Run a due fetch to completion.
    pub async fn refresh(&mut self, ctx: &AppContext) -> Option<FetchApplied> {
        let ticket = self.begin_fetch()?;
        let result = Self::fetch(&ctx.client, self.user_id).await;
        Some(self.finish_fetch(&ticket, result, ctx))
    }

    pub fn rows(&self) -> &[Duty] {
        self.page.list().rows()
    }

    // ── Row actions ──

    /// Carry out a row action; returns the navigation it asked for, if any.
    pub fn handle_action(&mut self, row_id: i64, action: &str) -> Option<RowCommand> {
        let command = self.page.table().invoke(row_id, action)?;
        match &command {
            RowCommand::Edit(id) => self.open_edit(*id),
            RowCommand::Delete(id) => self.open_delete(*id),
            RowCommand::Navigate(_) | RowCommand::Log(_) => {}
        }
        Some(command)
    }

    // ── Editor ──

    pub fn editor(&self) -> Option<&Editor<DutyForm>> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut Editor<DutyForm>> {
        self.editor.as_mut()
    }

    fn embedded_editor(&self, mode: EditorMode, form: DutyForm) -> Editor<DutyForm> {
        Editor::new(&DUTY_RESOURCE, duty_schema(), mode, form)
            .on_refresh(self.page.list().refresh_hook())
            .host(EditorHost::Embedded {
                on_close: Arc::new(|| debug!("duty editor closed")),
            })
    }

    pub fn open_create(&mut self) {
        let form = DutyForm {
            instructor_id: Some(self.user_id),
            ..DutyForm::default()
        };
        self.editor = Some(self.embedded_editor(EditorMode::Create, form));
        self.page.list_mut().set_modal_visible(true);
    }

    pub fn open_edit(&mut self, id: i64) {
        let Some(duty) = self.page.table().row(id) else {
            return;
        };
        let form = DutyForm::from(duty);
        self.editor = Some(self.embedded_editor(EditorMode::Update { id }, form));
        self.page.list_mut().set_modal_visible(true);
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
        self.page.list_mut().set_modal_visible(false);
    }

    /// Validate and start the open editor's request.
    pub fn prepare_editor(&mut self) -> Result<Mutation, CoreError> {
        self.editor
            .as_mut()
            .ok_or(CoreError::Modal(crate::modal::ModalError::NotOpen))?
            .prepare()
    }

    pub fn complete_editor(
        &mut self,
        result: Result<Value, CoreError>,
        ctx: &AppContext,
    ) -> Option<EditorResult> {
        let editor = self.editor.as_mut()?;
        let mode = editor.mode();
        let outcome = editor.complete(result, &ctx.alerts);
        if outcome.is_success() {
            let (id, action) = match mode {
                Some(EditorMode::Update { id }) => (Some(id), "updated"),
                _ => (outcome.record().and_then(|r| r["id"].as_i64()), "created"),
            };
            ctx.events.emit(DUTIES_CHANGED, json!({ "id": id, "action": action }));
            self.close_editor();
        }
        Some(outcome)
    }

    pub async fn submit_editor(&mut self, ctx: &AppContext) -> Result<Option<EditorResult>, CoreError> {
        let mutation = self.prepare_editor()?;
        let result = mutation.execute(&ctx.client).await;
        Ok(self.complete_editor(result, ctx))
    }

    // ── Delete ──

    pub fn open_delete(&mut self, id: i64) {
        let Some(name) = self.page.table().row(id).map(|d| d.name.clone()) else {
            return;
        };
        self.page.open_delete(id, name);
    }

    pub fn complete_delete(
        &mut self,
        result: Result<Value, CoreError>,
        ctx: &AppContext,
    ) -> Option<DeleteResult> {
        let outcome = self.page.complete_delete(result, &ctx.alerts)?;
        if let DeleteResult::Deleted { id, .. } = &outcome {
            ctx.events.emit(DUTIES_CHANGED, json!({ "id": id, "action": "deleted" }));
        }
        Some(outcome)
    }

    pub async fn confirm_delete(&mut self, ctx: &AppContext) -> Result<Option<DeleteResult>, CoreError> {
        let Some(dialog) = self.page.delete_dialog_mut() else {
            return Ok(None);
        };
        let mutation = dialog.prepare()?;
        let result = mutation.execute(&ctx.client).await;
        Ok(self.complete_delete(result, ctx))
    }

    pub fn cancel_modal(&mut self) {
        if self.editor.is_some() {
            self.close_editor();
        }
        if self.page.delete_dialog().is_some() {
            self.page.cancel_delete();
        }
    }
}

/// Editor for the `/duties/new` and `/duties/edit/:id` routes. Saving
/// navigates back to `/duties`.
pub fn routed_duty_editor(page: &LoadedPage, user_id: i64) -> Result<Editor<DutyForm>, CoreError> {
    match page.route.param_id("id") {
        Some(id) => {
            let value = page.get(LoaderId::Duty).cloned().unwrap_or(Value::Null);
            let duty: Duty = serde_json::from_value(value).map_err(|_| CoreError::NotFound {
                entity_type: "duty".into(),
                identifier: id.to_string(),
            })?;
            Ok(Editor::new(
                &DUTY_RESOURCE,
                duty_schema(),
                EditorMode::Update { id },
                DutyForm::from(&duty),
            ))
        }
        None => Ok(Editor::new(
            &DUTY_RESOURCE,
            duty_schema(),
            EditorMode::Create,
            DutyForm {
                instructor_id: Some(user_id),
                ..DutyForm::default()
            },
        )),
    }
}
