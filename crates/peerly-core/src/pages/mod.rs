// ── Pages ──
//
// Page state for the list views. Each page is UI-agnostic: front-ends
// drive it through `begin_fetch`/`finish_fetch` and the modal methods,
// or call the `refresh`/`confirm_delete` helpers when awaiting in place
// is fine.

pub mod assignments;
pub mod course_assignments;
pub mod duties;
pub mod review_report;

use serde::de::DeserializeOwned;
use tracing::debug;

use peerly_api::ResourceClient;

use crate::alerts::AlertBus;
use crate::editor::{DeleteConfirmation, DeleteResult, ResourceSpec};
use crate::error::CoreError;
use crate::list_page::{FetchApplied, FetchTicket, ListState};
use crate::table::{ColumnDef, Table, TableOptions, TableRow};

/// List state, table and delete dialog for one resource collection.
pub struct ResourcePage<R> {
    resource: &'static ResourceSpec,
    list: ListState<R>,
    table: Table<R>,
    delete: Option<DeleteConfirmation>,
}

impl<R: TableRow + Clone> ResourcePage<R> {
    pub fn new(
        resource: &'static ResourceSpec,
        columns: Vec<ColumnDef<R>>,
        options: TableOptions,
        fetch_failed: &'static str,
    ) -> Self {
        Self {
            resource,
            list: ListState::new(fetch_failed),
            table: Table::new(columns, options),
            delete: None,
        }
    }

    pub fn resource(&self) -> &'static ResourceSpec {
        self.resource
    }

    pub fn list(&self) -> &ListState<R> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListState<R> {
        &mut self.list
    }

    pub fn table(&self) -> &Table<R> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table<R> {
        &mut self.table
    }

    pub fn mount(&mut self) {
        self.list.mount();
    }

    pub fn unmount(&mut self) {
        self.list.unmount();
    }

    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        self.list.begin_fetch()
    }

    /// Apply fetched rows; the table sees the same rows as the list.
    pub fn finish_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<R>, CoreError>,
        alerts: &AlertBus,
    ) -> FetchApplied {
        let applied = self.list.finish_fetch(ticket, result, alerts);
        if applied == FetchApplied::Applied {
            self.table.set_rows(self.list.rows().to_vec());
        }
        applied
    }

    // ── Delete dialog ──

    pub fn delete_dialog(&self) -> Option<&DeleteConfirmation> {
        self.delete.as_ref()
    }

    pub fn delete_dialog_mut(&mut self) -> Option<&mut DeleteConfirmation> {
        self.delete.as_mut()
    }

    /// Open the delete confirmation for row `id`.
    pub fn open_delete(&mut self, id: i64, name: impl Into<String>) {
        let dialog =
            DeleteConfirmation::new(self.resource, id, name).on_refresh(self.list.refresh_hook());
        self.delete = Some(dialog);
        self.list.set_modal_visible(true);
    }

    pub fn cancel_delete(&mut self) {
        if let Some(dialog) = self.delete.as_mut() {
            dialog.cancel();
        }
        self.close_delete();
    }

    fn close_delete(&mut self) {
        self.delete = None;
        self.list.set_modal_visible(false);
    }

    /// Apply a finished delete. Success closes the dialog; failure keeps
    /// it open with the error.
    pub fn complete_delete(
        &mut self,
        result: Result<serde_json::Value, CoreError>,
        alerts: &AlertBus,
    ) -> Option<DeleteResult> {
        let outcome = self.delete.as_mut()?.complete(result, alerts);
        if matches!(outcome, DeleteResult::Deleted { .. }) {
            self.close_delete();
        }
        Some(outcome)
    }

    /// Prepare, send and apply the open delete in one call.
    pub async fn confirm_delete(
        &mut self,
        client: &ResourceClient,
        alerts: &AlertBus,
    ) -> Result<Option<DeleteResult>, CoreError> {
        let Some(dialog) = self.delete.as_mut() else {
            return Ok(None);
        };
        let mutation = dialog.prepare()?;
        let result = mutation.execute(client).await;
        Ok(self.complete_delete(result, alerts))
    }
}

/// Fetch a full collection.
pub async fn fetch_collection<R: DeserializeOwned>(
    client: &ResourceClient,
    resource: &str,
) -> Result<Vec<R>, CoreError> {
    debug!(resource, "fetching collection");
    Ok(client.list(resource).await?)
}
