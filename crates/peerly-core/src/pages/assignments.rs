// ── Assignments ──

use tracing::info;

use peerly_api::ResourceClient;

use super::{ResourcePage, fetch_collection};
use crate::columns::assignment_columns;
use crate::context::AppContext;
use crate::editor::{DeleteResult, ResourceSpec};
use crate::error::CoreError;
use crate::list_page::FetchApplied;
use crate::model::Assignment;
use crate::table::{RowCommand, TableOptions};

pub static ASSIGNMENT_RESOURCE: ResourceSpec = ResourceSpec {
    path: "assignments",
    singular: "assignment",
    label: "Assignment",
    list_route: "/assignments",
    created: "Assignment created successfully!",
    updated: "Assignment updated successfully!",
    save_failed: "An error occurred",
    delete_failed: "Failed to delete assignment",
};

pub const ASSIGNMENTS_ROUTE: &str = "/assignments";

/// Where the "create" button goes.
pub fn create_route() -> String {
    format!("{ASSIGNMENTS_ROUTE}/new")
}

pub struct AssignmentsPage {
    page: ResourcePage<Assignment>,
}

impl Default for AssignmentsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentsPage {
    pub fn new() -> Self {
        let options = TableOptions {
            global_filter: false,
            ..TableOptions::default()
        };
        Self {
            page: ResourcePage::new(
                &ASSIGNMENT_RESOURCE,
                assignment_columns(ASSIGNMENTS_ROUTE),
                options,
                "Failed to fetch assignments",
            ),
        }
    }

    pub fn page(&self) -> &ResourcePage<Assignment> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Assignment> {
        &mut self.page
    }

    pub async fn fetch(client: &ResourceClient) -> Result<Vec<Assignment>, CoreError> {
        fetch_collection(client, "assignments").await
    }

    pub async fn refresh(&mut self, ctx: &AppContext) -> Option<FetchApplied> {
        let ticket = self.page.begin_fetch()?;
        let result = Self::fetch(&ctx.client).await;
        Some(self.page.finish_fetch(&ticket, result, &ctx.alerts))
    }

    /// Carry out a row action. Navigation is returned to the caller;
    /// delete opens the confirmation dialog.
    pub fn handle_action(&mut self, row_id: i64, action: &str) -> Option<RowCommand> {
        let command = self.page.table().invoke(row_id, action)?;
        match &command {
            RowCommand::Delete(id) => {
                if let Some(name) = self.page.table().row(*id).map(|a| a.name.clone()) {
                    self.page.open_delete(*id, name);
                }
            }
            RowCommand::Log(message) => info!("{message}"),
            RowCommand::Navigate(_) | RowCommand::Edit(_) => {}
        }
        Some(command)
    }

    pub async fn confirm_delete(&mut self, ctx: &AppContext) -> Result<Option<DeleteResult>, CoreError> {
        self.page.confirm_delete(&ctx.client, &ctx.alerts).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::table::Navigation;

    fn assignment(id: i64, name: &str) -> Assignment {
        Assignment {
            id,
            name: name.into(),
            course_name: Some("CSC 517".into()),
            course_id: Some(1),
            created_at: None,
            updated_at: None,
        }
    }

    fn page_with_rows() -> AssignmentsPage {
        let mut page = AssignmentsPage::new();
        page.page_mut()
            .table_mut()
            .set_rows(vec![assignment(4, "Program 1"), assignment(9, "Wiki")]);
        page
    }

    #[test]
    fn id_column_is_hidden() {
        let page = page_with_rows();
        let headers: Vec<_> = page
            .page()
            .table()
            .view()
            .headers
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(
            headers,
            ["Name", "Course Name", "Creation Date", "Updated Date", "Actions"]
        );
    }

    #[test]
    fn edit_is_relative_to_the_list_and_review_is_absolute() {
        let mut page = page_with_rows();
        assert_eq!(
            page.handle_action(4, "edit"),
            Some(RowCommand::navigate("/assignments/edit/4"))
        );
        assert_eq!(
            page.handle_action(9, "review"),
            Some(RowCommand::Navigate(Navigation {
                to: "/assignments/9/review".into(),
                from: None,
            }))
        );
        assert!(page.page().delete_dialog().is_none());
    }

    #[test]
    fn delete_opens_confirmation_and_suspends_refetch() {
        let mut page = page_with_rows();
        page.page_mut().mount();
        assert_eq!(page.handle_action(9, "delete"), Some(RowCommand::Delete(9)));

        let dialog = page.page().delete_dialog().unwrap();
        assert_eq!(dialog.name(), "Wiki");
        assert_eq!(
            dialog.prompt(),
            "Are you sure you want to delete Assignment Wiki?"
        );
        assert!(page.page_mut().begin_fetch().is_none());

        page.page_mut().cancel_delete();
        assert!(page.page().delete_dialog().is_none());
        assert!(page.page_mut().begin_fetch().is_some());
    }

    #[test]
    fn unknown_row_or_action_does_nothing() {
        let mut page = page_with_rows();
        assert_eq!(page.handle_action(99, "edit"), None);
        assert_eq!(page.handle_action(4, "explode"), None);
        assert_eq!(create_route(), "/assignments/new");
    }
}
