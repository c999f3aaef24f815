// ── Course assignments ──
//
// Assignments belonging to one course, with the course-level actions.
// No filter and no pagination.

use tracing::info;

use peerly_api::ResourceClient;

use super::assignments::ASSIGNMENT_RESOURCE;
use super::{ResourcePage, fetch_collection};
use crate::columns::course_assignment_columns;
use crate::context::AppContext;
use crate::editor::DeleteResult;
use crate::error::CoreError;
use crate::list_page::FetchApplied;
use crate::model::Assignment;
use crate::table::{RowCommand, TableOptions};

pub struct CourseAssignmentsPage {
    course_id: i64,
    page: ResourcePage<Assignment>,
}

impl CourseAssignmentsPage {
    pub fn new(course_id: i64) -> Self {
        let options = TableOptions {
            global_filter: false,
            column_filters: false,
            pagination: false,
            ..TableOptions::default()
        };
        Self {
            course_id,
            page: ResourcePage::new(
                &ASSIGNMENT_RESOURCE,
                course_assignment_columns(&Self::route_for(course_id)),
                options,
                "Failed to fetch assignments",
            ),
        }
    }

    pub fn route_for(course_id: i64) -> String {
        format!("/courses/{course_id}/assignments")
    }

    pub fn course_id(&self) -> i64 {
        self.course_id
    }

    pub fn page(&self) -> &ResourcePage<Assignment> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Assignment> {
        &mut self.page
    }

    pub async fn fetch(client: &ResourceClient, course_id: i64) -> Result<Vec<Assignment>, CoreError> {
        let all: Vec<Assignment> = fetch_collection(client, "assignments").await?;
        Ok(all
            .into_iter()
            .filter(|a| a.course_id == Some(course_id))
            .collect())
    }

    pub async fn refresh(&mut self, ctx: &AppContext) -> Option<FetchApplied> {
        let ticket = self.page.begin_fetch()?;
        let result = Self::fetch(&ctx.client, self.course_id).await;
        Some(self.page.finish_fetch(&ticket, result, &ctx.alerts))
    }

    pub fn handle_action(&mut self, row_id: i64, action: &str) -> Option<RowCommand> {
        let command = self.page.table().invoke(row_id, action)?;
        match &command {
            RowCommand::Delete(id) => {
                if let Some(name) = self.page.table().row(*id).map(|a| a.name.clone()) {
                    self.page.open_delete(*id, name);
                }
            }
            RowCommand::Log(message) => info!(course_id = self.course_id, "{message}"),
            RowCommand::Navigate(_) | RowCommand::Edit(_) => {}
        }
        Some(command)
    }

    pub async fn confirm_delete(&mut self, ctx: &AppContext) -> Result<Option<DeleteResult>, CoreError> {
        self.page.confirm_delete(&ctx.client, &ctx.alerts).await
    }
}
