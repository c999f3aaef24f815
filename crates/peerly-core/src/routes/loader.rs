// ── Route loaders ──
//
// Data fetched before a routed page renders. Each loader issues one or
// more GETs and hands the page a JSON value; loaders on a matched chain
// run concurrently.

use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use peerly_api::ResourceClient;

use super::{PageId, RedirectReason, Resolution, RouteMatch};
use crate::alerts::Alert;
use crate::context::AppContext;
use crate::error::CoreError;

pub const UNAUTHORIZED_MESSAGE: &str = "You are not authorized to view this page";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoaderId {
    Assignment,
    CourseFormData,
    CourseTas,
    Duty,
    UserFormData,
    ParticipantFormData,
    Roles,
    Role,
    Institutions,
    Institution,
    UsersOfType,
    Questionnaires,
    Questionnaire,
    ReviewReport,
}

/// Loader results keyed by loader name.
pub type LoaderData = IndexMap<String, Value>;

/// A routed page ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedPage {
    pub route: RouteMatch,
    pub data: LoaderData,
}

impl LoadedPage {
    pub fn page(&self) -> PageId {
        self.route.page()
    }

    pub fn get(&self, loader: LoaderId) -> Option<&Value> {
        self.data.get(&loader.to_string())
    }
}

/// What a navigation attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Ready(LoadedPage),
    Redirect { to: String, reason: RedirectReason },
    NotFound { path: String },
    /// A loader failed; the page renders its error boundary.
    Failed {
        page: PageId,
        status: Option<u16>,
        message: String,
    },
}

/// Resolve `target` against the session, run the chain's loaders and
/// report the result. Unauthorized visits publish a danger alert.
pub async fn navigate(ctx: &AppContext, target: &str) -> PageOutcome {
    let session = ctx.session.current();
    let route = match ctx.routes.resolve(target, &session) {
        Resolution::Render(route) => route,
        Resolution::Redirect { to, reason } => {
            if reason == RedirectReason::Unauthorized {
                warn!(path = target, role = %session.role(), "navigation refused");
                ctx.alerts.show(Alert::danger(UNAUTHORIZED_MESSAGE));
            }
            return PageOutcome::Redirect { to, reason };
        }
        Resolution::NotFound { path } => return PageOutcome::NotFound { path },
    };

    if route.page() == PageId::NotFound {
        return PageOutcome::NotFound { path: route.path };
    }

    let loaders: Vec<LoaderId> = route.chain.iter().filter_map(|r| r.loader).collect();
    let results = join_all(loaders.iter().map(|id| load(&ctx.client, *id, &route))).await;

    let mut data = LoaderData::new();
    for (id, result) in loaders.into_iter().zip(results) {
        match result {
            Ok(value) => {
                data.insert(id.to_string(), value);
            }
            Err(CoreError::NotFound { .. }) => {
                return PageOutcome::NotFound { path: route.path };
            }
            Err(e) => {
                warn!(loader = %id, error = %e, "loader failed");
                return PageOutcome::Failed {
                    page: route.page(),
                    status: e.status(),
                    message: e.user_message("Failed to load page"),
                };
            }
        }
    }

    debug!(path = %route.path, page = %route.page(), loaders = data.len(), "page loaded");
    PageOutcome::Ready(LoadedPage { route, data })
}

/// Run one loader for a matched route.
pub async fn load(client: &ResourceClient, loader: LoaderId, route: &RouteMatch) -> Result<Value, CoreError> {
    let id = route.param("id");
    match loader {
        LoaderId::Assignment => optional(client, "assignments", id).await,
        LoaderId::Duty => optional(client, "duties", id).await,
        LoaderId::Role => optional(client, "roles", id).await,
        LoaderId::Institution => optional(client, "institutions", id).await,
        LoaderId::Questionnaire => optional(client, "questionnaires", id).await,
        LoaderId::ReviewReport => optional(client, "review_reports", id).await,
        LoaderId::Roles => collection(client, "roles").await,
        LoaderId::Institutions => collection(client, "institutions").await,
        LoaderId::Questionnaires => collection(client, "questionnaires").await,
        LoaderId::CourseTas => match id {
            Some(id) => collection(client, &format!("courses/{id}/tas")).await,
            None => Ok(Value::Array(Vec::new())),
        },
        LoaderId::CourseFormData => Ok(combine(vec![
            ("course", optional(client, "courses", id).await?),
            ("institutions", collection(client, "institutions").await?),
            ("users", collection(client, "users").await?),
        ])),
        LoaderId::UserFormData => Ok(combine(vec![
            ("user", optional(client, "users", id).await?),
            ("roles", collection(client, "roles").await?),
            ("institutions", collection(client, "institutions").await?),
        ])),
        LoaderId::ParticipantFormData => Ok(combine(vec![
            (
                "participant",
                optional(client, "participants", route.param("participant_id")).await?,
            ),
            ("users", collection(client, "users").await?),
        ])),
        LoaderId::UsersOfType => {
            let role = route.param("user_type").unwrap_or_default().to_owned();
            let users: Vec<Value> = client.list_with_params("users", &[("role", role)]).await?;
            Ok(Value::Array(users))
        }
    }
}

async fn collection(client: &ResourceClient, path: &str) -> Result<Value, CoreError> {
    Ok(Value::Array(client.list::<Value>(path).await?))
}

/// `{resource}/{id}` when an id was captured, `{}` otherwise.
async fn optional(client: &ResourceClient, resource: &str, id: Option<&str>) -> Result<Value, CoreError> {
    match id {
        Some(id) => Ok(client.read::<Value>(resource, id).await?),
        None => Ok(json!({})),
    }
}

fn combine(parts: Vec<(&str, Value)>) -> Value {
    let map: Map<String, Value> = parts.into_iter().map(|(k, v)| (k.to_owned(), v)).collect();
    Value::Object(map)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn loader_names_are_snake_case() {
        assert_eq!(LoaderId::CourseFormData.to_string(), "course_form_data");
        assert_eq!("review_report".parse::<LoaderId>().unwrap(), LoaderId::ReviewReport);
    }

    #[test]
    fn combine_keeps_declared_keys() {
        let value = combine(vec![("course", json!({})), ("users", json!([1]))]);
        assert_eq!(value, json!({"course": {}, "users": [1]}));
    }
}
