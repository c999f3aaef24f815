// ── Resource editor and delete confirmation ──
//
// Both run in three steps so front-ends never hold `&mut` state across
// a request: `prepare` validates and moves the modal to `submitting`,
// the returned `Mutation` is executed anywhere (a spawned task, the CLI),
// and `complete` applies the result.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use peerly_api::ResourceClient;

use crate::alerts::{Alert, AlertBus};
use crate::error::CoreError;
use crate::modal::Modal;

pub type Hook = Arc<dyn Fn() + Send + Sync>;

// ── Schema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl FieldRule {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            required: false,
            min: None,
            max: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn min(mut self, chars: usize) -> Self {
        self.min = Some(chars);
        self
    }

    #[must_use]
    pub fn max(mut self, chars: usize) -> Self {
        self.max = Some(chars);
        self
    }

    /// First failing check, in order required, min, max.
    fn check(&self, value: Option<&Value>) -> Option<String> {
        let text = match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let len = text.trim().chars().count();
        if len == 0 {
            return self.required.then(|| "Required".to_owned());
        }
        if let Some(min) = self.min.filter(|m| len < *m) {
            return Some(format!("Min {min} chars"));
        }
        if let Some(max) = self.max.filter(|m| len > *m) {
            return Some(format!("Max {max} chars"));
        }
        None
    }
}

/// Per-field validation messages, one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self(BTreeMap::from([(field.to_owned(), message.into())]))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    rules: Vec<FieldRule>,
}

impl Schema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Validate the serialized form of `values`. A form that cannot be
    /// encoded is an internal error, not a field failure.
    pub fn validate<F: Serialize>(&self, values: &F) -> Result<(), CoreError> {
        let json = encode_form(values)?;
        self.check(&json).map_err(CoreError::Validation)
    }

    /// Check an already encoded form.
    pub fn check(&self, json: &Value) -> Result<(), FieldErrors> {
        let mut errors = BTreeMap::new();
        for rule in &self.rules {
            if let Some(message) = rule.check(json.get(rule.field)) {
                errors.entry(rule.field.to_owned()).or_insert(message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldErrors(errors))
        }
    }
}

fn encode_form<F: Serialize>(values: &F) -> Result<Value, CoreError> {
    serde_json::to_value(values).map_err(|e| CoreError::Internal(format!("form encoding failed: {e}")))
}

// ── Resource description ─────────────────────────────────────────────

/// Endpoint and wording for one editable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Collection path, e.g. `duties`.
    pub path: &'static str,
    /// Body envelope key, e.g. `duty`.
    pub singular: &'static str,
    /// Human name used in delete messages, e.g. `Duty`.
    pub label: &'static str,
    pub list_route: &'static str,
    pub created: &'static str,
    pub updated: &'static str,
    pub save_failed: &'static str,
    pub delete_failed: &'static str,
}

impl ResourceSpec {
    pub fn deleted(&self, name: &str) -> String {
        format!("{} {name} deleted successfully!", self.label)
    }
}

// ── Mutation ─────────────────────────────────────────────────────────

/// One prepared write, independent of the editor that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mutation {
    Create {
        path: &'static str,
        singular: &'static str,
        body: Value,
    },
    Update {
        path: &'static str,
        id: i64,
        singular: &'static str,
        body: Value,
    },
    Delete {
        path: &'static str,
        id: i64,
    },
}

impl Mutation {
    pub async fn execute(&self, client: &ResourceClient) -> Result<Value, CoreError> {
        match self {
            Mutation::Create { path, singular, body } => {
                debug!(resource = path, "creating record");
                Ok(client.create::<Value, _>(path, singular, body).await?)
            }
            Mutation::Update {
                path,
                id,
                singular,
                body,
            } => {
                debug!(resource = path, id, "updating record");
                Ok(client.update::<Value, _>(path, id, singular, body).await?)
            }
            Mutation::Delete { path, id } => {
                debug!(resource = path, id, "deleting record");
                client.destroy(path, id).await?;
                Ok(Value::Null)
            }
        }
    }
}

// ── Editor ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditorMode {
    Create,
    Update { id: i64 },
}

/// Where the editor lives, which decides what happens after a save.
#[derive(Clone, Default)]
pub enum EditorHost {
    /// Inside a list page's modal; `on_close` runs after a save.
    Embedded { on_close: Hook },
    /// On its own route; a save navigates back to the list route.
    #[default]
    Routed,
}

impl fmt::Debug for EditorHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorHost::Embedded { .. } => f.write_str("Embedded"),
            EditorHost::Routed => f.write_str("Routed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorResult {
    /// Saved; the embedding page's close hook has run.
    Closed(Value),
    /// Saved; the caller should navigate to `to`.
    Navigate { to: String, record: Value },
    /// The request failed; the editor stays open showing `0`.
    Failed(String),
}

impl EditorResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, EditorResult::Failed(_))
    }

    pub fn record(&self) -> Option<&Value> {
        match self {
            EditorResult::Closed(record) | EditorResult::Navigate { record, .. } => Some(record),
            EditorResult::Failed(_) => None,
        }
    }
}

/// Create/update form for one resource. `F` is the serializable field set.
pub struct Editor<F> {
    spec: &'static ResourceSpec,
    schema: Schema,
    host: EditorHost,
    refresh: Option<Hook>,
    values: F,
    field_errors: FieldErrors,
    modal: Modal<EditorMode>,
}

impl<F: Serialize> Editor<F> {
    pub fn new(spec: &'static ResourceSpec, schema: Schema, mode: EditorMode, values: F) -> Self {
        let mut modal = Modal::new();
        modal.open(mode);
        Self {
            spec,
            schema,
            host: EditorHost::Routed,
            refresh: None,
            values,
            field_errors: FieldErrors::default(),
            modal,
        }
    }

    #[must_use]
    pub fn host(mut self, host: EditorHost) -> Self {
        self.host = host;
        self
    }

    /// Called after every successful save, before the alert.
    #[must_use]
    pub fn on_refresh(mut self, refresh: Hook) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.spec
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.modal.kind().copied()
    }

    pub fn values(&self) -> &F {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut F {
        &mut self.values
    }

    pub fn modal(&self) -> &Modal<EditorMode> {
        &self.modal
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Submission error shown inline, if the last attempt failed.
    pub fn error(&self) -> Option<&str> {
        self.modal.error()
    }

    pub fn is_submit_enabled(&self) -> bool {
        !self.modal.is_submitting()
    }

    /// Validate and enter `submitting`. Validation failures never reach
    /// the network and leave the editor open.
    pub fn prepare(&mut self) -> Result<Mutation, CoreError> {
        if self.modal.is_submitting() {
            return Err(crate::modal::ModalError::AlreadySubmitting.into());
        }
        let body = encode_form(&self.values)?;
        if let Err(errors) = self.schema.check(&body) {
            self.field_errors = errors.clone();
            return Err(CoreError::Validation(errors));
        }
        self.field_errors = FieldErrors::default();

        let mode = *self.modal.begin_submit()?;
        Ok(match mode {
            EditorMode::Create => Mutation::Create {
                path: self.spec.path,
                singular: self.spec.singular,
                body,
            },
            EditorMode::Update { id } => Mutation::Update {
                path: self.spec.path,
                id,
                singular: self.spec.singular,
                body,
            },
        })
    }

    /// Apply a finished request.
    pub fn complete(&mut self, result: Result<Value, CoreError>, alerts: &AlertBus) -> EditorResult {
        match result {
            Ok(record) => {
                let mode = self.modal.succeed();
                if let Some(refresh) = &self.refresh {
                    refresh();
                }
                let message = match mode {
                    Some(EditorMode::Update { .. }) => self.spec.updated,
                    _ => self.spec.created,
                };
                info!(resource = self.spec.path, "{message}");
                alerts.show(Alert::success(message));
                match &self.host {
                    EditorHost::Embedded { on_close } => {
                        on_close();
                        EditorResult::Closed(record)
                    }
                    EditorHost::Routed => EditorResult::Navigate {
                        to: self.spec.list_route.to_owned(),
                        record,
                    },
                }
            }
            Err(e) => {
                let message = e.user_message(self.spec.save_failed);
                self.modal.fail(message.clone());
                EditorResult::Failed(message)
            }
        }
    }

    /// `prepare`, execute and `complete` in one go.
    pub async fn submit(&mut self, client: &ResourceClient, alerts: &AlertBus) -> Result<EditorResult, CoreError> {
        let mutation = self.prepare()?;
        let result = mutation.execute(client).await;
        Ok(self.complete(result, alerts))
    }
}

// ── Delete confirmation ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResult {
    Deleted { id: i64, message: String },
    Failed(String),
}

/// Confirm-then-delete dialog for one record.
pub struct DeleteConfirmation {
    spec: &'static ResourceSpec,
    id: i64,
    name: String,
    refresh: Option<Hook>,
    modal: Modal<i64>,
}

impl DeleteConfirmation {
    pub fn new(spec: &'static ResourceSpec, id: i64, name: impl Into<String>) -> Self {
        let mut modal = Modal::new();
        modal.open(id);
        Self {
            spec,
            id,
            name: name.into(),
            refresh: None,
            modal,
        }
    }

    #[must_use]
    pub fn on_refresh(mut self, refresh: Hook) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> String {
        format!("Are you sure you want to delete {} {}?", self.spec.label, self.name)
    }

    pub fn modal(&self) -> &Modal<i64> {
        &self.modal
    }

    pub fn error(&self) -> Option<&str> {
        self.modal.error()
    }

    pub fn is_open(&self) -> bool {
        self.modal.is_visible()
    }

    pub fn prepare(&mut self) -> Result<Mutation, CoreError> {
        let id = *self.modal.begin_submit()?;
        Ok(Mutation::Delete {
            path: self.spec.path,
            id,
        })
    }

    pub fn complete(&mut self, result: Result<Value, CoreError>, alerts: &AlertBus) -> DeleteResult {
        match result {
            Ok(_) => {
                self.modal.succeed();
                if let Some(refresh) = &self.refresh {
                    refresh();
                }
                let message = self.spec.deleted(&self.name);
                info!(resource = self.spec.path, id = self.id, "{message}");
                alerts.show(Alert::success(message.clone()));
                DeleteResult::Deleted { id: self.id, message }
            }
            Err(e) => {
                let message = e.user_message(self.spec.delete_failed);
                self.modal.fail(message.clone());
                DeleteResult::Failed(message)
            }
        }
    }

    /// Close without a request.
    pub fn cancel(&mut self) -> bool {
        self.modal.cancel()
    }

    pub async fn confirm(&mut self, client: &ResourceClient, alerts: &AlertBus) -> Result<DeleteResult, CoreError> {
        let mutation = self.prepare()?;
        let result = mutation.execute(client).await;
        Ok(self.complete(result, alerts))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_RESOURCE: ResourceSpec = ResourceSpec {
        path: "widgets",
        singular: "widget",
        label: "Widget",
        list_route: "/widgets",
        created: "Widget created",
        updated: "Widget updated",
        save_failed: "An error occurred",
        delete_failed: "Failed to delete widget",
    };

    #[derive(Serialize)]
    struct Form {
        name: String,
    }

    fn schema() -> Schema {
        Schema::new(vec![FieldRule::new("name").required().min(3).max(50)])
    }

    fn form(name: &str) -> Form {
        Form { name: name.into() }
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("unsupported field"))
        }
    }

    fn name_error(name: &str) -> Option<String> {
        match schema().validate(&form(name)) {
            Err(CoreError::Validation(errors)) => errors.get("name").map(str::to_owned),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => None,
        }
    }

    #[test]
    fn schema_reports_first_failure_per_field() {
        assert_eq!(name_error("").as_deref(), Some("Required"));
        assert_eq!(name_error("ab").as_deref(), Some("Min 3 chars"));
        let long = "x".repeat(51);
        assert_eq!(name_error(&long).as_deref(), Some("Max 50 chars"));
        assert_eq!(name_error("abc"), None);
    }

    #[test]
    fn unencodable_form_is_not_a_field_failure() {
        let err = schema().validate(&Unencodable).unwrap_err();
        assert!(matches!(err, CoreError::Internal(ref m) if m.contains("unsupported field")));

        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Create, Unencodable);
        assert!(matches!(editor.prepare(), Err(CoreError::Internal(_))));
        assert!(editor.field_errors().is_empty());
        assert!(!editor.modal().is_submitting());
    }

    #[test]
    fn length_counts_characters() {
        assert!(schema().validate(&form("été")).is_ok());
    }

    #[test]
    fn invalid_form_never_prepares_a_request() {
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Create, form("ab"));
        assert!(matches!(editor.prepare(), Err(CoreError::Validation(_))));
        assert_eq!(editor.field_errors().get("name"), Some("Min 3 chars"));
        assert!(editor.is_submit_enabled());
    }

    #[test]
    fn update_prepares_patch_with_id() {
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Update { id: 9 }, form("Grading"));
        assert_eq!(
            editor.prepare().unwrap(),
            Mutation::Update {
                path: "widgets",
                id: 9,
                singular: "widget",
                body: json!({"name": "Grading"})
            }
        );
        assert!(!editor.is_submit_enabled());
        assert!(matches!(editor.prepare(), Err(CoreError::Modal(_))));
    }

    #[test]
    fn routed_save_navigates_to_list() {
        let alerts = AlertBus::new();
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Create, form("Grading"));
        editor.prepare().unwrap();
        let result = editor.complete(Ok(json!({"id": 1})), &alerts);
        assert_eq!(
            result,
            EditorResult::Navigate {
                to: "/widgets".into(),
                record: json!({"id": 1})
            }
        );
        assert_eq!(alerts.current(), Some(Alert::success("Widget created")));
    }

    #[test]
    fn embedded_save_runs_refresh_and_close() {
        let refreshed = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));
        let (r, c) = (Arc::clone(&refreshed), Arc::clone(&closed));
        let alerts = AlertBus::new();
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Update { id: 2 }, form("Grading"))
            .on_refresh(Arc::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            }))
            .host(EditorHost::Embedded {
                on_close: Arc::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            });
        editor.prepare().unwrap();
        assert!(matches!(editor.complete(Ok(Value::Null), &alerts), EditorResult::Closed(_)));
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(alerts.current(), Some(Alert::success("Widget updated")));
        assert!(!editor.modal().is_visible());
    }

    #[test]
    fn failed_save_stays_open_with_server_message() {
        let alerts = AlertBus::new();
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Create, form("Grading"));
        editor.prepare().unwrap();
        let err = CoreError::Rejected {
            status: 422,
            message: Some("Name has already been taken".into()),
        };
        assert_eq!(
            editor.complete(Err(err), &alerts),
            EditorResult::Failed("Name has already been taken".into())
        );
        assert_eq!(editor.error(), Some("Name has already been taken"));
        assert!(editor.is_submit_enabled());
        assert_eq!(alerts.current(), None);
    }

    #[test]
    fn failed_save_without_message_uses_fallback() {
        let alerts = AlertBus::new();
        let mut editor = Editor::new(&TEST_RESOURCE, schema(), EditorMode::Create, form("Grading"));
        editor.prepare().unwrap();
        editor.complete(Err(CoreError::Timeout), &alerts);
        assert_eq!(editor.error(), Some("An error occurred"));
    }

    #[test]
    fn delete_cancel_closes_without_request() {
        let mut confirm = DeleteConfirmation::new(&TEST_RESOURCE, 7, "Grading");
        assert_eq!(confirm.prompt(), "Are you sure you want to delete Widget Grading?");
        assert!(confirm.cancel());
        assert!(!confirm.is_open());
        assert!(confirm.prepare().is_err());
    }

    #[test]
    fn delete_success_message_names_record() {
        let alerts = AlertBus::new();
        let mut confirm = DeleteConfirmation::new(&TEST_RESOURCE, 7, "Grading");
        assert_eq!(
            confirm.prepare().unwrap(),
            Mutation::Delete { path: "widgets", id: 7 }
        );
        let result = confirm.complete(Ok(Value::Null), &alerts);
        assert_eq!(
            result,
            DeleteResult::Deleted {
                id: 7,
                message: "Widget Grading deleted successfully!".into()
            }
        );
        assert!(!confirm.is_open());
    }
}
