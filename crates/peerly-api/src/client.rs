// REST resource client
//
// Wraps `reqwest::Client` with the backend's resource conventions:
// `GET /<resource>`, `GET /<resource>/<id>`, `POST /<resource>` with a
// `{ <singular>: fields }` envelope, `PATCH /<resource>/<id>` and
// `DELETE /<resource>/<id>`. Bearer auth is swapped in after login.

use std::fmt::Display;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

// ── Response shapes ──────────────────────────────────────────────────

/// List/read responses carry a top-level `data` field. Some endpoints
/// answer with the bare payload instead, so both are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

/// Response of `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    user_name: &'a str,
    password: &'a str,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the backend's REST resources.
///
/// Cheap to share behind an `Arc`; the bearer token lives in an
/// `ArcSwapOption` so login/logout never need `&mut self`.
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: Url,
    token: ArcSwapOption<SecretString>,
}

impl ResourceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            token: ArcSwapOption::empty(),
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Token management ─────────────────────────────────────────────

    /// Install (or clear) the bearer token sent with every request.
    pub fn set_token(&self, token: Option<SecretString>) {
        debug!(present = token.is_some(), "updating bearer token");
        self.token.store(token.map(Arc::new));
    }

    pub fn has_token(&self) -> bool {
        self.token.load().is_some()
    }

    /// The installed bearer token, for callers that persist it.
    pub fn token(&self) -> Option<SecretString> {
        self.token.load_full().map(|t| SecretString::clone(&t))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token.load_full() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"duties/7"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.authorize(self.http.get(url)).send().await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.authorize(self.http.get(url).query(params)).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.authorize(self.http.post(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PATCH {url}");

        let resp = self.authorize(self.http.patch(url).json(body)).send().await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.authorize(self.http.delete(url)).send().await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            // 204 / empty bodies deserialize as `null`.
            let text = if body.trim().is_empty() { "null" } else { body.as_str() };
            serde_json::from_str(text).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body: body.clone(),
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = extract_message(&raw);

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: message.unwrap_or_else(|| "session expired or invalid credentials".into()),
            };
        }

        Error::Server {
            status: status.as_u16(),
            message,
            body: raw,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Session ──────────────────────────────────────────────────────

    /// Exchange credentials for a bearer token. Does not install it.
    pub async fn login(&self, user_name: &str, password: &SecretString) -> Result<TokenResponse, Error> {
        let body = LoginRequest {
            user_name,
            password: password.expose_secret(),
        };
        self.post("login", &body).await
    }

    // ── Resources ────────────────────────────────────────────────────

    /// `GET /<resource>`, unwrapping the `data` envelope.
    pub async fn list<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>, Error> {
        let envelope: Envelope<Vec<T>> = self.get(resource).await?;
        Ok(envelope.into_inner())
    }

    /// `GET /<resource>?k=v...`, unwrapping the `data` envelope.
    pub async fn list_with_params<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let envelope: Envelope<Vec<T>> = self.get_with_params(resource, params).await?;
        Ok(envelope.into_inner())
    }

    /// `GET /<resource>/<id>`, unwrapping the `data` envelope.
    pub async fn read<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: impl Display,
    ) -> Result<T, Error> {
        let envelope: Envelope<T> = self.get(&format!("{resource}/{id}")).await?;
        Ok(envelope.into_inner())
    }

    /// `POST /<resource>` with body `{ <singular>: fields }`.
    pub async fn create<T: DeserializeOwned, F: Serialize + Sync>(
        &self,
        resource: &str,
        singular: &str,
        fields: &F,
    ) -> Result<T, Error> {
        let body = wrap(singular, fields)?;
        let envelope: Envelope<T> = self.post(resource, &body).await?;
        Ok(envelope.into_inner())
    }

    /// `PATCH /<resource>/<id>` with body `{ <singular>: fields }`.
    pub async fn update<T: DeserializeOwned, F: Serialize + Sync>(
        &self,
        resource: &str,
        id: impl Display,
        singular: &str,
        fields: &F,
    ) -> Result<T, Error> {
        let body = wrap(singular, fields)?;
        let envelope: Envelope<T> = self.patch(&format!("{resource}/{id}"), &body).await?;
        Ok(envelope.into_inner())
    }

    /// `DELETE /<resource>/<id>`.
    pub async fn destroy(&self, resource: &str, id: impl Display) -> Result<(), Error> {
        self.delete(&format!("{resource}/{id}")).await
    }

    // ── Raw paths ────────────────────────────────────────────────────

    /// `GET` an arbitrary path without envelope handling.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get(path).await
    }

    /// `PATCH` an arbitrary path with a raw JSON body.
    pub async fn patch_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        self.patch(path, body).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn wrap<F: Serialize>(singular: &str, fields: &F) -> Result<Value, Error> {
    let inner = serde_json::to_value(fields).map_err(|e| Error::Deserialization {
        message: format!("failed to encode {singular}: {e}"),
        body: String::new(),
    })?;
    let mut outer = Map::new();
    outer.insert(singular.to_owned(), inner);
    Ok(Value::Object(outer))
}

/// Pull a human-readable message out of an error body.
///
/// Tries `message`, then `error`, then a flattened `errors` object
/// (`{"name": ["is too short"]}` becomes `"name is too short"`).
fn extract_message(raw: &str) -> Option<String> {
    let body: ErrorBody = serde_json::from_str(raw).ok()?;
    body.message
        .as_ref()
        .and_then(flatten)
        .or_else(|| body.error.as_ref().and_then(flatten))
        .or_else(|| body.errors.as_ref().and_then(flatten))
}

fn flatten(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(flatten)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .filter_map(|(field, v)| flatten(v).map(|msg| format!("{field} {msg}")))
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_field_wins() {
        let raw = json!({"message": "Duty not found", "error": "ignored"}).to_string();
        assert_eq!(extract_message(&raw).as_deref(), Some("Duty not found"));
    }

    #[test]
    fn error_field_is_second_choice() {
        let raw = json!({"error": "Not Authorized"}).to_string();
        assert_eq!(extract_message(&raw).as_deref(), Some("Not Authorized"));
    }

    #[test]
    fn errors_object_is_flattened() {
        let raw = json!({"errors": {"name": ["is too short", "is invalid"]}}).to_string();
        assert_eq!(
            extract_message(&raw).as_deref(),
            Some("name is too short, is invalid")
        );
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert!(extract_message("<html>502 Bad Gateway</html>").is_none());
    }

    #[test]
    fn envelope_accepts_wrapped_and_bare() {
        let wrapped: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        let bare: Envelope<Vec<u32>> = serde_json::from_str("[3]").unwrap();
        assert_eq!(wrapped.into_inner(), vec![1, 2]);
        assert_eq!(bare.into_inner(), vec![3]);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = ResourceClient::normalize_base_url("http://localhost:3002/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3002/api/v1/");
        assert_eq!(
            url.join("duties/7").unwrap().as_str(),
            "http://localhost:3002/api/v1/duties/7"
        );
    }

    #[test]
    fn wrap_uses_singular_key() {
        let body = wrap("duty", &json!({"name": "Grading"})).unwrap();
        assert_eq!(body, json!({"duty": {"name": "Grading"}}));
    }
}
