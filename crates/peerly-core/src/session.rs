// ── Session / auth state ──
//
// One `SessionStore` per process, owned by `AppContext`. Written only by
// login/logout/restore; read by the route guard and by pages that need
// the acting user's identity.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use peerly_api::ResourceClient;

use crate::error::CoreError;
use crate::role::Role;

/// The authenticated user, as carried in the token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub institution_id: Option<i64>,
}

impl SessionUser {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Snapshot of the session. Anonymous sessions carry a guest user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user: SessionUser,
}

impl Session {
    pub fn authenticated(user: SessionUser) -> Self {
        Self {
            authenticated: true,
            user,
        }
    }

    pub fn role(&self) -> Role {
        if self.authenticated {
            self.user.role
        } else {
            Role::Guest
        }
    }

    /// Id of the acting user, `None` when anonymous.
    pub fn user_id(&self) -> Option<i64> {
        self.authenticated.then_some(self.user.id)
    }
}

#[derive(Deserialize)]
struct Claims {
    #[serde(flatten)]
    user: SessionUser,
    #[serde(default)]
    exp: Option<i64>,
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// The server verifies the token on every request; the client only
/// needs the claims to know who is acting.
pub fn decode_token(token: &str) -> Result<SessionUser, CoreError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| malformed("expected three dot-separated segments"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| malformed(&e.to_string()))?;
    let claims: Claims = serde_json::from_slice(&bytes).map_err(|e| malformed(&e.to_string()))?;

    if let Some(exp) = claims.exp {
        if exp < chrono::Utc::now().timestamp() {
            return Err(CoreError::AuthenticationFailed {
                message: "session expired, please log in again".into(),
            });
        }
    }
    Ok(claims.user)
}

fn malformed(reason: &str) -> CoreError {
    CoreError::AuthenticationFailed {
        message: format!("malformed session token: {reason}"),
    }
}

/// Process-wide session holder backed by a `watch` channel.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Session::default());
        Self { tx: Arc::new(tx) }
    }

    /// Current session snapshot.
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Subscribe to session changes (login, logout).
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Replace the session directly.
    pub fn set(&self, session: Session) {
        self.tx.send_replace(session);
    }

    /// Log in with credentials, install the bearer token, publish the session.
    pub async fn login(
        &self,
        client: &ResourceClient,
        user_name: &str,
        password: &SecretString,
    ) -> Result<Session, CoreError> {
        let response = client.login(user_name, password).await?;
        let session = self.restore(client, SecretString::from(response.token))?;
        info!(user = %session.user.name, role = %session.user.role, "logged in");
        Ok(session)
    }

    /// Adopt an existing token (e.g. one saved in a profile).
    pub fn restore(
        &self,
        client: &ResourceClient,
        token: SecretString,
    ) -> Result<Session, CoreError> {
        let user = decode_token(token.expose_secret())?;
        debug!(user_id = user.id, "session token decoded");
        client.set_token(Some(token));
        let session = Session::authenticated(user);
        self.set(session.clone());
        Ok(session)
    }

    /// Drop the token and return to an anonymous session.
    pub fn logout(&self, client: &ResourceClient) {
        client.set_token(None);
        self.set(Session::default());
        info!("logged out");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Build an unsigned token carrying the given claims.
    pub(crate) fn token_for(claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn decodes_user_claims() {
        let token = token_for(&json!({
            "id": 3,
            "name": "instructor3",
            "full_name": "Ada Lovelace",
            "role": "Instructor",
            "institution_id": 1,
            "exp": 4_102_444_800_i64
        }));
        let user = decode_token(&token).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_for(&json!({"id": 1, "name": "old", "role": "Student", "exp": 10}));
        let err = decode_token(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(decode_token("not-a-token").is_err());
        assert!(decode_token("a.!!!.c").is_err());
    }

    #[test]
    fn anonymous_session_is_guest() {
        let session = Session::default();
        assert!(!session.authenticated);
        assert_eq!(session.role(), Role::Guest);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn restore_and_logout_toggle_session_and_token() {
        let store = SessionStore::new();
        let client = ResourceClient::from_reqwest("http://localhost:1", reqwest_client()).unwrap();
        let mut rx = store.subscribe();

        let token = token_for(&json!({"id": 5, "name": "ta5", "role": "Teaching Assistant"}));
        let session = store.restore(&client, token.into()).unwrap();
        assert!(session.authenticated);
        assert!(client.has_token());
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().user.id, 5);

        store.logout(&client);
        assert!(!client.has_token());
        assert!(!store.current().authenticated);
    }

    fn reqwest_client() -> peerly_api::reqwest::Client {
        peerly_api::reqwest::Client::new()
    }
}
