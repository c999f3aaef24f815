// ── Application context ──
//
// Everything a front-end needs, created once at startup and passed by
// reference: the HTTP client, session, alert and event buses and the
// validated route table.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use peerly_api::ResourceClient;

use crate::alerts::AlertBus;
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::events::EventBus;
use crate::routes::{PageOutcome, RouteTable, app_routes, navigate};
use crate::session::{Session, SessionStore};

#[derive(Clone)]
pub struct AppContext {
    pub client: Arc<ResourceClient>,
    pub session: SessionStore,
    pub alerts: AlertBus,
    pub events: EventBus,
    pub routes: Arc<RouteTable>,
}

impl AppContext {
    /// Wrap an existing client. Fails only if the route table is invalid.
    pub fn new(client: ResourceClient) -> Result<Self, CoreError> {
        Ok(Self {
            client: Arc::new(client),
            session: SessionStore::new(),
            alerts: AlertBus::new(),
            events: EventBus::new(),
            routes: Arc::new(app_routes()?),
        })
    }

    /// Build the client from `config` without touching the network.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let client = ResourceClient::new(config.url.as_str(), &config.transport())?;
        Self::new(client)
    }

    /// Build the context and establish a session: a saved token first,
    /// then credentials. With neither, the session stays anonymous.
    pub async fn connect(config: &AppConfig) -> Result<Self, CoreError> {
        let ctx = Self::from_config(config)?;
        if let Some(token) = &config.token {
            match ctx.session.restore(&ctx.client, token.clone()) {
                Ok(session) => {
                    debug!(user = %session.user.name, "restored saved session");
                    return Ok(ctx);
                }
                Err(e) => warn!(error = %e, "saved token rejected"),
            }
        }
        if let Some(creds) = &config.credentials {
            ctx.login(&creds.user_name, &creds.password).await?;
        }
        Ok(ctx)
    }

    pub async fn login(&self, user_name: &str, password: &SecretString) -> Result<Session, CoreError> {
        self.session.login(&self.client, user_name, password).await
    }

    pub fn logout(&self) {
        self.session.logout(&self.client);
    }

    /// Resolve, guard and load a route.
    pub async fn navigate(&self, target: &str) -> PageOutcome {
        let outcome = navigate(self, target).await;
        if let PageOutcome::Redirect { to, reason } = &outcome {
            info!(from = target, to = %to, ?reason, "redirected");
        }
        outcome
    }
}
