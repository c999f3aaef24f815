// ── Runtime connection configuration ──
//
// Describes how to reach the backend and who to act as. Built by the
// CLI/TUI from a config profile; core never reads config files.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use peerly_api::{TlsMode, TransportConfig};

/// Login credentials for `POST /login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_name: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API base URL, e.g. `http://localhost:3002`.
    pub url: Url,
    /// Used when no saved token is available (or it has expired).
    pub credentials: Option<Credentials>,
    /// A token saved by an earlier login.
    pub token: Option<SecretString>,
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            token: None,
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
