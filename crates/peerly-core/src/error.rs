// ── Core error types ──
//
// User-facing errors from peerly-core. Consumers never see raw reqwest
// errors or JSON parse failures; the `From<peerly_api::Error>` impl
// translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::editor::FieldErrors;
use crate::modal::ModalError;
use crate::routes::RouteError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Server errors ────────────────────────────────────────────────
    /// The server rejected the request. `message` is the server's own
    /// text when the body carried one.
    #[error("Server rejected the request (HTTP {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("API error: {message}")]
    Api { message: String },

    // ── Client-side errors ───────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Not authorized to view {path}")]
    Unauthorized { path: String },

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Modal(#[from] ModalError),

    #[error("Export failed: {message}")]
    Export { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The message to show a user: the server's text when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            }
            | Self::AuthenticationFailed { message } => message.clone(),
            Self::NotFound { .. } => self.to_string(),
            _ => fallback.to_owned(),
        }
    }

    /// HTTP-equivalent status for page-level error boundaries.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::AuthenticationFailed { .. } => Some(401),
            Self::Unauthorized { .. } => Some(403),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<peerly_api::Error> for CoreError {
    fn from(err: peerly_api::Error) -> Self {
        match err {
            peerly_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            peerly_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                    }
                }
            }
            peerly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            peerly_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            peerly_api::Error::Server {
                status: 404,
                message,
                body,
            } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: message.unwrap_or(body),
            },
            peerly_api::Error::Server {
                status, message, ..
            } => CoreError::Rejected { status, message },
            peerly_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_text_wins_over_fallback() {
        let err = CoreError::from(peerly_api::Error::Server {
            status: 422,
            message: Some("Name has already been taken".into()),
            body: String::new(),
        });
        assert_eq!(
            err.user_message("An error occurred"),
            "Name has already been taken"
        );
    }

    #[test]
    fn fallback_when_server_sent_nothing() {
        let err = CoreError::from(peerly_api::Error::Server {
            status: 500,
            message: None,
            body: "<html/>".into(),
        });
        assert_eq!(err.user_message("Failed to delete duty"), "Failed to delete duty");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn missing_resource_maps_to_not_found() {
        let err = CoreError::from(peerly_api::Error::Server {
            status: 404,
            message: Some("Couldn't find Assignment".into()),
            body: String::new(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(err.status(), Some(404));
    }
}
