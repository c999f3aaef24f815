// peerly-api: Async Rust client for the peerly course and peer-review backend

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ResourceClient, TokenResponse};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

// Callers that build their own `reqwest::Client` use the same version.
pub use reqwest;
