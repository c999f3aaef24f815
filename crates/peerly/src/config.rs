//! CLI configuration: a thin wrapper around `peerly_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --user, --password, --token, --timeout, --insecure).

use std::time::Duration;

use secrecy::SecretString;

use peerly_core::{AppConfig, Credentials, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use peerly_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build an `AppConfig` from the config file, the active profile and
/// flag overrides. Flags win over the profile; the profile's password
/// chain is consulted only when no `--password` was given.
pub fn build_app_config(global: &GlobalOpts, cfg: &Config) -> Result<AppConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let profile = cfg.profiles.get(&profile_name);

    if profile.is_none() && global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(cfg),
        });
    }

    // 1. Server URL (flag > env > profile)
    let server = global
        .server
        .as_deref()
        .or(profile.map(|p| p.server.as_str()))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CliError::NoConfig {
            path: config_path().display().to_string(),
        })?;
    let url = peerly_config::parse_server(server)?;

    // 2. Credentials
    let user_name = global
        .user
        .clone()
        .or_else(|| profile.and_then(|p| p.user_name.clone()));
    let password = match (&global.password, profile) {
        (Some(pw), _) => Some(SecretString::from(pw.clone())),
        (None, Some(p)) => peerly_config::resolve_password(p, &profile_name),
        (None, None) => None,
    };
    let credentials = user_name
        .zip(password)
        .map(|(user_name, password)| Credentials {
            user_name,
            password,
        });

    // 3. Saved token (flag > env > profile)
    let token = global
        .token
        .clone()
        .or_else(|| profile.and_then(|p| p.token.clone()))
        .map(SecretString::from);

    // 4. Transport
    let timeout = global
        .timeout
        .or_else(|| profile.and_then(|p| p.timeout))
        .unwrap_or(cfg.defaults.timeout);

    let mut config = AppConfig::new(url);
    config.credentials = credentials;
    config.token = token;
    config.timeout = Duration::from_secs(timeout);
    if global.insecure || profile.is_some_and(|p| p.insecure) {
        config.tls = TlsMode::DangerAcceptInvalid;
    }
    Ok(config)
}
