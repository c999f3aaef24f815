//! Shared configuration for the peerly CLI and TUI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `peerly_core::AppConfig`. Both binaries depend on
//! this crate; the CLI layers its global flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use peerly_core::{AppConfig, Credentials};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "peerly";

/// Environment prefix for overrides (`PEERLY_DEFAULTS__OUTPUT=json`).
pub const ENV_PREFIX: &str = "PEERLY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile name to use: `requested`, else `default_profile`,
    /// else `"default"`.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "http://localhost:3002").
    pub server: String,

    /// Login name for `POST /login`.
    pub user_name: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Token saved by `peerly login`.
    pub token: Option<String>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Accept self-signed certificates.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub insecure: bool,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "peerly", "peerly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("peerly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

/// Resolve the profile's password: env var, then keyring, then plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .password
        .as_ref()
        .map(|pw| SecretString::from(pw.clone()))
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password)?;
    Ok(())
}

/// Resolve login credentials. `None` when the profile names no user.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(user_name) = profile.user_name.clone() else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name).ok_or_else(|| {
        ConfigError::NoCredentials {
            profile: profile_name.into(),
        }
    })?;
    Ok(Some(Credentials {
        user_name,
        password,
    }))
}

pub fn parse_server(server: &str) -> Result<url::Url, ConfigError> {
    server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })
}

/// Build an `AppConfig` from a profile, with no CLI flag overrides.
///
/// A saved token wins; credentials are only required when the profile
/// has neither a token nor a resolvable password for its user.
pub fn profile_to_app_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<AppConfig, ConfigError> {
    let url = parse_server(&profile.server)?;

    let token = profile.token.clone().map(SecretString::from);
    let credentials = match resolve_credentials(profile, profile_name) {
        Ok(creds) => creds,
        Err(ConfigError::NoCredentials { .. }) if token.is_some() => None,
        Err(e) => return Err(e),
    };

    let mut config = AppConfig::new(url);
    config.credentials = credentials;
    config.token = token;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if profile.insecure {
        config.tls = peerly_core::TlsMode::DangerAcceptInvalid;
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn profile(server: &str) -> Profile {
        Profile {
            server: server.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.defaults.output, "table");
        assert_eq!(cfg.defaults.timeout, 30);
        assert_eq!(cfg.profile_name(None), "default");
    }

    #[test]
    fn reads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "staging"

[defaults]
output = "json"

[profiles.staging]
server = "http://staging.example.edu:3002"
user_name = "instructor6"
timeout = 5
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.profile_name(None), "staging");
        assert_eq!(cfg.profile_name(Some("other")), "other");
        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        let staging = cfg.profile("staging").unwrap();
        assert_eq!(staging.user_name.as_deref(), Some("instructor6"));
        assert!(matches!(
            cfg.profile("missing"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                token: Some("abc.def.ghi".into()),
                ..profile("http://localhost:3002")
            },
        );

        save_config_to(&cfg, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn token_only_profile_needs_no_password() {
        let p = Profile {
            token: Some("abc.def.ghi".into()),
            ..profile("http://localhost:3002")
        };
        let app = profile_to_app_config(&p, "token-only", &Defaults::default()).unwrap();
        assert!(app.credentials.is_none());
        assert_eq!(app.token.unwrap().expose_secret(), "abc.def.ghi");
        assert_eq!(app.timeout, Duration::from_secs(30));
    }

    #[test]
    fn password_env_is_consulted_first() {
        // PATH is set in every test environment.
        let expected = std::env::var("PATH").unwrap();
        let p = Profile {
            user_name: Some("admin".into()),
            password: Some("plaintext".into()),
            password_env: Some("PATH".into()),
            ..profile("http://localhost:3002")
        };
        let creds = resolve_credentials(&p, "env-first").unwrap().unwrap();
        assert_eq!(creds.password.expose_secret(), expected);
    }

    #[test]
    fn plaintext_password_is_the_last_resort() {
        let p = Profile {
            user_name: Some("admin".into()),
            password: Some("plaintext".into()),
            password_env: Some("PEERLY_TEST_UNSET_PASSWORD_VAR".into()),
            timeout: Some(4),
            ..profile("http://localhost:3002")
        };
        let app = profile_to_app_config(&p, "peerly-test-no-keyring", &Defaults::default())
            .unwrap();
        let creds = app.credentials.unwrap();
        assert_eq!(creds.user_name, "admin");
        assert_eq!(creds.password.expose_secret(), "plaintext");
        assert_eq!(app.timeout, Duration::from_secs(4));
    }

    #[test]
    fn user_without_any_password_is_an_error() {
        let p = Profile {
            user_name: Some("admin".into()),
            ..profile("http://localhost:3002")
        };
        let err = profile_to_app_config(&p, "peerly-test-no-keyring", &Defaults::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));
    }

    #[test]
    fn bad_server_url_is_rejected() {
        let err = profile_to_app_config(&profile("not a url"), "x", &Defaults::default())
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid server"));
    }
}
