//! Login and logout handlers.

use std::io::IsTerminal;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use peerly_core::AppContext;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::{self, Config};
use crate::error::CliError;

use super::util::prompt_err;

/// Who to log in as: flags, then the profile, then an interactive prompt.
fn login_name(global: &GlobalOpts, cfg: &Config, profile: &str) -> Result<String, CliError> {
    if let Some(name) = global
        .user
        .clone()
        .or_else(|| cfg.profiles.get(profile).and_then(|p| p.user_name.clone()))
    {
        return Ok(name);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile.into(),
        });
    }
    Input::new()
        .with_prompt("Login name")
        .interact_text()
        .map_err(prompt_err)
}

fn prompt_password(profile: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile.into(),
        });
    }
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    Ok(SecretString::from(password))
}

/// Write the session token (and login name) into `profile`, creating
/// the profile from `server` when it doesn't exist yet.
fn remember_token(
    cfg: &mut Config,
    profile: &str,
    server: &str,
    user_name: &str,
    token: &SecretString,
) {
    let entry = cfg.profiles.entry(profile.to_owned()).or_default();
    if entry.server.is_empty() {
        entry.server = server.to_owned();
    }
    if entry.user_name.is_none() {
        entry.user_name = Some(user_name.to_owned());
    }
    entry.token = Some(token.expose_secret().to_owned());
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile.to_owned());
    }
}

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);

    let mut app = config::build_app_config(global, &cfg)?;
    // A fresh login never reuses the saved token.
    app.token = None;

    let user_name = login_name(global, &cfg, &profile)?;
    let password = match app.credentials.take() {
        Some(creds) if creds.user_name == user_name => creds.password,
        _ => prompt_password(&profile)?,
    };

    let ctx = AppContext::from_config(&app)?;
    let session = ctx.login(&user_name, &password).await?;

    if !global.quiet {
        eprintln!(
            "✓ Logged in as {} ({})",
            session.user.display_name(),
            session.user.role
        );
    }

    if args.no_save {
        return Ok(());
    }
    let token = ctx.client.token().ok_or_else(|| CliError::AuthFailed {
        message: "server accepted the login but sent no token".into(),
    })?;
    remember_token(&mut cfg, &profile, app.url.as_str(), &user_name, &token);
    let path = config::save_config(&cfg)?;
    tracing::debug!(path = %path.display(), profile, "session token saved");
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);

    let had_token = cfg
        .profiles
        .get_mut(&profile)
        .and_then(|p| p.token.take())
        .is_some();
    if had_token {
        config::save_config(&cfg)?;
    }
    if !global.quiet {
        if had_token {
            eprintln!("✓ Logged out of profile '{profile}'");
        } else {
            eprintln!("No saved session for profile '{profile}'");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;

    #[test]
    fn remembering_creates_missing_profile() {
        let mut cfg = Config {
            default_profile: None,
            ..Config::default()
        };
        let token = SecretString::from("h.p.s".to_owned());
        remember_token(&mut cfg, "lab", "http://localhost:3002/", "ta1", &token);

        let lab = &cfg.profiles["lab"];
        assert_eq!(lab.server, "http://localhost:3002/");
        assert_eq!(lab.user_name.as_deref(), Some("ta1"));
        assert_eq!(lab.token.as_deref(), Some("h.p.s"));
        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
    }

    #[test]
    fn remembering_keeps_existing_settings() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                server: "https://reviews.example.edu".into(),
                user_name: Some("instructor6".into()),
                token: Some("old".into()),
                ..Profile::default()
            },
        );
        let token = SecretString::from("new".to_owned());
        remember_token(&mut cfg, "default", "http://ignored/", "someone", &token);

        let p = &cfg.profiles["default"];
        assert_eq!(p.server, "https://reviews.example.edu");
        assert_eq!(p.user_name.as_deref(), Some("instructor6"));
        assert_eq!(p.token.as_deref(), Some("new"));
    }
}
