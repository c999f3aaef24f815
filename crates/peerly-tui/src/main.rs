//! `peerly-tui`: terminal front end for the peerly peer-review backend.
//!
//! Routes, guards and loaders come from `peerly-core`; this crate draws
//! them with [ratatui](https://ratatui.rs). Sections are reachable with
//! number keys (Home, Assignments, Duties) and any location through the
//! `:` prompt.
//!
//! Logs go to a daily rolling file so they never corrupt the terminal.

mod action;
mod app;
mod bridge;
mod component;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use peerly_core::{Alert, AppConfig, AppContext};

use crate::app::App;

/// Terminal UI for the peerly peer-review backend.
#[derive(Parser, Debug)]
#[command(name = "peerly-tui", version, about)]
struct Cli {
    /// Location to open first
    #[arg(default_value = "/")]
    location: String,

    /// Config profile to use
    #[arg(short, long, env = "PEERLY_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile (e.g. http://localhost:3002)
    #[arg(short, long, env = "PEERLY_SERVER")]
    server: Option<String>,

    /// Directory for log files (defaults to the system temp dir)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may be written to stdout or stderr while
/// the terminal is in raw mode. Hold the guard until exit.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let default_filter = match cli.verbose {
        0 => "peerly_tui=info,peerly_core=info,peerly_api=warn".to_owned(),
        1 => "peerly_tui=debug,peerly_core=debug,peerly_api=debug".to_owned(),
        _ => "trace".to_owned(),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let log_dir = cli.log_dir.clone().unwrap_or_else(std::env::temp_dir);
    let file_appender = tracing_appender::rolling::daily(log_dir, "peerly-tui.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// `--server` wins over the profile. With neither there is nothing to
/// talk to.
fn build_app_config(cli: &Cli) -> Result<AppConfig> {
    let cfg = peerly_config::load_config_or_default();
    let profile_name = cfg.profile_name(cli.profile.as_deref()).to_owned();
    let profile = cfg.profiles.get(&profile_name);

    match (&cli.server, profile) {
        (Some(server), profile) => {
            let url = peerly_config::parse_server(server)?;
            let from_profile = profile.and_then(|p| {
                peerly_config::profile_to_app_config(p, &profile_name, &cfg.defaults)
                    .inspect_err(|e| warn!(error = %e, "profile settings ignored"))
                    .ok()
            });
            let mut config = from_profile.unwrap_or_else(|| AppConfig::new(url.clone()));
            config.url = url;
            Ok(config)
        }
        (None, Some(p)) => Ok(peerly_config::profile_to_app_config(
            p,
            &profile_name,
            &cfg.defaults,
        )?),
        (None, None) => Err(eyre!(
            "no server configured for profile '{profile_name}'; run `peerly config init` or pass --server"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a failure below still restores the terminal.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config = build_app_config(&cli)?;
    info!(server = %config.url, location = %cli.location, "starting peerly-tui");

    let ctx = match AppContext::connect(&config).await {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "could not establish a session");
            let ctx = AppContext::from_config(&config)?;
            ctx.alerts.show(Alert::danger(e.user_message("Could not sign in")));
            ctx
        }
    };

    let mut app = App::new(ctx);
    app.run(&cli.location).await
}
