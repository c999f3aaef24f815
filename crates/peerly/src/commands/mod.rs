//! Command dispatch: bridges CLI args -> core pages -> output formatting.

pub mod assignments;
pub mod config_cmd;
pub mod courses;
pub mod duties;
pub mod login;
pub mod reviews;
pub mod routes;
pub mod util;

use peerly_core::AppContext;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Build the context for the active profile and establish its session.
/// Returns the profile name alongside for error messages.
pub async fn connect(global: &GlobalOpts) -> Result<(AppContext, String), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let app = config::build_app_config(global, &cfg)?;
    let ctx = AppContext::connect(&app).await?;
    Ok((ctx, profile))
}

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let (ctx, profile) = connect(global).await?;
    match cmd {
        Command::Duties(args) => duties::handle(&ctx, args, global, &profile).await,
        Command::Assignments(args) => assignments::handle(&ctx, args, global, &profile).await,
        Command::Courses(args) => courses::handle(&ctx, args, global, &profile).await,
        Command::Reviews(args) => reviews::handle(&ctx, args, global, &profile).await,
        // Handled before a connection is made
        Command::Login(_)
        | Command::Logout
        | Command::Routes(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    }
}
