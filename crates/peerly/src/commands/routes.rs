//! Route table command handlers.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use peerly_core::routes::{Params, RouteSummary};
use peerly_core::{
    AppContext, CoreError, PageOutcome, RedirectReason, Resolution, Role, Session, SessionUser,
    app_routes,
};

use crate::cli::{GlobalOpts, RoutesArgs, RoutesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Page")]
    page: String,
    #[tabled(rename = "Loader")]
    loader: String,
    #[tabled(rename = "Access")]
    access: String,
}

impl From<&RouteSummary> for RouteRow {
    fn from(r: &RouteSummary) -> Self {
        Self {
            path: r.path.clone(),
            page: r.page.to_string(),
            loader: r.loader.map(|l| l.to_string()).unwrap_or_default(),
            access: r.access.to_string(),
        }
    }
}

// ── Resolution report ───────────────────────────────────────────────

/// Serializable summary of how a path resolved.
#[derive(Debug, Serialize)]
struct Resolved {
    path: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(skip_serializing_if = "Params::is_empty")]
    params: Params,
    #[serde(skip_serializing_if = "Params::is_empty")]
    query: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<RedirectReason>,
}

impl Resolved {
    fn new(path: &str, resolution: Resolution) -> Self {
        let mut out = Self {
            path: path.into(),
            outcome: "render",
            page: None,
            access: None,
            params: Params::new(),
            query: Params::new(),
            redirect_to: None,
            reason: None,
        };
        match resolution {
            Resolution::Render(matched) => {
                out.page = Some(matched.page().to_string());
                out.access = Some(matched.access().to_string());
                out.params = matched.params;
                out.query = matched.query;
            }
            Resolution::Redirect { to, reason } => {
                out.outcome = "redirect";
                out.redirect_to = Some(to);
                out.reason = Some(reason);
            }
            Resolution::NotFound { .. } => out.outcome = "not_found",
        }
        out
    }

    fn detail(&self) -> String {
        let mut s = String::new();
        match self.outcome {
            "redirect" => {
                let _ = write!(
                    s,
                    "{} -> {}",
                    self.path,
                    self.redirect_to.as_deref().unwrap_or_default()
                );
                if let Some(reason) = self.reason {
                    let _ = write!(s, " ({reason:?})");
                }
            }
            "not_found" => {
                let _ = write!(s, "{}: no route", self.path);
            }
            _ => {
                let _ = write!(
                    s,
                    "{} renders {} [{}]",
                    self.path,
                    self.page.as_deref().unwrap_or_default(),
                    self.access.as_deref().unwrap_or_default()
                );
                for (k, v) in &self.params {
                    let _ = write!(s, "\n  :{k} = {v}");
                }
                for (k, v) in &self.query {
                    let _ = write!(s, "\n  ?{k} = {v}");
                }
            }
        }
        s
    }
}

fn simulated_session(role: Option<&str>, user_id: i64) -> Result<Session, CliError> {
    let Some(role) = role else {
        return Ok(Session::default());
    };
    let role: Role = role.parse().map_err(|_| CliError::Validation {
        field: "as".into(),
        reason: format!("unknown role '{role}'"),
    })?;
    Ok(Session::authenticated(SessionUser {
        id: user_id,
        name: format!("user{user_id}"),
        role,
        ..SessionUser::default()
    }))
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(args: RoutesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        RoutesCommand::List => list(global),
        RoutesCommand::Resolve {
            path,
            role,
            user_id,
        } => resolve(&path, role.as_deref(), user_id, global),
        RoutesCommand::Open { path } => {
            let (ctx, profile) = super::connect(global).await?;
            open(&ctx, &path, global, &profile).await
        }
    }
}

fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let routes = app_routes().map_err(CoreError::from)?;
    let summaries = routes.summaries();
    let out = output::render_list(
        global.output,
        &summaries,
        |r| RouteRow::from(r),
        |r| r.path.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Resolve against the route table alone, as an anonymous visitor or a
/// simulated user.
fn resolve(
    path: &str,
    role: Option<&str>,
    user_id: i64,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let routes = app_routes().map_err(CoreError::from)?;
    let session = simulated_session(role, user_id)?;
    let resolved = Resolved::new(path, routes.resolve(path, &session));
    let out = output::render_single(global.output, &resolved, Resolved::detail, |r| {
        r.redirect_to
            .clone()
            .or_else(|| r.page.clone())
            .unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Full navigation with loaders against the server.
async fn open(
    ctx: &AppContext,
    path: &str,
    global: &GlobalOpts,
    profile: &str,
) -> Result<(), CliError> {
    match ctx.navigate(path).await {
        PageOutcome::Ready(loaded) => {
            let out = output::render_single(
                global.output,
                &loaded,
                |p| {
                    let mut s = format!("{} ({})", p.page(), p.route.path);
                    for (name, value) in &p.data {
                        let body = serde_json::to_string_pretty(value).unwrap_or_default();
                        let _ = write!(s, "\n\n{name}:\n{body}");
                    }
                    s
                },
                |p| p.page().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        PageOutcome::Redirect {
            reason: RedirectReason::Login,
            ..
        } => Err(CliError::NotLoggedIn {
            profile: profile.into(),
        }),
        PageOutcome::Redirect {
            reason: RedirectReason::Unauthorized,
            ..
        } => {
            util::report_alert(ctx, global);
            Err(CliError::Forbidden { path: path.into() })
        }
        PageOutcome::Redirect { to, .. } => {
            if !global.quiet {
                eprintln!("{path} redirects to {to}");
            }
            Box::pin(open(ctx, &to, global, profile)).await
        }
        PageOutcome::NotFound { path } => Err(CliError::NotFound {
            resource_type: "page".into(),
            identifier: path,
            list_command: "routes list".into(),
        }),
        PageOutcome::Failed {
            page,
            status,
            message,
        } => Err(CliError::ApiError {
            status,
            message: format!("{page}: {message}"),
        }),
    }
}
