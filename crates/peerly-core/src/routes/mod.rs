// ── Route table ──
//
// An immutable tree of route nodes built once at startup. Construction
// validates the tree: sibling patterns must be distinct, a catch-all must
// be the last sibling, and no two nodes may produce the same full path.

mod app;
mod loader;
mod resolve;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::role::Role;

pub use app::app_routes;
pub use loader::{
    LoadedPage, LoaderData, LoaderId, PageOutcome, UNAUTHORIZED_MESSAGE, load, navigate,
};
pub use resolve::{
    LOGIN_PATH, MatchedRoute, Params, RedirectReason, Resolution, RouteMatch,
    UNAUTHORIZED_REDIRECT,
};

// ── Pages ────────────────────────────────────────────────────────────

/// Every page the router can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum PageId {
    Root,
    Home,
    Login,
    Logout,
    TeamGrades,
    Questionnaire,
    QuestionnaireEditor,
    Assignments,
    AssignmentEditor,
    CreateTeams,
    ResponseMappings,
    AssignReviewer,
    ViewSubmissions,
    SubmittedContent,
    ViewScores,
    ViewReports,
    ViewDelayedJobs,
    Participants,
    ParticipantEditor,
    SignupSheet,
    PartnerAdvertisements,
    StudentTeams,
    StudentTeamView,
    NewTeammateAdvertisement,
    TeammateReview,
    Users,
    UserEditor,
    StudentTasks,
    Profile,
    Reviews,
    ReviewTableau,
    EmailTheAuthor,
    ReviewReport,
    Courses,
    CourseEditor,
    CourseAssignments,
    Tas,
    TaEditor,
    Duties,
    DutyEditor,
    AdministratorLayout,
    Roles,
    RoleEditor,
    Institutions,
    InstitutionEditor,
    ManageUserTypes,
    Redirect,
    NotFound,
}

// ── Access ───────────────────────────────────────────────────────────

/// What a route requires of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Access {
    #[default]
    Public,
    Authenticated,
    MinRole(Role),
}

impl Access {
    /// The stricter of two requirements.
    pub fn combine(self, other: Access) -> Access {
        match (self, other) {
            (Access::MinRole(a), Access::MinRole(b)) => Access::MinRole(a.max(b)),
            (Access::MinRole(r), _) | (_, Access::MinRole(r)) => Access::MinRole(r),
            (Access::Authenticated, _) | (_, Access::Authenticated) => Access::Authenticated,
            (Access::Public, Access::Public) => Access::Public,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Public => f.write_str("public"),
            Access::Authenticated => f.write_str("authenticated"),
            Access::MinRole(role) => write!(f, "{role}+"),
        }
    }
}

// ── Pattern segments ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Static(String),
    Param(String),
    Wildcard,
}

impl Segment {
    /// Match priority among siblings: static, then param, then catch-all.
    fn rank(&self) -> u8 {
        match self {
            Segment::Static(_) => 0,
            Segment::Param(_) => 1,
            Segment::Wildcard => 2,
        }
    }

    /// Shape used for duplicate detection; param names don't matter.
    fn shape(&self) -> &str {
        match self {
            Segment::Static(s) => s,
            Segment::Param(_) => ":",
            Segment::Wildcard => "*",
        }
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, RouteError> {
    let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let last = parts.len().saturating_sub(1);
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| match *part {
            "*" if i == last => Ok(Segment::Wildcard),
            "*" => Err(RouteError::InvalidPattern {
                pattern: pattern.into(),
                reason: "`*` must be the final segment".into(),
            }),
            p if p.starts_with(':') => {
                let name = &p[1..];
                if name.is_empty() {
                    Err(RouteError::InvalidPattern {
                        pattern: pattern.into(),
                        reason: "parameter without a name".into(),
                    })
                } else {
                    Ok(Segment::Param(name.into()))
                }
            }
            p => Ok(Segment::Static(p.into())),
        })
        .collect()
}

// ── Route nodes ──────────────────────────────────────────────────────

/// One entry of the route tree.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pattern: String,
    page: PageId,
    loader: Option<LoaderId>,
    access: Access,
    redirect: Option<String>,
    index: bool,
    children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn new(pattern: &str, page: PageId) -> Self {
        Self {
            pattern: pattern.to_owned(),
            page,
            loader: None,
            access: Access::Public,
            redirect: None,
            index: false,
            children: Vec::new(),
        }
    }

    /// Renders when its parent consumes the whole path.
    pub fn index(page: PageId) -> Self {
        Self {
            index: true,
            ..Self::new("", page)
        }
    }

    /// Navigates elsewhere instead of rendering. `:name` segments in the
    /// target are filled from captured parameters.
    pub fn redirect(pattern: &str, target: &str) -> Self {
        Self {
            redirect: Some(target.to_owned()),
            ..Self::new(pattern, PageId::Redirect)
        }
    }

    pub fn loader(mut self, loader: LoaderId) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Require an authenticated session.
    pub fn protected(mut self) -> Self {
        self.access = Access::Authenticated;
        self
    }

    /// Require at least `role`.
    pub fn min_role(mut self, role: Role) -> Self {
        self.access = Access::MinRole(role);
        self
    }

    pub fn children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn get_loader(&self) -> Option<LoaderId> {
        self.loader
    }

    pub fn is_index(&self) -> bool {
        self.index
    }

    pub fn child_routes(&self) -> &[RouteNode] {
        &self.children
    }

    pub(crate) fn redirect_target(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Parsed segments. Patterns are validated when the table is built.
    pub(crate) fn segments(&self) -> Vec<Segment> {
        parse_pattern(&self.pattern).unwrap_or_default()
    }

    fn shape(&self) -> String {
        self.segments()
            .iter()
            .map(Segment::shape)
            .collect::<Vec<_>>()
            .join("/")
    }

    pub(crate) fn rank(&self) -> Vec<u8> {
        self.segments().iter().map(Segment::rank).collect()
    }
}

// ── Errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("duplicate route '{pattern}' under '{parent}'")]
    DuplicateSibling { parent: String, pattern: String },

    #[error("route '{pattern}' under '{parent}' is shadowed by an earlier catch-all")]
    ShadowedByWildcard { parent: String, pattern: String },

    #[error("more than one index route under '{parent}'")]
    MultipleIndex { parent: String },

    #[error("path '{path}' is declared more than once")]
    DuplicatePath { path: String },
}

// ── Table ────────────────────────────────────────────────────────────

/// Flattened view of one route, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub path: String,
    pub page: PageId,
    pub loader: Option<LoaderId>,
    /// Requirement after combining every ancestor's.
    pub access: Access,
}

/// Validated, immutable route tree.
#[derive(Debug, Clone)]
pub struct RouteTable {
    root: RouteNode,
}

impl RouteTable {
    pub fn new(root: RouteNode) -> Result<Self, RouteError> {
        parse_pattern(&root.pattern)?;
        let mut paths = HashSet::new();
        validate(&root, &join_path("", &root.shape()), &mut paths)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// Every route in declaration order.
    pub fn summaries(&self) -> Vec<RouteSummary> {
        let mut out = Vec::new();
        collect_summaries(&self.root, "", Access::Public, &mut out);
        out
    }
}

fn join_path(prefix: &str, pattern: &str) -> String {
    let pattern = pattern.trim_matches('/');
    let prefix = prefix.trim_end_matches('/');
    if pattern.is_empty() {
        if prefix.is_empty() { "/".into() } else { prefix.into() }
    } else {
        format!("{prefix}/{pattern}")
    }
}

fn validate(node: &RouteNode, full: &str, paths: &mut HashSet<String>) -> Result<(), RouteError> {
    if !node.index && !paths.insert(full.to_owned()) {
        return Err(RouteError::DuplicatePath { path: full.into() });
    }

    let mut shapes = HashSet::new();
    let mut seen_wildcard = false;
    let mut seen_index = false;
    for child in &node.children {
        parse_pattern(&child.pattern)?;

        if seen_wildcard {
            return Err(RouteError::ShadowedByWildcard {
                parent: full.into(),
                pattern: child.pattern.clone(),
            });
        }
        if child.index {
            if seen_index {
                return Err(RouteError::MultipleIndex { parent: full.into() });
            }
            seen_index = true;
        } else if !shapes.insert(child.shape()) {
            return Err(RouteError::DuplicateSibling {
                parent: full.into(),
                pattern: child.pattern.clone(),
            });
        }
        seen_wildcard = child.segments().last() == Some(&Segment::Wildcard);

        validate(child, &join_path(full, &child.shape()), paths)?;
    }
    Ok(())
}

fn collect_summaries(node: &RouteNode, prefix: &str, inherited: Access, out: &mut Vec<RouteSummary>) {
    let path = join_path(prefix, &node.pattern);
    let access = inherited.combine(node.access);
    out.push(RouteSummary {
        path: path.clone(),
        page: node.page,
        loader: node.loader,
        access,
    });
    for child in &node.children {
        collect_summaries(child, &path, access, out);
    }
}
