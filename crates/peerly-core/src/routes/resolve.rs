// ── Path resolution and guard ──
//
// Exact segment matching with backtracking. Among siblings, patterns are
// tried in specificity order (static before `:param` before `*`,
// position by position); ties keep declaration order.

use indexmap::IndexMap;
use serde::Serialize;

use super::{Access, LoaderId, PageId, RouteNode, RouteTable, Segment, join_path};
use crate::session::Session;

/// Captured path or query parameters, in capture order.
pub type Params = IndexMap<String, String>;

/// One node of a matched chain, with its full pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedRoute {
    pub pattern: String,
    pub page: PageId,
    pub loader: Option<LoaderId>,
    pub access: Access,
}

/// A path matched against the table, root first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub path: String,
    pub chain: Vec<MatchedRoute>,
    pub params: Params,
    pub query: Params,
    redirect: Option<String>,
}

impl RouteMatch {
    /// The page that renders: the deepest node of the chain.
    pub fn page(&self) -> PageId {
        self.chain.last().map_or(PageId::NotFound, |r| r.page)
    }

    /// Requirement after combining every node in the chain.
    pub fn access(&self) -> Access {
        self.chain
            .iter()
            .fold(Access::Public, |acc, r| acc.combine(r.access))
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn param_id(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(|v| v.parse().ok())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Redirect target with parameters filled in, for redirect routes.
    pub fn redirect_target(&self) -> Option<String> {
        self.redirect.as_deref().map(|target| interpolate(target, &self.params))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RedirectReason {
    /// Not logged in; the target is the login page.
    Login,
    /// Logged in but below the route's minimum role.
    Unauthorized,
    /// The route itself is a redirect.
    Navigate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(RouteMatch),
    Redirect { to: String, reason: RedirectReason },
    NotFound { path: String },
}

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_REDIRECT: &str = "/";

impl RouteTable {
    /// Match a path (optionally with `?query`) without consulting the session.
    pub fn match_path(&self, target: &str) -> Option<RouteMatch> {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut params = Params::new();
        let mut chain = Vec::new();
        if !match_node(&self.root, &segments, "", &mut params, &mut chain) {
            return None;
        }

        let redirect = chain.last().and_then(|(node, _)| node.redirect_target().map(String::from));
        let chain = chain
            .into_iter()
            .map(|(node, pattern)| MatchedRoute {
                pattern,
                page: node.page(),
                loader: node.get_loader(),
                access: node.access(),
            })
            .collect();

        Some(RouteMatch {
            path: join_path("", path),
            chain,
            params,
            query: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            redirect,
        })
    }

    /// Match a path and apply the guard for `session`.
    pub fn resolve(&self, target: &str, session: &Session) -> Resolution {
        let Some(matched) = self.match_path(target) else {
            return Resolution::NotFound {
                path: target.to_owned(),
            };
        };

        let needs_login = !matches!(matched.access(), Access::Public) && !session.authenticated;
        if needs_login {
            return Resolution::Redirect {
                to: login_redirect(target),
                reason: RedirectReason::Login,
            };
        }
        if let Access::MinRole(minimum) = matched.access() {
            if !session.role().at_least(minimum) {
                return Resolution::Redirect {
                    to: UNAUTHORIZED_REDIRECT.into(),
                    reason: RedirectReason::Unauthorized,
                };
            }
        }
        if let Some(to) = matched.redirect_target() {
            return Resolution::Redirect {
                to,
                reason: RedirectReason::Navigate,
            };
        }
        Resolution::Render(matched)
    }
}

fn login_redirect(from: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", from)
        .finish();
    format!("{LOGIN_PATH}?{query}")
}

fn interpolate(target: &str, params: &Params) -> String {
    target
        .split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => params.get(name).map_or(part, String::as_str),
            None => part,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn match_node<'a>(
    node: &'a RouteNode,
    segments: &[&str],
    prefix: &str,
    params: &mut Params,
    chain: &mut Vec<(&'a RouteNode, String)>,
) -> bool {
    let mark = params.len();
    let Some(rest) = consume(node, segments, params) else {
        params.truncate(mark);
        return false;
    };

    let full = join_path(prefix, node.pattern());
    chain.push((node, full.clone()));

    if rest.is_empty() {
        if let Some(index) = node.child_routes().iter().find(|c| c.is_index()) {
            chain.push((index, full));
        }
        return true;
    }

    let mut candidates: Vec<&RouteNode> =
        node.child_routes().iter().filter(|c| !c.is_index()).collect();
    candidates.sort_by_key(|c| c.rank());

    for child in candidates {
        if match_node(child, rest, &full, params, chain) {
            return true;
        }
    }

    chain.pop();
    params.truncate(mark);
    false
}

/// Match `node`'s own segments against the front of `segments`,
/// returning what is left.
fn consume<'s>(node: &RouteNode, segments: &'s [&'s str], params: &mut Params) -> Option<&'s [&'s str]> {
    let pattern = node.segments();
    for (i, seg) in pattern.iter().enumerate() {
        match seg {
            Segment::Wildcard => {
                params.insert("*".into(), segments.get(i..)?.join("/"));
                return Some(&[]);
            }
            Segment::Static(expected) => {
                if !segments.get(i)?.eq_ignore_ascii_case(expected) {
                    return None;
                }
            }
            Segment::Param(name) => {
                params.insert(name.clone(), (*segments.get(i)?).to_owned());
            }
        }
    }
    segments.get(pattern.len()..)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::routes::app_routes;
    use crate::session::SessionUser;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    fn session(role: Role) -> Session {
        Session::authenticated(SessionUser {
            id: 1,
            name: "user".into(),
            role,
            ..SessionUser::default()
        })
    }

    fn render(resolution: Resolution) -> RouteMatch {
        match resolution {
            Resolution::Render(m) => m,
            other => panic!("expected render, got {other:?}"),
        }
    }

    #[test]
    fn index_route_renders_home() {
        let table = app_routes().unwrap();
        let m = render(table.resolve("/", &session(Role::Student)));
        assert_eq!(m.page(), PageId::Home);
    }

    #[test]
    fn static_beats_param() {
        let table = app_routes().unwrap();
        let m = table.match_path("/student_tasks/participants").unwrap();
        assert_eq!(m.page(), PageId::Participants);
        let m = table.match_path("/student_tasks/12").unwrap();
        assert_eq!(m.page(), PageId::StudentTasks);
        assert_eq!(m.param("id"), Some("12"));
    }

    #[test]
    fn nested_child_captures_params() {
        let table = app_routes().unwrap();
        let m = table.match_path("/courses/4/tas/new").unwrap();
        let pages: Vec<PageId> = m.chain.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![PageId::Root, PageId::Courses, PageId::Tas, PageId::TaEditor]);
        assert_eq!(m.param_id("id"), Some(4));
        assert_eq!(m.chain[3].pattern, "/courses/:id/tas/new");
    }

    #[test]
    fn backtracks_to_later_sibling() {
        let table = app_routes().unwrap();
        let m = table.match_path("/courses/participants/new").unwrap();
        assert_eq!(m.page(), PageId::ParticipantEditor);
    }

    #[test]
    fn unmatched_paths_hit_catch_all() {
        let table = app_routes().unwrap();
        let m = table.match_path("/no/such/page").unwrap();
        assert_eq!(m.page(), PageId::NotFound);
        assert_eq!(m.param("*"), Some("no/such/page"));
        assert_eq!(
            table.resolve("/no/such/page", &Session::default()),
            Resolution::Render(m)
        );
    }

    #[test]
    fn routes_after_catch_all_position_still_match() {
        let table = app_routes().unwrap();
        assert_eq!(
            table.match_path("/questionnaires/new").unwrap().page(),
            PageId::QuestionnaireEditor
        );
    }

    #[test]
    fn query_string_is_parsed() {
        let table = app_routes().unwrap();
        let m = table.match_path("/duties?mine=true&q=grading").unwrap();
        assert_eq!(m.page(), PageId::Duties);
        assert_eq!(m.query_param("q"), Some("grading"));
        assert_eq!(m.path, "/duties");
    }

    #[test]
    fn anonymous_is_sent_to_login_with_origin() {
        let table = app_routes().unwrap();
        assert_eq!(
            table.resolve("/assignments", &Session::default()),
            Resolution::Redirect {
                to: "/login?from=%2Fassignments".into(),
                reason: RedirectReason::Login
            }
        );
    }

    #[test]
    fn login_page_is_public() {
        let table = app_routes().unwrap();
        let m = render(table.resolve("/login", &Session::default()));
        assert_eq!(m.page(), PageId::Login);
    }

    #[test]
    fn every_role_below_minimum_is_redirected() {
        let table = app_routes().unwrap();
        let cases = [
            ("/assignments", Role::TeachingAssistant),
            ("/users/edit/3", Role::TeachingAssistant),
            ("/courses/2/tas", Role::TeachingAssistant),
            ("/questionnaires/edit/9", Role::Instructor),
            ("/administrator/roles", Role::Administrator),
            ("/administrator/institutions/edit/1", Role::Administrator),
        ];
        for (path, minimum) in cases {
            for role in Role::iter().filter(|r| *r != Role::Guest) {
                let resolution = table.resolve(path, &session(role));
                if role >= minimum {
                    assert!(
                        matches!(resolution, Resolution::Render(_)),
                        "{role} should reach {path}, got {resolution:?}"
                    );
                } else {
                    assert_eq!(
                        resolution,
                        Resolution::Redirect {
                            to: UNAUTHORIZED_REDIRECT.into(),
                            reason: RedirectReason::Unauthorized
                        },
                        "{role} should be turned away from {path}"
                    );
                }
            }
        }
    }

    #[test]
    fn guard_reads_session_on_every_call() {
        let table = app_routes().unwrap();
        let student = session(Role::Student);
        let admin = session(Role::Administrator);
        assert!(matches!(
            table.resolve("/administrator", &student),
            Resolution::Redirect { .. }
        ));
        assert!(matches!(
            table.resolve("/administrator", &admin),
            Resolution::Render(_)
        ));
    }

    #[test]
    fn redirect_routes_fill_in_params() {
        let table = app_routes().unwrap();
        assert_eq!(
            table.resolve("/administrator/instructors/edit/42", &session(Role::Administrator)),
            Resolution::Redirect {
                to: "/users/edit/42".into(),
                reason: RedirectReason::Navigate
            }
        );
    }

    #[test]
    fn static_match_is_case_insensitive() {
        let table = app_routes().unwrap();
        assert_eq!(table.match_path("/Duties").unwrap().page(), PageId::Duties);
    }
}
