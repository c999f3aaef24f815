#![allow(clippy::unwrap_used)]
// Route resolution, guard, loaders and login against a mock backend.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peerly_api::ResourceClient;
use peerly_core::routes::{LoaderId, UNAUTHORIZED_MESSAGE};
use peerly_core::{
    Alert, AppContext, PageId, PageOutcome, RedirectReason, Role, Session, SessionUser,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AppContext) {
    let server = MockServer::start().await;
    let client =
        ResourceClient::from_reqwest(&server.uri(), peerly_api::reqwest::Client::new()).unwrap();
    (server, AppContext::new(client).unwrap())
}

fn sign_in(ctx: &AppContext, role: Role) {
    ctx.session.set(Session::authenticated(SessionUser {
        id: 3,
        name: "someone".into(),
        role,
        ..SessionUser::default()
    }));
}

fn token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

// ── Guard ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anonymous_visit_redirects_to_login() {
    let (_server, ctx) = setup().await;
    assert_eq!(
        ctx.navigate("/duties").await,
        PageOutcome::Redirect {
            to: "/login?from=%2Fduties".into(),
            reason: RedirectReason::Login
        }
    );
}

#[tokio::test]
async fn test_under_privileged_visit_alerts_and_redirects_home() {
    let (_server, ctx) = setup().await;
    sign_in(&ctx, Role::Student);
    assert_eq!(
        ctx.navigate("/courses").await,
        PageOutcome::Redirect {
            to: "/".into(),
            reason: RedirectReason::Unauthorized
        }
    );
    assert_eq!(ctx.alerts.current(), Some(Alert::danger(UNAUTHORIZED_MESSAGE)));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (_server, ctx) = setup().await;
    sign_in(&ctx, Role::Administrator);
    assert_eq!(
        ctx.navigate("/definitely/not/here").await,
        PageOutcome::NotFound {
            path: "/definitely/not/here".into()
        }
    );
}

// ── Loaders ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_loader_data_reaches_page() {
    let (server, ctx) = setup().await;
    sign_in(&ctx, Role::TeachingAssistant);

    Mock::given(method("GET"))
        .and(path("/duties/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 4, "name": "Grading", "private": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let PageOutcome::Ready(page) = ctx.navigate("/duties/edit/4").await else {
        panic!("expected a ready page");
    };
    assert_eq!(page.page(), PageId::DutyEditor);
    assert_eq!(page.get(LoaderId::Duty).unwrap()["name"], "Grading");

    let editor = peerly_core::pages::duties::routed_duty_editor(&page, 3).unwrap();
    assert_eq!(editor.values().name, "Grading");
}

#[tokio::test]
async fn test_form_data_loader_combines_requests() {
    let (server, ctx) = setup().await;
    sign_in(&ctx, Role::Instructor);

    for (p, body) in [
        ("/courses/2", json!({"id": 2, "name": "CSC 517"})),
        ("/institutions", json!([{"id": 1, "name": "NCSU"}])),
        ("/users", json!([{"id": 3, "name": "instructor3"}])),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let PageOutcome::Ready(page) = ctx.navigate("/courses/edit/2").await else {
        panic!("expected a ready page");
    };
    let data = page.get(LoaderId::CourseFormData).unwrap();
    assert_eq!(data["course"]["name"], "CSC 517");
    assert_eq!(data["institutions"][0]["name"], "NCSU");
    assert_eq!(data["users"][0]["id"], 3);
}

#[tokio::test]
async fn test_missing_record_renders_not_found() {
    let (server, ctx) = setup().await;
    sign_in(&ctx, Role::Instructor);

    Mock::given(method("GET"))
        .and(path("/assignments/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .mount(&server)
        .await;

    assert!(matches!(
        ctx.navigate("/assignments/edit/99").await,
        PageOutcome::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_loader_failure_becomes_error_boundary() {
    let (server, ctx) = setup().await;
    sign_in(&ctx, Role::Instructor);

    Mock::given(method("GET"))
        .and(path("/review_reports/5"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "report service down"})))
        .mount(&server)
        .await;

    assert_eq!(
        ctx.navigate("/assignments/5/review").await,
        PageOutcome::Failed {
            page: PageId::ReviewReport,
            status: Some(500),
            message: "report service down".into()
        }
    );
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_installs_token_and_session() {
    let (server, ctx) = setup().await;
    let jwt = token(&json!({
        "id": 3,
        "name": "instructor3",
        "full_name": "Ada Lovelace",
        "role": "Instructor",
        "institution_id": 1,
        "exp": 4_102_444_800_i64
    }));

    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_json(json!({"user_name": "instructor3", "password": "password"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": jwt})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/assignments"))
        .and(header("authorization", format!("Bearer {jwt}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut changes = ctx.session.subscribe();
    let session = ctx
        .login("instructor3", &SecretString::from("password".to_owned()))
        .await
        .unwrap();
    assert_eq!(session.role(), Role::Instructor);
    assert_eq!(session.user.display_name(), "Ada Lovelace");
    assert!(changes.has_changed().unwrap());

    let mut page = peerly_core::pages::assignments::AssignmentsPage::new();
    page.page_mut().mount();
    page.refresh(&ctx).await;

    ctx.logout();
    assert!(!ctx.session.current().authenticated);
    assert!(!ctx.client.has_token());
}

#[tokio::test]
async fn test_bad_credentials_surface_server_message() {
    let (server, ctx) = setup().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid username or password"})))
        .mount(&server)
        .await;

    let err = ctx
        .login("nobody", &SecretString::from("wrong".to_owned()))
        .await
        .unwrap_err();
    assert_eq!(err.user_message("Login failed"), "Invalid username or password");
    assert!(!ctx.session.current().authenticated);
}

// ── Alerts ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_newer_alert_survives_older_timer() {
    let client =
        ResourceClient::from_reqwest("http://127.0.0.1:9", peerly_api::reqwest::Client::new())
            .unwrap();
    let ctx = AppContext::new(client).unwrap();
    ctx.alerts.show(Alert::success("first"));
    tokio::time::sleep(Duration::from_millis(2000)).await;
    ctx.alerts.show(Alert::danger("second"));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(ctx.alerts.current(), Some(Alert::danger("second")));
}
