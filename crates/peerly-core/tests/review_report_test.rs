#![allow(clippy::unwrap_used)]
// Review report grading and course assignment filtering.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use peerly_api::ResourceClient;
use peerly_core::model::TeamStatus;
use peerly_core::pages::course_assignments::CourseAssignmentsPage;
use peerly_core::pages::review_report::{GRADE_FAILED, GRADE_UPDATED, ReviewReportPage};
use peerly_core::{Alert, AppContext, RowCommand};

async fn setup() -> (MockServer, AppContext) {
    let server = MockServer::start().await;
    let client =
        ResourceClient::from_reqwest(&server.uri(), peerly_api::reqwest::Client::new()).unwrap();
    (server, AppContext::new(client).unwrap())
}

async fn load_report(server: &MockServer, ctx: &AppContext) -> ReviewReportPage {
    Mock::given(method("GET"))
        .and(path("/review_reports/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reportData": [{
                "id": 11,
                "reviewerName": "Ada Lovelace",
                "reviewerUsername": "ada",
                "teamReviewedName": "Team 4",
                "teamReviewedStatus": "blue",
                "calculatedScore": 8
            }],
            "averageVolume": 40.0
        })))
        .mount(server)
        .await;
    let report = ReviewReportPage::fetch(&ctx.client, 5).await.unwrap();
    ReviewReportPage::new(5, report)
}

#[tokio::test]
async fn test_grade_update_patches_and_marks_row() {
    let (server, ctx) = setup().await;
    let mut page = load_report(&server, &ctx).await;

    Mock::given(method("PATCH"))
        .and(path("/review_reports/11/update_grade"))
        .and(body_json(json!({"assignedGrade": 95.0, "instructorComment": "Thorough"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    page.update_grade(&ctx.client, &ctx.alerts, 11, Some(95.0), "Thorough")
        .await
        .unwrap();
    let row = &page.rows()[0];
    assert_eq!(row.team_reviewed_status, TeamStatus::Brown);
    assert_eq!(row.instructor_comment.as_deref(), Some("Thorough"));
    assert_eq!(ctx.alerts.current(), Some(Alert::success(GRADE_UPDATED)));
}

#[tokio::test]
async fn test_grade_update_failure_alerts_and_leaves_row() {
    let (server, ctx) = setup().await;
    let mut page = load_report(&server, &ctx).await;

    Mock::given(method("PATCH"))
        .and(path("/review_reports/11/update_grade"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(
        page.update_grade(&ctx.client, &ctx.alerts, 11, Some(50.0), "")
            .await
            .is_err()
    );
    assert_eq!(page.rows()[0].team_reviewed_status, TeamStatus::Blue);
    assert_eq!(ctx.alerts.current(), Some(Alert::danger(GRADE_FAILED)));
}

#[tokio::test]
async fn test_course_assignments_filter_by_course() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path("/assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Program 1", "course_id": 2},
            {"id": 2, "name": "Program 2", "course_id": 3},
            {"id": 3, "name": "Wiki", "course_id": 2}
        ])))
        .mount(&server)
        .await;

    let mut page = CourseAssignmentsPage::new(2);
    page.page_mut().mount();
    page.refresh(&ctx).await;
    let ids: Vec<i64> = page.page().list().rows().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 3]);

    assert_eq!(
        page.handle_action(3, "view_scores"),
        Some(RowCommand::navigate("/assignments/edit/3/viewscores"))
    );
    assert!(matches!(page.handle_action(3, "delete"), Some(RowCommand::Delete(3))));
    assert_eq!(page.page().delete_dialog().unwrap().name(), "Wiki");
}
