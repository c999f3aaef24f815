// ── Application route tree ──

use super::{LoaderId, PageId, RouteError, RouteNode, RouteTable};
use crate::role::Role;

type R = RouteNode;

/// Participant list with its create/edit children.
fn participants(pattern: &str) -> RouteNode {
    R::new(pattern, PageId::Participants).children(vec![
        R::new("new", PageId::ParticipantEditor).loader(LoaderId::ParticipantFormData),
        R::new("edit/:participant_id", PageId::ParticipantEditor)
            .loader(LoaderId::ParticipantFormData),
    ])
}

fn assignment_subpage(path: &str, page: PageId) -> RouteNode {
    R::new(&format!("assignments/edit/:id/{path}"), page)
        .loader(LoaderId::Assignment)
        .min_role(Role::TeachingAssistant)
}

/// The full route tree. Protected routes carry their minimum role; the
/// catch-all is declared last.
pub fn app_routes() -> Result<RouteTable, RouteError> {
    let ta = Role::TeachingAssistant;

    let root = R::new("/", PageId::Root).children(vec![
        R::index(PageId::Home).protected(),
        R::new("login", PageId::Login),
        R::new("logout", PageId::Logout).protected(),
        R::new("view-team-grades", PageId::TeamGrades).protected(),
        R::new("edit-questionnaire", PageId::Questionnaire).protected(),
        // ── Assignments ──
        R::new("assignments", PageId::Assignments)
            .min_role(ta)
            .children(vec![
                R::new("new", PageId::AssignmentEditor).loader(LoaderId::Assignment),
            ]),
        R::new("assignments/edit/:id", PageId::AssignmentEditor)
            .loader(LoaderId::Assignment)
            .min_role(ta),
        assignment_subpage("createteams", PageId::CreateTeams),
        assignment_subpage("assignreviewer", PageId::AssignReviewer),
        assignment_subpage("viewsubmissions", PageId::ViewSubmissions),
        assignment_subpage("submitcontent", PageId::SubmittedContent),
        assignment_subpage("viewscores", PageId::ViewScores),
        assignment_subpage("viewreports", PageId::ViewReports),
        assignment_subpage("viewdelayedjobs", PageId::ViewDelayedJobs),
        R::new("assignments/edit/:id/responsemappings", PageId::ResponseMappings).min_role(ta),
        participants("assignments/edit/:id/participants").min_role(ta),
        R::new("assignments/:id/signup_sheet", PageId::SignupSheet).protected(),
        R::new("assignments/:id/review", PageId::ReviewReport)
            .loader(LoaderId::ReviewReport)
            .min_role(ta),
        R::new("topics/:id/partner_advertisements", PageId::PartnerAdvertisements).protected(),
        // ── Students ──
        R::new("student_teams", PageId::StudentTeams)
            .protected()
            .children(vec![R::new("view", PageId::StudentTeamView)]),
        R::new("advertise_for_partner", PageId::NewTeammateAdvertisement).protected(),
        R::new("response/new", PageId::TeammateReview).protected(),
        R::new("users", PageId::Users).min_role(ta).children(vec![
            R::new("new", PageId::UserEditor).loader(LoaderId::UserFormData),
            R::new("edit/:id", PageId::UserEditor).loader(LoaderId::UserFormData),
            R::new(":id", PageId::UserEditor).loader(LoaderId::UserFormData),
        ]),
        R::new("student_tasks", PageId::StudentTasks).protected(),
        R::new("student_tasks/:id", PageId::StudentTasks).protected(),
        participants("student_tasks/participants").protected(),
        participants("student_tasks/edit/:id/participants").protected(),
        participants("courses/participants").min_role(ta),
        R::new("profile", PageId::Profile).protected(),
        R::new("reviews", PageId::Reviews).protected(),
        R::new("review-tableau", PageId::ReviewTableau).protected(),
        R::new("participants", PageId::Participants).protected(),
        R::new("email_the_author", PageId::EmailTheAuthor).protected(),
        // ── Courses and duties ──
        R::new("courses", PageId::Courses).min_role(ta).children(vec![
            R::new("new", PageId::CourseEditor).loader(LoaderId::CourseFormData),
            R::new("edit/:id", PageId::CourseEditor).loader(LoaderId::CourseFormData),
            R::new(":id/assignments", PageId::CourseAssignments),
            R::new(":id/tas", PageId::Tas)
                .loader(LoaderId::CourseTas)
                .children(vec![R::new("new", PageId::TaEditor)]),
        ]),
        R::new("duties", PageId::Duties).min_role(ta).children(vec![
            R::new("new", PageId::DutyEditor),
            R::new("edit/:id", PageId::DutyEditor).loader(LoaderId::Duty),
        ]),
        // ── Administration ──
        R::new("administrator", PageId::AdministratorLayout)
            .min_role(Role::Administrator)
            .children(vec![
                R::new("roles", PageId::Roles)
                    .loader(LoaderId::Roles)
                    .children(vec![
                        R::new("new", PageId::RoleEditor),
                        R::new("edit/:id", PageId::RoleEditor).loader(LoaderId::Role),
                    ]),
                R::new("institutions", PageId::Institutions)
                    .loader(LoaderId::Institutions)
                    .children(vec![
                        R::new("new", PageId::InstitutionEditor),
                        R::new("edit/:id", PageId::InstitutionEditor)
                            .loader(LoaderId::Institution),
                    ]),
                R::new("questionnaire", PageId::Questionnaire).loader(LoaderId::Questionnaires),
                R::new(":user_type", PageId::ManageUserTypes)
                    .loader(LoaderId::UsersOfType)
                    .children(vec![
                        R::redirect("new", "/users/new"),
                        R::redirect("edit/:id", "/users/edit/:id"),
                    ]),
            ]),
        // ── Questionnaires ──
        R::new("questionnaire", PageId::Questionnaire)
            .loader(LoaderId::Questionnaires)
            .min_role(Role::Instructor),
        R::new("questionnaires", PageId::Questionnaire)
            .loader(LoaderId::Questionnaires)
            .min_role(Role::Instructor),
        R::new("questionnaires/new", PageId::QuestionnaireEditor).min_role(Role::Instructor),
        R::new("questionnaires/edit/:id", PageId::QuestionnaireEditor)
            .loader(LoaderId::Questionnaire)
            .min_role(Role::Instructor),
        R::new("*", PageId::NotFound),
    ]);

    RouteTable::new(root)
}
