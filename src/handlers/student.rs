use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::database::models::assignment::STATUS_SUBMITTED;
use crate::database::models::{
    Announcement, Assignment, AssignmentSubmission, Audience, EnrolledCourse, PersonalDetails, QuizTask,
    RequestStatus, Student, TeacherRequest, Video,
};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::utils::{parse_id, RequiredFields};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::registration::{register_student, RegisteredStudent, StudentRegistration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub details: PersonalDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
    pub assignment_id: Option<String>,
    pub submission_link: Option<String>,
    pub student_email: Option<String>,
    pub student_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TeacherRequestBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub course: Option<String>,
    pub message: Option<String>,
}

/// Announcements visible to `audience`, newest first. Records written
/// before audiences existed have no `audience` key and count as `all`.
pub(crate) async fn announcements_for(state: &AppState, audience: Audience) -> Result<Vec<Announcement>, ApiError> {
    let filter = FilterData::new(json!({
        "$or": [
            { "audience": { "$in": [Audience::All.as_str(), audience.as_str()] } },
            { "audience": null }
        ]
    }));
    let mut announcements = state.db.announcements.select_any(filter).await?;
    announcements.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    Ok(announcements)
}

/// POST /students/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> ApiResult<RegisteredStudent> {
    let mut required = RequiredFields::new();
    let name = required.take("name", body.name);
    let email = required.take("email", body.email);
    required.finish()?;

    let registration = StudentRegistration {
        name,
        email,
        image: body.image.filter(|i| !i.trim().is_empty()),
        details: body.details,
    };
    let registered = register_student(&state.db, registration).await?;
    Ok(ApiResponse::created(registered))
}

/// GET /students/email/:email
pub async fn get_by_email(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Student> {
    let student = state
        .db
        .students
        .select_one(FilterData::eq("email", email.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student not found: {}", email)))?;
    Ok(ApiResponse::success(student))
}

/// GET /student/announcements
pub async fn announcements(State(state): State<AppState>) -> ApiResult<Vec<Announcement>> {
    Ok(ApiResponse::success(announcements_for(&state, Audience::Students).await?))
}

/// GET /videos/:language
pub async fn videos_by_language(State(state): State<AppState>, Path(language): Path<String>) -> ApiResult<Vec<Video>> {
    let videos = state
        .db
        .videos
        .select_any(FilterData::eq("language", language.as_str()))
        .await?;
    Ok(ApiResponse::success(videos))
}

/// GET /videos/:language/:category
pub async fn videos_by_category(
    State(state): State<AppState>,
    Path((language, category)): Path<(String, String)>,
) -> ApiResult<Vec<Video>> {
    let filter = FilterData::new(json!({ "language": language, "category": category }));
    let videos = state.db.videos.select_any(filter).await?;
    Ok(ApiResponse::success(videos))
}

/// GET /quizzes-tasks
pub async fn quizzes_tasks(State(state): State<AppState>) -> ApiResult<Vec<QuizTask>> {
    Ok(ApiResponse::success(state.db.quizzes_tasks.select_any(FilterData::all()).await?))
}

/// GET /assignments
pub async fn assignments(State(state): State<AppState>) -> ApiResult<Vec<Assignment>> {
    Ok(ApiResponse::success(state.db.assignments.select_any(FilterData::all()).await?))
}

/// GET /student/assignments/:email - the student's own submissions
pub async fn submissions(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Vec<AssignmentSubmission>> {
    let submissions = state
        .db
        .submissions
        .select_any(FilterData::eq("studentEmail", email.as_str()))
        .await?;
    Ok(ApiResponse::success(submissions))
}

/// GET /my-courses/:email
pub async fn my_courses(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<EnrolledCourse>> {
    let courses = state
        .db
        .enrolled_courses
        .select_any(FilterData::eq("studentEmail", email.as_str()))
        .await?;
    Ok(ApiResponse::success(courses))
}

/// POST /assignments/submit
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SubmitBody>,
) -> ApiResult<AssignmentSubmission> {
    let mut required = RequiredFields::new();
    let assignment_id = required.take("assignmentId", body.assignment_id);
    let submission_link = required.take("submissionLink", body.submission_link);
    let student_email = required.take("studentEmail", body.student_email);
    let student_name = required.take("studentName", body.student_name);
    required.finish()?;

    let submission = AssignmentSubmission {
        id: Uuid::new_v4(),
        assignment_id: parse_id(&assignment_id)?,
        submission_link,
        student_email,
        student_name,
        status: STATUS_SUBMITTED.to_string(),
        mark: None,
        admin_comments: None,
        marked_by: None,
        marked_at: None,
        submitted_at: Utc::now(),
    };
    let submission = state.db.submissions.insert(&submission).await?;

    info!("Submission {} for assignment {} by {}", submission.id, submission.assignment_id, submission.student_email);
    Ok(ApiResponse::created(submission))
}

/// POST /teacher-requests
pub async fn create_teacher_request(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TeacherRequestBody>,
) -> ApiResult<TeacherRequest> {
    let mut required = RequiredFields::new();
    let name = required.take("name", body.name);
    let email = required.take("email", body.email);
    let course = required.take("course", body.course);
    required.finish()?;

    let pending = FilterData::new(json!({ "email": email, "status": RequestStatus::Pending }));
    if state.db.teacher_requests.count(pending).await? > 0 {
        return Err(ApiError::conflict(format!("A pending teacher request already exists for {}", email)));
    }

    let request = TeacherRequest {
        id: Uuid::new_v4(),
        name,
        email,
        course,
        message: body.message.filter(|m| !m.trim().is_empty()),
        status: RequestStatus::Pending,
        created_at: Utc::now(),
        updated_at: None,
    };
    let request = state.db.teacher_requests.insert(&request).await?;

    info!("Teacher request {} created for {}", request.id, request.email);
    Ok(ApiResponse::created(request))
}

/// GET /teacher-requests/email/:email
pub async fn teacher_requests_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Vec<TeacherRequest>> {
    let requests = state
        .db
        .teacher_requests
        .select_any(FilterData::eq("email", email.as_str()))
        .await?;
    Ok(ApiResponse::success(requests))
}
