use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{
    Announcement, AssignmentSubmission, Audience, Course, QuizTask, RequestStatus, Student, Teacher, TeacherRequest,
};
use crate::database::store::{Document, SYSTEM_FIELDS};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::utils::{parse_id, RequiredFields};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::promotion::{Promotion, PromotionWorkflow};
use crate::state::AppState;
use crate::types::Patch;

/// Admin edit of a student or teacher profile
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEdit {
    pub name: Option<String>,
    #[serde(default)]
    pub image: Patch<String>,
    #[serde(default)]
    pub gender: Patch<String>,
    #[serde(default)]
    pub age: Patch<u32>,
    #[serde(default)]
    pub mobile: Patch<String>,
    #[serde(default)]
    pub present_address: Patch<String>,
    #[serde(default)]
    pub permanent_address: Patch<String>,
    #[serde(default)]
    pub guardian_name: Patch<String>,
    #[serde(default)]
    pub guardian_mobile: Patch<String>,
    #[serde(default)]
    pub birthday: Patch<String>,
}

impl ProfileEdit {
    fn into_changes(self) -> Result<Document, serde_json::Error> {
        let mut changes = Document::new();
        if let Some(name) = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            changes.insert("name".to_string(), json!(name));
        }
        self.image.apply(&mut changes, "image")?;
        self.gender.apply(&mut changes, "gender")?;
        self.age.apply(&mut changes, "age")?;
        self.mobile.apply(&mut changes, "mobile")?;
        self.present_address.apply(&mut changes, "presentAddress")?;
        self.permanent_address.apply(&mut changes, "permanentAddress")?;
        self.guardian_name.apply(&mut changes, "guardianName")?;
        self.guardian_mobile.apply(&mut changes, "guardianMobile")?;
        self.birthday.apply(&mut changes, "birthday")?;
        Ok(changes)
    }
}

#[derive(Debug, Deserialize)]
pub struct CourseBody {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementBody {
    pub title: Option<String>,
    pub message: Option<String>,
    pub sent_by: Option<String>,
    pub audience: Option<Audience>,
}

/// Grading input: `status` is required, the rest only overwrite when supplied
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBody {
    pub status: Option<String>,
    #[serde(default)]
    pub mark: Patch<f64>,
    #[serde(default)]
    pub admin_comments: Patch<String>,
    #[serde(default)]
    pub marked_by: Patch<String>,
    #[serde(default)]
    pub marked_at: Patch<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Option<RequestStatus>,
}

fn encode_error(err: serde_json::Error) -> ApiError {
    ApiError::bad_request(format!("Invalid field value: {}", err))
}

/// Free-form payload with the system-owned keys stripped
fn quiz_payload(body: Value) -> Result<Document, ApiError> {
    match body {
        Value::Object(mut payload) => {
            for key in SYSTEM_FIELDS.iter().chain(["updatedAt"].iter()) {
                payload.remove(*key);
            }
            Ok(payload)
        }
        _ => Err(ApiError::validation_error("Quiz/task body must be a JSON object", None)),
    }
}

// Students

/// GET /admin/students
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Vec<Student>> {
    Ok(ApiResponse::success(state.db.students.select_any(FilterData::all()).await?))
}

/// GET /admin/students/:id
pub async fn get_student(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Student> {
    let id = parse_id(&id)?;
    let student = state
        .db
        .students
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student not found: {}", id)))?;
    Ok(ApiResponse::success(student))
}

/// PUT /admin/students/:id
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(edit): ApiJson<ProfileEdit>,
) -> ApiResult<Student> {
    let id = parse_id(&id)?;
    let changes = edit.into_changes().map_err(encode_error)?;
    let student = state
        .db
        .students
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student not found: {}", id)))?;

    info!("Student {} updated", id);
    Ok(ApiResponse::success(student))
}

/// DELETE /admin/students/:id - also removes the user with the same email
pub async fn delete_student(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Student> {
    let id = parse_id(&id)?;
    let student = state
        .db
        .students
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student not found: {}", id)))?;

    state.db.students.delete_id(id).await?;
    let users = state
        .db
        .users
        .delete_where(FilterData::eq("email", student.email.as_str()))
        .await?;

    info!("Student {} deleted along with {} user record(s)", id, users);
    Ok(ApiResponse::success(student))
}

// Teachers

/// GET /admin/teachers
pub async fn list_teachers(State(state): State<AppState>) -> ApiResult<Vec<Teacher>> {
    Ok(ApiResponse::success(state.db.teachers.select_any(FilterData::all()).await?))
}

/// GET /admin/teachers/:id
pub async fn get_teacher(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Teacher> {
    let id = parse_id(&id)?;
    let teacher = state
        .db
        .teachers
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", id)))?;
    Ok(ApiResponse::success(teacher))
}

/// PUT /admin/teachers/:id
pub async fn update_teacher(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(edit): ApiJson<ProfileEdit>,
) -> ApiResult<Teacher> {
    let id = parse_id(&id)?;
    let changes = edit.into_changes().map_err(encode_error)?;
    let teacher = state
        .db
        .teachers
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", id)))?;

    info!("Teacher {} updated", id);
    Ok(ApiResponse::success(teacher))
}

/// DELETE /admin/teachers/:id - the user record is left in place
pub async fn delete_teacher(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Teacher> {
    let id = parse_id(&id)?;
    let teacher = state
        .db
        .teachers
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", id)))?;

    state.db.teachers.delete_id(id).await?;
    info!("Teacher {} deleted", id);
    Ok(ApiResponse::success(teacher))
}

/// POST /admin/teachers/:id/courses
pub async fn add_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CourseBody>,
) -> ApiResult<Teacher> {
    let id = parse_id(&id)?;
    let mut required = RequiredFields::new();
    let name = required.take("name", body.name);
    required.finish()?;

    let teacher = state
        .db
        .teachers
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", id)))?;
    if teacher.courses.iter().any(|c| c.name == name) {
        return Err(ApiError::conflict(format!("Teacher already has a course named {}", name)));
    }

    let mut courses = teacher.courses;
    courses.push(Course::new(name.as_str()));
    let mut changes = Document::new();
    changes.insert("courses".to_string(), json!(courses));

    let teacher = state
        .db
        .teachers
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", id)))?;

    info!("Course '{}' added to teacher {}", name, id);
    Ok(ApiResponse::created(teacher))
}

// Announcements

/// GET /admin/announcements - newest first
pub async fn list_announcements(State(state): State<AppState>) -> ApiResult<Vec<Announcement>> {
    let mut announcements = state.db.announcements.select_any(FilterData::all()).await?;
    announcements.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
    Ok(ApiResponse::success(announcements))
}

/// POST /admin/announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnnouncementBody>,
) -> ApiResult<Announcement> {
    let mut required = RequiredFields::new();
    let title = required.take("title", body.title);
    let message = required.text("message", body.message);
    let sent_by = required.take("sentBy", body.sent_by);
    required.finish()?;

    let now = Utc::now();
    let announcement = Announcement {
        id: Uuid::new_v4(),
        title,
        message,
        sent_by,
        sent_at: now,
        audience: body.audience.unwrap_or_default(),
        created_at: now,
    };
    let announcement = state.db.announcements.insert(&announcement).await?;

    info!("Announcement {} sent to {}", announcement.id, announcement.audience.as_str());
    Ok(ApiResponse::created(announcement))
}

/// DELETE /admin/announcements/:id
pub async fn delete_announcement(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    if !state.db.announcements.delete_id(id).await? {
        return Err(ApiError::not_found(format!("Announcement not found: {}", id)));
    }
    info!("Announcement {} deleted", id);
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// Quizzes and tasks

/// GET /admin/quizzes-tasks
pub async fn list_quizzes_tasks(State(state): State<AppState>) -> ApiResult<Vec<QuizTask>> {
    Ok(ApiResponse::success(state.db.quizzes_tasks.select_any(FilterData::all()).await?))
}

/// POST /admin/quizzes-tasks
pub async fn create_quiz_task(State(state): State<AppState>, ApiJson(body): ApiJson<Value>) -> ApiResult<QuizTask> {
    let payload = quiz_payload(body)?;
    if payload.is_empty() {
        return Err(ApiError::validation_error("Quiz/task body must not be empty", None));
    }

    let quiz = QuizTask {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: None,
        payload,
    };
    let quiz = state.db.quizzes_tasks.insert(&quiz).await?;

    info!("Quiz/task {} created", quiz.id);
    Ok(ApiResponse::created(quiz))
}

/// PUT /admin/quizzes-tasks/:id - shallow merge of the supplied keys
pub async fn update_quiz_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<QuizTask> {
    let id = parse_id(&id)?;
    let mut changes = quiz_payload(body)?;
    changes.insert("updatedAt".to_string(), json!(Utc::now()));

    let quiz = state
        .db
        .quizzes_tasks
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Quiz/task not found: {}", id)))?;

    info!("Quiz/task {} updated", id);
    Ok(ApiResponse::success(quiz))
}

/// DELETE /admin/quizzes-tasks/:id
pub async fn delete_quiz_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    if !state.db.quizzes_tasks.delete_id(id).await? {
        return Err(ApiError::not_found(format!("Quiz/task not found: {}", id)));
    }
    info!("Quiz/task {} deleted", id);
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// Submissions

/// GET /admin/submissions
pub async fn list_submissions(State(state): State<AppState>) -> ApiResult<Vec<AssignmentSubmission>> {
    Ok(ApiResponse::success(state.db.submissions.select_any(FilterData::all()).await?))
}

/// PUT /admin/submissions/:id - grade; omitted optional fields keep their stored value
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<GradeBody>,
) -> ApiResult<AssignmentSubmission> {
    let id = parse_id(&id)?;
    let mut required = RequiredFields::new();
    let status = required.take("status", body.status);
    required.finish()?;

    let mut changes = Document::new();
    changes.insert("status".to_string(), json!(status));
    body.mark.apply(&mut changes, "mark").map_err(encode_error)?;
    body.admin_comments
        .apply(&mut changes, "adminComments")
        .map_err(encode_error)?;
    body.marked_by.apply(&mut changes, "markedBy").map_err(encode_error)?;
    body.marked_at.apply(&mut changes, "markedAt").map_err(encode_error)?;

    let submission = state
        .db
        .submissions
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Submission not found: {}", id)))?;

    info!("Submission {} marked {}", id, submission.status);
    Ok(ApiResponse::success(submission))
}

/// DELETE /admin/submissions/:id
pub async fn delete_submission(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    if !state.db.submissions.delete_id(id).await? {
        return Err(ApiError::not_found(format!("Submission not found: {}", id)));
    }
    info!("Submission {} deleted", id);
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

// Teacher requests

/// GET /admin/teacher-requests
pub async fn list_teacher_requests(State(state): State<AppState>) -> ApiResult<Vec<TeacherRequest>> {
    Ok(ApiResponse::success(state.db.teacher_requests.select_any(FilterData::all()).await?))
}

/// DELETE /admin/teacher-requests/:id
pub async fn delete_teacher_request(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    if !state.db.teacher_requests.delete_id(id).await? {
        return Err(ApiError::not_found(format!("Teacher request not found: {}", id)));
    }
    info!("Teacher request {} deleted", id);
    Ok(ApiResponse::success(json!({ "deleted": id })))
}

/// PUT /teacher-requests/approve/:id - runs the promotion
pub async fn approve_teacher_request(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Promotion> {
    let id = parse_id(&id)?;
    let promotion = PromotionWorkflow::new(&state.db).approve(id).await?;
    Ok(ApiResponse::success(promotion))
}

/// PUT /teacher-requests/:id - reject, or leave pending
pub async fn set_teacher_request_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> ApiResult<TeacherRequest> {
    let id = parse_id(&id)?;
    let status = body
        .status
        .ok_or_else(|| ApiError::validation_error("Missing required fields: status", None))?;

    let request = PromotionWorkflow::new(&state.db).set_status(id, status).await?;
    Ok(ApiResponse::success(request))
}
