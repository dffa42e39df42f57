use axum::extract::{Multipart, Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Announcement, Assignment, AssignmentSubmission, Audience, Teacher, Video};
use crate::database::store::Document;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::handlers::student::announcements_for;
use crate::handlers::utils::{non_blank, parse_id, read_upload, RequiredFields, UploadForm};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::media::{is_video, MediaKind};
use crate::state::AppState;
use crate::types::Patch;

/// Metadata edit for a video. Omitted or null required fields are left as they are.
#[derive(Debug, Default, Deserialize)]
pub struct VideoEdit {
    pub language: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentEdit {
    pub title: Option<String>,
    #[serde(default)]
    pub language: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn set_text(changes: &mut Document, key: &str, value: Option<String>) {
    if let Some(value) = non_empty(value) {
        changes.insert(key.to_string(), json!(value));
    }
}

/// GET /teachers/email/:email
pub async fn get_by_email(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Teacher> {
    let teacher = state
        .db
        .teachers
        .select_one(FilterData::eq("email", email.as_str()))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {}", email)))?;
    Ok(ApiResponse::success(teacher))
}

/// GET /teacher/announcements
pub async fn announcements(State(state): State<AppState>) -> ApiResult<Vec<Announcement>> {
    Ok(ApiResponse::success(announcements_for(&state, Audience::Teachers).await?))
}

/// GET /assignments/teacher/:email
pub async fn assignments(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<Assignment>> {
    let assignments = state
        .db
        .assignments
        .select_any(FilterData::eq("uploadedBy", email.as_str()))
        .await?;
    Ok(ApiResponse::success(assignments))
}

/// GET /teacher/submissions/:email - submissions to any assignment the teacher uploaded
pub async fn submissions(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Vec<AssignmentSubmission>> {
    let owned = state
        .db
        .assignments
        .select_any(FilterData::eq("uploadedBy", email.as_str()))
        .await?;
    let ids: Vec<Uuid> = owned.iter().map(|a| a.id).collect();

    let submissions = state.db.submissions.select_for_assignments(&ids).await?;
    Ok(ApiResponse::success(submissions))
}

/// GET /teacher/videos/:email
pub async fn videos(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<Vec<Video>> {
    let videos = state
        .db
        .videos
        .select_any(FilterData::eq("uploadedBy", email.as_str()))
        .await?;
    Ok(ApiResponse::success(videos))
}

fn video_from_form(form: &UploadForm) -> Result<Video, ApiError> {
    let mut required = RequiredFields::new();
    let language = required.take("language", form.field("language"));
    let category = required.take("category", form.field("category"));
    let title = required.take("title", form.field("title"));
    let uploaded_by = required.take("uploadedBy", form.field("uploadedBy"));
    required.finish()?;

    let file = form
        .file
        .as_ref()
        .ok_or_else(|| ApiError::validation_error("A video file is required in 'videoFile'", None))?;
    if !is_video(file.content_type.as_deref()) {
        return Err(ApiError::validation_error(
            format!(
                "Only video files are allowed, got {}",
                file.content_type.as_deref().unwrap_or("no content type")
            ),
            None,
        ));
    }

    let now = Utc::now();
    Ok(Video {
        id: Uuid::new_v4(),
        language,
        category,
        title,
        description: non_blank(form.field("description")),
        uploaded_by,
        video_url: file.url.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// POST /teacher/videos - multipart with a `videoFile` part
pub async fn upload_video(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Video> {
    let form = read_upload(multipart, "videoFile", &state.media, MediaKind::Video).await?;

    let video = match video_from_form(&form) {
        Ok(video) => video,
        Err(e) => {
            form.discard(&state.media).await;
            return Err(e);
        }
    };

    match state.db.videos.insert(&video).await {
        Ok(video) => {
            let size = form.file.as_ref().map_or(0, |f| f.size);
            info!("Video {} uploaded by {} ({} bytes)", video.id, video.uploaded_by, size);
            Ok(ApiResponse::created(video))
        }
        Err(e) => {
            form.discard(&state.media).await;
            Err(e.into())
        }
    }
}

/// PUT /teacher/videos/:id
pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(edit): ApiJson<VideoEdit>,
) -> ApiResult<Video> {
    let id = parse_id(&id)?;

    let mut changes = Document::new();
    set_text(&mut changes, "language", edit.language);
    set_text(&mut changes, "category", edit.category);
    set_text(&mut changes, "title", edit.title);
    edit.description
        .apply(&mut changes, "description")
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    changes.insert("updatedAt".to_string(), json!(Utc::now()));

    let video = state
        .db
        .videos
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Video not found: {}", id)))?;

    info!("Video {} updated", id);
    Ok(ApiResponse::success(video))
}

/// DELETE /teacher/videos/:id - removes the record and its stored file
pub async fn delete_video(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Video> {
    let id = parse_id(&id)?;
    let video = state
        .db
        .videos
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Video not found: {}", id)))?;

    state.db.videos.delete_id(id).await?;
    state.media.discard(&video.video_url).await;

    info!("Video {} deleted", id);
    Ok(ApiResponse::success(video))
}

/// POST /assignments - multipart; the `file` part is optional
pub async fn create_assignment(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Assignment> {
    let form = read_upload(multipart, "file", &state.media, MediaKind::Assignment).await?;

    let mut required = RequiredFields::new();
    let title = required.take("title", form.field("title"));
    let uploaded_by = required.take("uploadedBy", form.field("uploadedBy"));
    if let Err(e) = required.finish() {
        form.discard(&state.media).await;
        return Err(e);
    }

    let assignment = Assignment {
        id: Uuid::new_v4(),
        language: non_empty(form.field("language")),
        title,
        description: non_blank(form.field("description")),
        uploaded_by,
        file_url: form.file.as_ref().map(|f| f.url.clone()),
        created_at: Utc::now(),
        updated_at: None,
    };

    match state.db.assignments.insert(&assignment).await {
        Ok(assignment) => {
            info!("Assignment {} created by {}", assignment.id, assignment.uploaded_by);
            Ok(ApiResponse::created(assignment))
        }
        Err(e) => {
            form.discard(&state.media).await;
            Err(e.into())
        }
    }
}

/// PUT /assignments/:id
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(edit): ApiJson<AssignmentEdit>,
) -> ApiResult<Assignment> {
    let id = parse_id(&id)?;

    let mut changes = Document::new();
    set_text(&mut changes, "title", edit.title);
    edit.language
        .apply(&mut changes, "language")
        .and_then(|_| edit.description.apply(&mut changes, "description"))
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    changes.insert("updatedAt".to_string(), json!(Utc::now()));

    let assignment = state
        .db
        .assignments
        .update_id(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Assignment not found: {}", id)))?;

    info!("Assignment {} updated", id);
    Ok(ApiResponse::success(assignment))
}

/// DELETE /teacher/assignments/:id
pub async fn delete_assignment(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Assignment> {
    let id = parse_id(&id)?;
    let assignment = state
        .db
        .assignments
        .select_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Assignment not found: {}", id)))?;

    state.db.assignments.delete_id(id).await?;
    if let Some(url) = &assignment.file_url {
        state.media.discard(url).await;
    }

    info!("Assignment {} deleted", id);
    Ok(ApiResponse::success(assignment))
}
