use axum::extract::State;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "SchoolHub API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "School management backend: students, teachers, assignments, videos and messaging",
        "endpoints": {
            "users": "/users/*, /profile/:email",
            "messaging": "/messages, /conversations/:email, /addTeacher, /addStudent",
            "student": "/students/*, /student/*, /videos/*, /assignments, /quizzes-tasks, /teacher-requests",
            "teacher": "/teachers/*, /teacher/*, /assignments/*",
            "admin": "/admin/*",
            "media": "/uploads/*"
        }
    })))
}

/// GET /health - 503 when the document store does not answer
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    state.db.store().health_check().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "timestamp": Utc::now(),
        "database": "ok"
    })))
}
