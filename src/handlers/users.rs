use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::database::models::{Role, User};
use crate::database::store::Document;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::profile::{Profile, ProfileResolver};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub role: Role,
    pub profile: Profile,
}

/// GET /users/email/:email
pub async fn get_by_email(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<User> {
    let user = ProfileResolver::new(&state.db).user(&email).await?;
    Ok(ApiResponse::success(user))
}

/// GET /users/role?email=
pub async fn get_role(State(state): State<AppState>, Query(query): Query<RoleQuery>) -> ApiResult<Value> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::validation_error("Query parameter 'email' is required", None))?;

    let role = ProfileResolver::new(&state.db).role(&email).await?;
    Ok(ApiResponse::success(json!({ "role": role })))
}

/// GET /profile/:email - role plus the matching student/teacher document
pub async fn get_profile(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<ProfileView> {
    let profile = ProfileResolver::new(&state.db).resolve(&email).await?;
    Ok(ApiResponse::success(ProfileView {
        role: profile.role(),
        profile,
    }))
}

/// GET /admin/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.db.users.select_any(FilterData::all()).await?;
    Ok(ApiResponse::success(users))
}

/// PUT /users/last-login/:email - called by the client after each sign-in
pub async fn touch_last_login(State(state): State<AppState>, Path(email): Path<String>) -> ApiResult<User> {
    let user = state
        .db
        .users
        .select_404(FilterData::eq("email", email.as_str()))
        .await?;

    let mut changes = Document::new();
    changes.insert("last_login".to_string(), json!(Utc::now()));
    let user = state
        .db
        .users
        .update_id(user.id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {}", email)))?;

    info!("Refreshed last_login for {}", email);
    Ok(ApiResponse::success(user))
}
