use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::database::models::Message;
use crate::handlers::utils::RequiredFields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::messaging::{ConversationSummary, Messaging, SeedOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub sender_email: Option<String>,
    pub receiver_email: Option<String>,
    pub message: Option<String>,
}

/// Body of `/addTeacher` and `/addStudent`: the caller and the person to add
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContactBody {
    pub sender_email: Option<String>,
    pub receiver_email: Option<String>,
}

/// GET /messages/:user1/:user2 - thread in either direction, oldest first
pub async fn thread(
    State(state): State<AppState>,
    Path((user1, user2)): Path<(String, String)>,
) -> ApiResult<Vec<Message>> {
    let messages = Messaging::new(&state.db).thread(&user1, &user2).await?;
    Ok(ApiResponse::success(messages))
}

/// GET /conversations/:userEmail
pub async fn conversations(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
) -> ApiResult<Vec<ConversationSummary>> {
    let list = Messaging::new(&state.db).conversations(&user_email).await?;
    Ok(ApiResponse::success(list))
}

/// POST /messages
pub async fn send(State(state): State<AppState>, ApiJson(body): ApiJson<SendMessageBody>) -> ApiResult<Message> {
    let mut required = RequiredFields::new();
    let sender = required.take("senderEmail", body.sender_email);
    let receiver = required.take("receiverEmail", body.receiver_email);
    let text = required.text("message", body.message);
    required.finish()?;

    let message = Messaging::new(&state.db).send(&sender, &receiver, &text).await?;
    Ok(ApiResponse::created(message))
}

/// POST /addTeacher and POST /addStudent - seed a conversation once per pair
pub async fn add_contact(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AddContactBody>,
) -> ApiResult<SeedOutcome> {
    let mut required = RequiredFields::new();
    let sender = required.take("senderEmail", body.sender_email);
    let receiver = required.take("receiverEmail", body.receiver_email);
    required.finish()?;

    let outcome = Messaging::new(&state.db).start_conversation(&sender, &receiver).await?;
    let status = match outcome {
        SeedOutcome::Started { .. } => StatusCode::CREATED,
        SeedOutcome::AlreadyAdded => StatusCode::OK,
    };
    Ok(ApiResponse::with_status(outcome, status))
}
