use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use loanbot::models::message::Message;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct CreateSessionResponse {
    session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageRequest {
    message: String,
    /// Also classify whether the message is off-topic
    #[serde(default)]
    assess: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageResponse {
    response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    off_topic: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryResponse {
    messages: Vec<Message>,
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.create_session().await;
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let session = state.session(id).await.ok_or(ApiError::SessionNotFound(id))?;
    // held for the whole answer so a user's questions never interleave
    let mut session = session.lock().await;

    let response = if request.assess {
        let assessment = session.assess(&request.message).await?;
        MessageResponse {
            response: assessment.response,
            off_topic: assessment.off_topic,
        }
    } else {
        MessageResponse {
            response: session.ask(&request.message).await?,
            off_topic: None,
        }
    };
    Ok(Json(response))
}

async fn history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = state.session(id).await.ok_or(ApiError::SessionNotFound(id))?;
    let session = session.lock().await;
    Ok(Json(HistoryResponse {
        messages: session.conversation().history().to_vec(),
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id/messages", post(send_message))
        .route("/sessions/:id/history", get(history))
        .route("/sessions/:id", axum::routing::delete(delete_session))
        .with_state(state)
}
