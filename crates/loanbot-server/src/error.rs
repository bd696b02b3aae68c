use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use loanbot::errors::AgentError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub const ENV_PREFIX: &str = "LOANBOT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// The environment variable that sets a dotted settings key, e.g. `provider.api_key`
pub fn to_env_var(field_path: &str) -> String {
    let key = field_path
        .split('.')
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("__");
    format!("{}_{}", ENV_PREFIX, key)
}

/// Pull the dotted key out of a "missing field `x` for key `y`" message
pub fn missing_field_path(message: &str) -> Option<String> {
    let rest = message.strip_prefix("missing field `")?;
    let (field, rest) = rest.split_once('`')?;
    match rest
        .split_once("for key `")
        .and_then(|(_, key)| key.split_once('`'))
    {
        Some((parent, _)) if !parent.is_empty() => Some(format!("{}.{}", parent, field)),
        _ => Some(field.to_string()),
    }
}

/// Errors returned by the HTTP API as `{ "error": ... }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Agent(err) => match err {
                AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                AgentError::Provider(_)
                | AgentError::UnexpectedStopReason(_)
                | AgentError::EmptyResponse => StatusCode::BAD_GATEWAY,
                AgentError::UnknownTool(_) | AgentError::ArgumentBinding { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
