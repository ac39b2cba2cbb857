//! Error type for the access layer and orchestrator.
//!
//! The access layer returns `ClientError` for every failed primary call.
//! The orchestrator never propagates it: it renders the error with
//! `to_string()` into the matching error slot of `WorkshopState`.

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-success HTTP status without a dedicated mapping.
    #[error("Failed to {action}: {}", http_detail(.server_message, .status_text))]
    Http {
        action: String,
        status: u16,
        status_text: String,
        server_message: Option<String>,
    },

    #[error("You are already enrolled in this workshop")]
    AlreadyEnrolled,

    #[error("You must be logged in to {0}")]
    NotAuthenticated(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Another operation on workshop {0} is still in progress")]
    OperationInProgress(String),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    pub fn http(action: &str, status: StatusCode, server_message: Option<String>) -> Self {
        ClientError::Http {
            action: action.to_string(),
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
            server_message,
        }
    }

    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::AlreadyEnrolled => Some(409),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn http_detail<'a>(server_message: &'a Option<String>, status_text: &'a String) -> &'a str {
    server_message.as_deref().unwrap_or(status_text.as_str())
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
