use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Error body shapes returned by the backend.
///
/// FastAPI-style failures carry `detail` (a string, or a list of validation
/// problems); domain-level failures carry `message`. `detail` wins when both
/// are present.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Human-readable text from the body, if it carries any.
    pub fn text(&self) -> Option<String> {
        match &self.detail {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return Some(detail.clone())
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                if self.message.is_none() {
                    return Some(other.to_string());
                }
            }
        }

        self.message
            .as_ref()
            .filter(|message| !message.trim().is_empty())
            .cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Cannot reach the backend at {base_url}")]
    Unreachable { base_url: String },

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No signed-in user")]
    MissingUser,

    #[error("Coupon type {0} is already claimed by this user")]
    AlreadyClaimed(i64),

    #[error("No unassigned coupon available for coupon type {0}")]
    NoCouponAvailable(i64),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid backend address: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

impl ClientError {
    /// Builds a backend error from a non-success response body.
    pub fn from_error_body(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.text())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request rejected")
                    .to_string()
            });

        ClientError::Backend {
            status: status.as_u16(),
            message,
        }
    }

    /// Returns true for failures detected locally, before any network call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::MissingUser
                | Self::AlreadyClaimed(_)
                | Self::NoCouponAvailable(_)
        )
    }

    /// Text suitable for showing to the person at the terminal.
    /// Backend messages pass through verbatim; transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable { base_url } => format!(
                "Could not connect to the backend. Make sure it is running at {}.",
                base_url
            ),
            Self::InvalidResponse(_) => "Received an invalid response from the server.".to_string(),
            Self::Backend { message, .. } => message.clone(),
            Self::Validation(msg) => msg.clone(),
            Self::MissingUser => "User information not found. Please sign in again.".to_string(),
            Self::AlreadyClaimed(_) => {
                "You already hold a coupon of this type. Only one coupon per type can be claimed."
                    .to_string()
            }
            Self::NoCouponAvailable(_) => {
                "No coupon is currently available for this coupon type. Please try again later."
                    .to_string()
            }
            Self::Transport(_) => "Something went wrong while talking to the server.".to_string(),
            Self::InvalidBaseUrl(_) | Self::Io(_) | Self::Serialization(_) => self.to_string(),
        }
    }
}
