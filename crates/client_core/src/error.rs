use shared::error::ValidationErrors;
use thiserror::Error;

pub const UNREACHABLE_MESSAGE: &str =
    "Unable to reach the server. Check that the backend is running.";
pub const REJECTED_MESSAGE: &str = "The server rejected the request.";
pub const NOT_FOUND_MESSAGE: &str = "The requested record was not found.";

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("transport failure: {0}")]
    Network(String),
    #[error("request rejected (status {status:?}): {}", describe(.message.as_deref(), .errors))]
    Application {
        status: Option<u16>,
        message: Option<String>,
        errors: Vec<String>,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

fn describe(message: Option<&str>, errors: &[String]) -> String {
    if !errors.is_empty() {
        return errors.join(", ");
    }
    message.unwrap_or("no details").to_string()
}

impl ClientError {
    pub fn rejected(status: Option<u16>, message: Option<String>, errors: Vec<String>) -> Self {
        Self::Application {
            status,
            message,
            errors,
        }
    }

    /// Text shown to the user in place of the failed content.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Timeout(_) | ClientError::Network(_) => UNREACHABLE_MESSAGE.to_string(),
            ClientError::Application {
                message, errors, ..
            } => {
                if !errors.is_empty() {
                    errors.join(", ")
                } else if let Some(message) = message.as_deref().filter(|m| !m.trim().is_empty()) {
                    message.to_string()
                } else {
                    REJECTED_MESSAGE.to_string()
                }
            }
            ClientError::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            ClientError::Decode(_) => REJECTED_MESSAGE.to_string(),
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::Config(reason) => reason.clone(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Network(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::rejected(Some(status.as_u16()), None, Vec::new())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
