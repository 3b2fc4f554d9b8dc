use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request rejected with HTTP {status}: {body}")]
    ClientRequest { status: u16, body: String },

    #[error("Server error HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server rejected the request: {0}")]
    Rejected(String),

    #[error("Giving up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<MaintenanceError>,
    },
}

impl MaintenanceError {
    /// Builds the error for a non-2xx response. `reason` is the envelope
    /// message when the server sent one, otherwise the raw body.
    pub fn from_status(status: u16, body: String, reason: Option<String>) -> Self {
        match status {
            400 => Self::InvalidRequest(reason.unwrap_or(body)),
            401 => Self::AuthenticationRequired(reason.unwrap_or(body)),
            403 => Self::AuthorizationDenied(reason.unwrap_or(body)),
            400..=499 => Self::ClientRequest {
                status,
                body: reason.unwrap_or(body),
            },
            _ => Self::Http {
                status,
                body: reason.unwrap_or(body),
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Http { .. } | Self::Network(_)
        )
    }

    /// Text shown to the operator when an explicit action fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationRequired(_) => {
                "Your session has expired. Please sign in again.".to_string()
            }
            Self::AuthorizationDenied(_) => {
                "Admin access is required to change maintenance mode.".to_string()
            }
            Self::Timeout(_) => "The request timed out. Please try again.".to_string(),
            Self::Validation(reason) | Self::InvalidRequest(reason) => {
                format!("Invalid maintenance settings: {reason}")
            }
            Self::Rejected(reason) => format!("The server refused the change: {reason}"),
            Self::ExhaustedRetries { last, .. } => last.user_message(),
            Self::ClientRequest { .. } | Self::Http { .. } | Self::Network(_) => {
                "Could not reach the maintenance service. Please try again.".to_string()
            }
        }
    }
}
