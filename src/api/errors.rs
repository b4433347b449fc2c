use thiserror::Error;

use crate::errors::{ConfigurationError, RequestFailure};
use crate::job_id::JobIdError;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("[E002] Authentication failed: {0}\n\nSuggestions:\n  • Check the username and password\n  • Verify that the user is allowed to issue bearer tokens")]
    Authentication(String),

    #[error("[E003] Credentials were rejected by the service ({0})\n\nSuggestions:\n  • Check the username and password or the client certificate\n  • Verify that the user has the permission required by this operation")]
    Unauthorized(RequestFailure),

    #[error("[E004] Insufficient credit to complete the request ({0})\n\nSuggestions:\n  • Add credit packs to the account\n  • Wait for the daily free credits to reset")]
    InsufficientCredit(RequestFailure),

    #[error(transparent)]
    Failure(#[from] RequestFailure),

    #[error("[E006] No reachable endpoint after {attempts} attempt(s)\n\nSuggestions:\n  • The service may be throttling requests, wait a moment before retrying\n  • Check your network connectivity")]
    NoReachableEndpoint { attempts: usize },

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("[E007] Unexpected response payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    InvalidJobId(#[from] JobIdError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl ApiClientError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "E001",
            Self::Authentication(_) => "E002",
            Self::Unauthorized(_) => "E003",
            Self::InsufficientCredit(_) => "E004",
            Self::Failure(f) => f.error_code(),
            Self::NoReachableEndpoint { .. } => "E006",
            Self::Json(_) => "E007",
            Self::InvalidJobId(_) => "E010",
            Self::Reqwest(_) | Self::IoError(_) => "E999", // Network errors get generic code
        }
    }

    /// No candidate endpoint could be reached or all of them asked to retry.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::NoReachableEndpoint { .. } | Self::Reqwest(_))
    }

    /// Answers from the service that retrying would not change.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::InsufficientCredit(_) | Self::Failure(_)
        )
    }
}
