use reqwest::StatusCode;
use std::fmt::{self, Formatter};
use thiserror::Error;
use url::Url;

/// A non-success answer from the service that the client does not
/// interpret on its own.
#[derive(Debug, Error)]
pub struct RequestFailure {
    pub url: Url,
    pub status: StatusCode,
    pub msg: String,
}

impl RequestFailure {
    pub fn new(url: Url, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            url,
            status,
            msg: msg.into(),
        }
    }

    pub const fn error_code(&self) -> &'static str {
        "E005"
    }

    fn suggestions(&self) -> Vec<&'static str> {
        match self.status {
            StatusCode::BAD_REQUEST => vec![
                "Check that every submitted entry is a non-empty string",
                "Verify the quality level and deduplication mode names",
            ],
            StatusCode::NOT_FOUND | StatusCode::GONE => vec![
                "Check that the job ID is correct",
                "The job may have been deleted or may have expired",
            ],
            StatusCode::PAYLOAD_TOO_LARGE => vec![
                "Split the email list into smaller batches",
            ],
            StatusCode::TOO_MANY_REQUESTS => vec![
                "Wait a moment before retrying",
                "Consider reducing request frequency",
            ],
            status if status.is_server_error() => vec![
                "The service may be temporarily unavailable, try again later",
            ],
            _ => vec!["Check the server response below for details"],
        }
    }
}

impl fmt::Display for RequestFailure {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        writeln!(
            formatter,
            "[{}] {} returned {}",
            self.error_code(),
            self.url,
            self.status
        )?;
        writeln!(formatter, "\nServer response: {}", self.msg)?;
        writeln!(formatter, "\nSuggestions:")?;
        for suggestion in self.suggestions() {
            writeln!(formatter, "  • {suggestion}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("[E001] No endpoints configured\n\nSuggestions:\n  • Provide at least one base URL\n  • Omit the endpoint list to use the default endpoints")]
    NoEndpoints,

    #[error("[E001] Invalid endpoint URL '{raw}': {source}\n\nSuggestions:\n  • Use absolute URLs with protocol (http:// or https://)\n  • Example: https://api-1.verifalia.com")]
    InvalidUrl {
        raw: String,
        #[source]
        source: url::ParseError,
    },

    #[error("[E001] Endpoint URL cannot be a base: {0}\n\nSuggestions:\n  • Provide a valid HTTP or HTTPS URL\n  • Ensure the URL includes the protocol (http:// or https://)")]
    CannotBeBase(Url),

    #[error("[E001] Invalid client certificate: {0}")]
    Certificate(String),

    #[error("[E001] Failed to build the HTTP transport: {0}")]
    Transport(#[source] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failure_mentions_status_and_body() {
        let url = Url::parse("https://api-1.verifalia.com/v2.4/email-validations").unwrap();
        let failure = RequestFailure::new(url, StatusCode::BAD_REQUEST, "entries is required");
        let message = failure.to_string();

        assert!(message.starts_with("[E005]"));
        assert!(message.contains("400"));
        assert!(message.contains("Server response: entries is required"));
        assert!(message.contains("quality level"));
    }

    #[test]
    fn test_request_failure_server_error_suggestion() {
        let url = Url::parse("https://api-1.verifalia.com/v2.4/credits/balance").unwrap();
        let failure = RequestFailure::new(url, StatusCode::INTERNAL_SERVER_ERROR, "boom");

        assert!(failure.to_string().contains("temporarily unavailable"));
    }

    #[test]
    fn test_configuration_error_codes() {
        assert!(ConfigurationError::NoEndpoints.to_string().starts_with("[E001]"));
    }
}
