#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use url::Url;
use verifalia::api::ApiClientError;
use verifalia::endpoints::EndpointSet;
use verifalia::errors::{ConfigurationError, RequestFailure};
use verifalia::job_id::{JobId, JobIdError};

fn job_url() -> Url {
    Url::parse("https://api-1.verifalia.com/v2.4/email-validations/9ece66cf-916c-4313-9c40-b8a73f0ef872")
        .unwrap()
}

#[test]
fn test_request_failure_error_with_status_specific_suggestions() {
    // Test 410 error
    let request_failure = RequestFailure::new(job_url(), StatusCode::GONE, "Job expired");

    let error_message = format!("{request_failure}");

    assert!(error_message.contains("[E005]"));
    assert!(error_message.contains("410"));
    assert!(error_message.contains("Check that the job ID is correct"));
    assert!(error_message.contains("Server response: Job expired"));

    // Test 413 error
    let too_large = RequestFailure::new(job_url(), StatusCode::PAYLOAD_TOO_LARGE, "");

    let too_large_message = format!("{too_large}");
    assert!(too_large_message.contains("smaller batches"));
}

#[test]
fn test_job_id_error_with_format_info() {
    let invalid_id = "12345";
    let error = JobId::new(invalid_id).unwrap_err();
    let error_message = format!("{error}");

    assert!(error_message.contains("[E010]"));
    assert!(error_message.contains("12345 is not a valid job ID"));
    assert!(error_message.contains("Job IDs are UUIDs"));

    // Test proper error structure
    match error {
        JobIdError::Match(raw) => assert_eq!(raw, invalid_id),
        JobIdError::Regex(_) => panic!("Expected Match error"),
    }
}

#[test]
fn test_api_client_error_messages() {
    let unauthorized = ApiClientError::Unauthorized(RequestFailure::new(
        job_url(),
        StatusCode::UNAUTHORIZED,
        "",
    ));
    let unauthorized_message = format!("{unauthorized}");
    assert!(unauthorized_message.contains("[E003]"));
    assert!(unauthorized_message.contains("Check the username and password"));

    let no_credit = ApiClientError::InsufficientCredit(RequestFailure::new(
        job_url(),
        StatusCode::PAYMENT_REQUIRED,
        "",
    ));
    let no_credit_message = format!("{no_credit}");
    assert!(no_credit_message.contains("[E004]"));
    assert!(no_credit_message.contains("Add credit packs"));

    let exhausted = ApiClientError::NoReachableEndpoint { attempts: 3 };
    let exhausted_message = format!("{exhausted}");
    assert!(exhausted_message.contains("[E006]"));
    assert!(exhausted_message.contains("after 3 attempt(s)"));
}

#[test]
fn test_configuration_error_with_suggestions() {
    let error = EndpointSet::new(["api-1.verifalia.com"]).unwrap_err();
    let error_message = format!("{error}");

    assert!(matches!(error, ConfigurationError::InvalidUrl { .. }));
    assert!(error_message.contains("[E001]"));
    assert!(error_message.contains("api-1.verifalia.com"));
    assert!(error_message.contains("Use absolute URLs with protocol"));

    let empty = EndpointSet::new(Vec::<String>::new()).unwrap_err();
    assert!(matches!(empty, ConfigurationError::NoEndpoints));
}

#[test]
fn test_wrapped_errors_keep_their_code() {
    let invalid = ApiClientError::from(JobId::new("nope").unwrap_err());
    assert_eq!(invalid.error_code(), "E010");

    let configuration = ApiClientError::from(ConfigurationError::NoEndpoints);
    assert_eq!(configuration.error_code(), "E001");
    assert!(format!("{configuration}").starts_with("[E001]"));
}

#[test]
fn test_error_message_structure() {
    // Test that error messages follow consistent format
    let failure = RequestFailure::new(job_url(), StatusCode::BAD_REQUEST, "bad entries");

    let error_message = format!("{failure}");

    // Should have error code
    assert!(error_message.contains("[E"));
    // Should have suggestions section
    assert!(error_message.contains("Suggestions:"));
    // Should use bullet points
    assert!(error_message.contains("•"));
}
