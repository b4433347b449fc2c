use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{
    time_span, Deduplication, EntryClassification, EntryStatus, QualityLevel, ValidationStatus,
};
use crate::job_id::JobId;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub percentage: f64,
    #[serde(default, with = "time_span::option", skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<Duration>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOverview {
    pub id: JobId,
    pub submitted_on: DateTime<Utc>,
    pub completed_on: Option<DateTime<Utc>>,
    pub created_on: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub owner: Option<String>,
    #[serde(rename = "clientIP")]
    pub client_ip: Option<String>,
    pub priority: Option<u8>,
    pub quality: Option<QualityLevel>,
    pub deduplication: Option<Deduplication>,
    #[serde(default, with = "time_span::option")]
    pub retention: Option<Duration>,
    pub status: ValidationStatus,
    pub no_of_entries: usize,
    pub progress: Option<Progress>,
}

impl ValidationOverview {
    pub fn is_completed(&self) -> bool {
        self.status == ValidationStatus::Completed
    }

    /// Deleted or expired; the job has no results to wait for.
    pub fn is_gone(&self) -> bool {
        matches!(
            self.status,
            ValidationStatus::Deleted | ValidationStatus::Expired
        )
    }

    /// Completion ratio between 0 and 1, 1 once the job is completed.
    pub fn percentage(&self) -> Option<f64> {
        if self.is_completed() {
            Some(1.0)
        } else {
            self.progress.as_ref().map(|progress| progress.percentage)
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEntry {
    pub index: usize,
    pub input_data: String,
    pub classification: EntryClassification,
    pub status: EntryStatus,
    pub email_address: Option<String>,
    pub email_address_local_part: Option<String>,
    pub email_address_domain_part: Option<String>,
    pub ascii_email_address_domain_part: Option<String>,
    pub has_international_mailbox_name: Option<bool>,
    pub has_international_domain_name: Option<bool>,
    pub is_disposable_email_address: Option<bool>,
    pub is_role_account: Option<bool>,
    pub is_free_email_address: Option<bool>,
    pub syntax_failure_index: Option<usize>,
    pub custom: Option<String>,
    pub duplicate_of: Option<usize>,
    pub completed_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// A job snapshot: the overview plus every entry. Entries are empty while
/// the job is still running.
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    pub overview: ValidationOverview,
    pub entries: Vec<ValidationEntry>,
}

impl Validation {
    pub fn is_completed(&self) -> bool {
        self.overview.is_completed()
    }

    pub fn id(&self) -> &JobId {
        &self.overview.id
    }

    pub fn status(&self) -> ValidationStatus {
        self.overview.status
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingMeta {
    pub cursor: Option<String>,
    #[serde(default)]
    pub is_truncated: bool,
}

/// One page of a cursor-paginated listing.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: ListingMeta,
}

impl<T> Page<T> {
    /// The cursor of the following page, if the listing goes on.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.meta.is_truncated {
            self.meta.cursor.as_deref()
        } else {
            None
        }
    }
}

/// Wire form of `email-validations` and `email-validations/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ValidationResponse {
    pub overview: ValidationOverview,
    pub entries: Option<Page<ValidationEntry>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub input_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl EntryRequest {
    pub fn new(input_data: impl Into<String>) -> Self {
        Self {
            input_data: input_data.into(),
            custom: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Callback {
    pub url: String,
}

/// Body of a job submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub entries: Vec<EntryRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deduplication: Option<Deduplication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(
        with = "time_span::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub retention: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback: Option<Callback>,
}

impl ValidationRequest {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: addresses.into_iter().map(EntryRequest::new).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn quality(mut self, quality: QualityLevel) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub fn deduplication(mut self, deduplication: Deduplication) -> Self {
        self.deduplication = Some(deduplication);
        self
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBalance {
    pub credit_packs: f64,
    pub free_credits: Option<f64>,
    #[serde(default, with = "time_span::option")]
    pub free_credits_reset_in: Option<Duration>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub credit_packs: f64,
    pub free_credits: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const OVERVIEW: &str = r#"{
        "id": "9ece66cf-916c-4313-9c40-b8a73f0ef872",
        "submittedOn": "2024-05-01T10:00:00Z",
        "createdOn": "2024-05-01T10:00:00Z",
        "owner": "7c3b9a5e-0000-0000-0000-000000000000",
        "clientIP": "192.0.2.1",
        "quality": "Standard",
        "deduplication": "Off",
        "retention": "30.00:00:00",
        "status": "InProgress",
        "noOfEntries": 2,
        "progress": { "percentage": 0.5, "estimatedTimeRemaining": "00:00:10" }
    }"#;

    #[test]
    fn test_overview_deserialization() {
        let overview: ValidationOverview = serde_json::from_str(OVERVIEW).unwrap();

        assert_eq!(overview.id.as_ref(), "9ece66cf-916c-4313-9c40-b8a73f0ef872");
        assert_eq!(overview.status, ValidationStatus::InProgress);
        assert_eq!(overview.client_ip.as_deref(), Some("192.0.2.1"));
        assert_eq!(overview.retention, Some(Duration::from_secs(30 * 86_400)));
        assert_eq!(overview.percentage(), Some(0.5));
        assert_eq!(
            overview.progress.unwrap().estimated_time_remaining,
            Some(Duration::from_secs(10))
        );
        assert!(overview.completed_on.is_none());
    }

    #[test]
    fn test_entry_deserialization() {
        let entry: ValidationEntry = serde_json::from_str(
            r#"{
                "index": 0,
                "inputData": "batman@gmail.com",
                "classification": "Deliverable",
                "status": "Success",
                "emailAddress": "batman@gmail.com",
                "isFreeEmailAddress": true,
                "suggestions": ["batman@gmail.com"]
            }"#,
        )
        .unwrap();

        assert_eq!(entry.classification, EntryClassification::Deliverable);
        assert_eq!(entry.status, EntryStatus::Success);
        assert_eq!(entry.is_free_email_address, Some(true));
        assert_eq!(entry.suggestions, vec!["batman@gmail.com".to_string()]);
    }

    #[test]
    fn test_validation_request_omits_unset_fields() {
        let request = ValidationRequest::new(["a@example.com"]).quality(QualityLevel::High);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "entries": [{ "inputData": "a@example.com" }],
                "quality": "High"
            })
        );
    }

    #[test]
    fn test_page_cursor_only_when_truncated() {
        let page: Page<DailyUsage> = serde_json::from_str(
            r#"{ "data": [], "meta": { "cursor": "abc", "isTruncated": false } }"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor(), None);

        let page: Page<DailyUsage> = serde_json::from_str(
            r#"{ "data": [], "meta": { "cursor": "abc", "isTruncated": true } }"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor(), Some("abc"));
    }

    #[test]
    fn test_credit_balance_deserialization() {
        let balance: CreditBalance = serde_json::from_str(
            r#"{ "creditPacks": 956.332, "freeCredits": 128.66, "freeCreditsResetIn": "09:08:23" }"#,
        )
        .unwrap();

        assert_eq!(balance.credit_packs, 956.332);
        assert_eq!(balance.free_credits, Some(128.66));
        assert_eq!(
            balance.free_credits_reset_in,
            Some(Duration::from_secs(9 * 3_600 + 8 * 60 + 23))
        );
    }
}
