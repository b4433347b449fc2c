use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref JOB_ID_REGEX: Result<Regex, regex::Error> = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    );
}

/// Identifier of an email validation job, in its UUID text form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobIdError {
    #[error("[E010] {0} is not a valid job ID\n\nSuggestions:\n  • Job IDs are UUIDs, e.g. 9ece66cf-916c-4313-9c40-b8a73f0ef872\n  • Copy the ID printed when the job was submitted")]
    Match(String),
    #[error("Job ID regex error")]
    Regex(#[from] regex::Error),
}

impl JobId {
    /// # Errors
    ///
    /// Will fail if `raw` is not a hyphenated UUID, i.e. 32 hexadecimal
    /// digits grouped 8-4-4-4-12.
    pub fn new(raw: &str) -> Result<Self, JobIdError> {
        let re = JOB_ID_REGEX.as_ref().map_err(Clone::clone)?;

        if re.is_match(raw) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(JobIdError::Match(raw.to_string()))
        }
    }
}

impl TryFrom<String> for JobId {
    type Error = JobIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<JobId> for String {
    fn from(value: JobId) -> Self {
        value.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
