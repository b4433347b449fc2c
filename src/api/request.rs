use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

/// A single logical call against the service, independent of the
/// endpoint it ends up being delivered to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    method: Method,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<String>,
    requires_auth: bool,
}

impl Request {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    pub fn delete<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::DELETE, segments)
    }

    /// # Errors
    ///
    /// Fails if `body` cannot be serialized to JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Marks the request as not needing credentials, e.g. token issuance.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub const fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    /// Resolves the request against one candidate base address:
    /// `{base}/{api_version}/{segments..}?{query}`.
    pub(crate) fn url(&self, base: &Url, api_version: &str) -> Url {
        let mut url = base.clone();
        // Endpoint sets reject addresses that cannot be a base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(api_version).extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        url
    }
}

/// How the client reacts to a status code. Derived on demand, never
/// stored, since the same code means different things for different
/// resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Unauthorized,
    InsufficientCredit,
    Retryable,
    Other,
}

impl StatusClass {
    pub fn of(status: StatusCode) -> Self {
        match status {
            status if status.is_success() => Self::Success,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized,
            StatusCode::PAYMENT_REQUIRED => Self::InsufficientCredit,
            StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => Self::Retryable,
            _ => Self::Other,
        }
    }
}

/// The outcome of one delivered attempt.
#[derive(Clone, Debug)]
pub struct Response {
    url: Url,
    status: StatusCode,
    body: String,
}

impl Response {
    pub fn new(url: Url, status: StatusCode, body: String) -> Self {
        Self { url, status, body }
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }

    /// # Errors
    ///
    /// Fails if the payload is not the expected JSON document.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body).map_err(|e| {
            log::error!("Failed to parse JSON response from {}: {e}", self.url);
            log::error!("Response text: {}", self.body);
            e
        })
    }
}
