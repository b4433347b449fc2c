use std::{sync::Arc, time::Duration};

use rand::Rng;
use reqwest::{
    blocking::{self, Client},
    header::{self, HeaderMap, HeaderValue},
};

use crate::{
    auth::Authenticator,
    endpoints::EndpointProvider,
    errors::{ConfigurationError, RequestFailure},
};

use super::errors::ApiClientError;
use super::request::{Request, Response, StatusClass};

pub const DEFAULT_API_VERSION: &str = "v2.4";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = concat!("verifalia-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// Where the executor starts when rotating through the endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndpointSelection {
    /// A uniformly random candidate, spreading load across equivalent
    /// endpoints.
    #[default]
    Random,
    /// Always the first candidate.
    Sequential,
}

impl EndpointSelection {
    pub(crate) fn starting_index<R: Rng + ?Sized>(self, len: usize, rng: &mut R) -> usize {
        match self {
            Self::Random if len > 1 => rng.gen_range(0..len),
            Self::Random | Self::Sequential => 0,
        }
    }
}

/// Blocking client for the REST API. Cheap to clone; clones share the
/// transport and the credential cache.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Arc<dyn EndpointProvider>,
    authenticator: Arc<Authenticator>,
    api_version: String,
    selection: EndpointSelection,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// # Errors
    ///
    /// Fails if the default endpoints for the authentication mode or the
    /// transport cannot be set up.
    pub fn new(authenticator: Authenticator) -> Result<Self, ApiClientError> {
        Self::builder().authenticator(authenticator).build()
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn endpoints(&self) -> &dyn EndpointProvider {
        self.endpoints.as_ref()
    }

    /// Delivers `request` to one of the candidate endpoints.
    ///
    /// Candidates are tried in rotation from the configured starting
    /// point. Connection failures, including a connection dropped while
    /// the answer is read, and throttling move on to the next candidate.
    /// 401/403, 402 and any other non-success status end the call at once.
    ///
    /// # Errors
    ///
    /// `Unauthorized`, `InsufficientCredit` and `Failure` for terminal
    /// answers, `Reqwest` when the last candidate cannot be reached and
    /// `NoReachableEndpoint` when every candidate asked to retry.
    pub fn execute(&self, request: &Request) -> Result<Response, ApiClientError> {
        let bases = self.endpoints.base_urls();
        let attempts = bases.len();
        let start = self
            .selection
            .starting_index(attempts, &mut rand::thread_rng());

        for attempt in 0..attempts {
            let index = (start + attempt) % attempts;
            let is_last = attempt + 1 == attempts;
            let url = request.url(&bases[index], &self.api_version);

            let mut builder = self.client.request(request.method().clone(), url.clone());
            if let Some(body) = request.body() {
                builder = builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body.to_owned());
            }
            if request.requires_auth() {
                builder = self.authenticator.decorate(self, builder)?;
            }

            log::debug!(
                "Attempt {}/{attempts}: {} {url}",
                attempt + 1,
                request.method()
            );

            let response = match builder.send() {
                Ok(response) => response,
                Err(e) if !is_last => {
                    log::warn!("Endpoint {} unreachable, trying next: {e}", bases[index]);
                    continue;
                }
                Err(e) => return Err(ApiClientError::Reqwest(e)),
            };

            let status = response.status();
            let body = match response.text() {
                Ok(body) => body,
                Err(e) if !is_last => {
                    log::warn!("Lost {} while reading the answer, trying next: {e}", bases[index]);
                    continue;
                }
                Err(e) => return Err(ApiClientError::Reqwest(e)),
            };
            log::debug!("{} {url} returned {status}", request.method());

            match StatusClass::of(status) {
                StatusClass::Success => return Ok(Response::new(url, status, body)),
                StatusClass::Unauthorized => {
                    return Err(ApiClientError::Unauthorized(RequestFailure::new(
                        url, status, body,
                    )))
                }
                StatusClass::InsufficientCredit => {
                    return Err(ApiClientError::InsufficientCredit(RequestFailure::new(
                        url, status, body,
                    )))
                }
                StatusClass::Retryable => {
                    log::warn!("Endpoint {} answered {status}, trying next", bases[index]);
                }
                StatusClass::Other => {
                    return Err(ApiClientError::from(RequestFailure::new(url, status, body)))
                }
            }
        }

        Err(ApiClientError::NoReachableEndpoint { attempts })
    }
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    authenticator: Authenticator,
    endpoints: Option<Arc<dyn EndpointProvider>>,
    api_version: String,
    timeout: Duration,
    user_agent: String,
    selection: EndpointSelection,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            authenticator: Authenticator::None,
            endpoints: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            selection: EndpointSelection::default(),
        }
    }
}

impl ApiClientBuilder {
    pub fn authenticator(mut self, authenticator: Authenticator) -> Self {
        self.authenticator = authenticator;
        self
    }

    /// Overrides the endpoints implied by the authentication mode.
    pub fn endpoints(mut self, endpoints: impl EndpointProvider + 'static) -> Self {
        self.endpoints = Some(Arc::new(endpoints));
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Per-attempt transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn selection(mut self, selection: EndpointSelection) -> Self {
        self.selection = selection;
        self
    }

    /// # Errors
    ///
    /// Fails if the endpoints are invalid or the transport (including a
    /// client certificate) cannot be configured.
    pub fn build(self) -> Result<ApiClient, ApiClientError> {
        let endpoints: Arc<dyn EndpointProvider> = match self.endpoints {
            Some(endpoints) => endpoints,
            None => Arc::new(self.authenticator.default_endpoints()?),
        };
        if endpoints.base_urls().is_empty() {
            return Err(ConfigurationError::NoEndpoints.into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let builder = blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(headers)
            .gzip(true);
        let client = self
            .authenticator
            .configure_transport(builder)?
            .build()
            .map_err(ConfigurationError::Transport)?;

        Ok(ApiClient {
            client,
            endpoints,
            authenticator: Arc::new(self.authenticator),
            api_version: self.api_version,
            selection: self.selection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::EndpointSet;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_random_start_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut hits = [0usize; 3];

        for _ in 0..3000 {
            hits[EndpointSelection::Random.starting_index(3, &mut rng)] += 1;
        }

        for count in hits {
            assert!((800..=1200).contains(&count), "skewed distribution: {hits:?}");
        }
    }

    #[test]
    fn test_sequential_start_is_first() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(EndpointSelection::Sequential.starting_index(3, &mut rng), 0);
        }
    }

    #[test]
    fn test_single_endpoint_start_is_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(EndpointSelection::Random.starting_index(1, &mut rng), 0);
    }

    #[test]
    fn test_builder_uses_endpoints_of_authentication_mode() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(
            client.endpoints().base_urls(),
            EndpointSet::standard().unwrap().base_urls()
        );
        assert_eq!(client.api_version(), DEFAULT_API_VERSION);
    }
}
