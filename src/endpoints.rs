use url::Url;

use crate::errors::ConfigurationError;

/// Base addresses used with username/password or bearer authentication.
pub const DEFAULT_BASE_URLS: [&str; 3] = [
    "https://api-1.verifalia.com",
    "https://api-2.verifalia.com",
    "https://api-3.verifalia.com",
];

/// Base addresses accepting TLS client certificate authentication.
pub const DEFAULT_CCA_BASE_URLS: [&str; 3] = [
    "https://api-cca-1.verifalia.com",
    "https://api-cca-2.verifalia.com",
    "https://api-cca-3.verifalia.com",
];

/// Supplies the candidate base addresses a request may be sent to.
///
/// Implementations are expected to be cheap and deterministic; all
/// validation happens when they are constructed.
pub trait EndpointProvider: Send + Sync {
    fn base_urls(&self) -> &[Url];
}

/// A non-empty, immutable list of equivalent base addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointSet {
    urls: Vec<Url>,
}

impl EndpointSet {
    /// # Errors
    ///
    /// Fails if `raw` is empty or if any address is malformed or cannot be
    /// a base, so that configuration mistakes surface before any request.
    pub fn new<I, S>(raw: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls = raw
            .into_iter()
            .map(|candidate| {
                let candidate = candidate.as_ref();
                Url::parse(candidate).map_err(|source| ConfigurationError::InvalidUrl {
                    raw: candidate.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_urls(urls)
    }

    /// # Errors
    ///
    /// Fails if `urls` is empty or contains an address that cannot be a
    /// base. We rely on that invariant when building request URLs.
    pub fn from_urls(urls: Vec<Url>) -> Result<Self, ConfigurationError> {
        if urls.is_empty() {
            return Err(ConfigurationError::NoEndpoints);
        }

        if let Some(url) = urls.iter().find(|url| url.cannot_be_a_base()) {
            return Err(ConfigurationError::CannotBeBase(url.clone()));
        }

        Ok(Self { urls })
    }

    /// # Errors
    ///
    /// Never fails in practice; the defaults are well-formed.
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::new(DEFAULT_BASE_URLS)
    }

    /// # Errors
    ///
    /// Never fails in practice; the defaults are well-formed.
    pub fn client_certificate() -> Result<Self, ConfigurationError> {
        Self::new(DEFAULT_CCA_BASE_URLS)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl EndpointProvider for EndpointSet {
    fn base_urls(&self) -> &[Url] {
        &self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sets_are_valid() {
        assert_eq!(EndpointSet::standard().unwrap().len(), 3);
        assert_eq!(EndpointSet::client_certificate().unwrap().len(), 3);
    }

    #[test]
    fn test_order_is_preserved() {
        let set = EndpointSet::new(["https://b.example.com", "https://a.example.com"]).unwrap();
        let hosts: Vec<_> = set
            .base_urls()
            .iter()
            .map(|url| url.host_str().unwrap().to_string())
            .collect();
        assert_eq!(hosts, vec!["b.example.com", "a.example.com"]);
    }

    #[test]
    fn test_empty_set_is_rejected() {
        let result = EndpointSet::new(Vec::<String>::new());
        assert!(matches!(result, Err(ConfigurationError::NoEndpoints)));
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        let result = EndpointSet::new(["https://ok.example.com", "not a url"]);
        match result {
            Err(ConfigurationError::InvalidUrl { raw, .. }) => assert_eq!(raw, "not a url"),
            other => panic!("Expected InvalidUrl, got {other:?}"),
        }
    }

    #[test]
    fn test_cannot_be_base_is_rejected() {
        let result = EndpointSet::new(["mailto:someone@example.com"]);
        assert!(matches!(result, Err(ConfigurationError::CannotBeBase(_))));
    }
}
