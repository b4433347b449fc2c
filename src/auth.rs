//! Credentials attached to outbound requests.
//!
//! The set of modes is closed: no credentials, HTTP basic, bearer tokens
//! negotiated once against the token issuance resource, and TLS client
//! certificates presented by the transport itself.

use std::{fmt, fs, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine};
use once_cell::sync::OnceCell;
use reqwest::{
    blocking::{ClientBuilder, RequestBuilder},
    header::AUTHORIZATION,
    Certificate, Identity, StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiClientError, Request},
    endpoints::EndpointSet,
    errors::ConfigurationError,
};

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
}

/// Username and password, kept out of `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// PEM-encoded client identity plus the authorities used to validate the
/// server.
#[derive(Clone)]
pub struct ClientCertificate {
    identity_pem: Vec<u8>,
    trusted_pem: Option<Vec<u8>>,
}

impl ClientCertificate {
    /// `identity_pem` must hold the certificate chain and its private key.
    pub const fn new(identity_pem: Vec<u8>, trusted_pem: Option<Vec<u8>>) -> Self {
        Self {
            identity_pem,
            trusted_pem,
        }
    }

    /// # Errors
    ///
    /// Fails if either file cannot be read.
    pub fn from_pem_files(
        identity: impl AsRef<Path>,
        trusted: Option<&Path>,
    ) -> Result<Self, std::io::Error> {
        let identity_pem = fs::read(identity)?;
        let trusted_pem = trusted.map(fs::read).transpose()?;
        Ok(Self::new(identity_pem, trusted_pem))
    }

    fn configure(&self, builder: ClientBuilder) -> Result<ClientBuilder, ConfigurationError> {
        let identity = Identity::from_pem(&self.identity_pem)
            .map_err(|e| ConfigurationError::Certificate(e.to_string()))?;
        let mut builder = builder.identity(identity);

        if let Some(pem) = &self.trusted_pem {
            let authorities = Certificate::from_pem_bundle(pem)
                .map_err(|e| ConfigurationError::Certificate(e.to_string()))?;
            for authority in authorities {
                builder = builder.add_root_certificate(authority);
            }
        }

        Ok(builder)
    }
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("identity_pem", &format_args!("{} bytes", self.identity_pem.len()))
            .field("trusted_pem", &self.trusted_pem.as_ref().map(Vec::len))
            .finish()
    }
}

pub enum Authenticator {
    None,
    Basic {
        credentials: Credentials,
        header: OnceCell<String>,
    },
    Bearer {
        credentials: Credentials,
        token: OnceCell<String>,
    },
    ClientCertificate(ClientCertificate),
}

impl Authenticator {
    pub fn basic(credentials: Credentials) -> Self {
        Self::Basic {
            credentials,
            header: OnceCell::new(),
        }
    }

    pub fn bearer(credentials: Credentials) -> Self {
        Self::Bearer {
            credentials,
            token: OnceCell::new(),
        }
    }

    pub const fn client_certificate(certificate: ClientCertificate) -> Self {
        Self::ClientCertificate(certificate)
    }

    /// # Errors
    ///
    /// Never fails in practice; the defaults are well-formed.
    pub fn default_endpoints(&self) -> Result<EndpointSet, ConfigurationError> {
        match self {
            Self::ClientCertificate(_) => EndpointSet::client_certificate(),
            Self::None | Self::Basic { .. } | Self::Bearer { .. } => EndpointSet::standard(),
        }
    }

    /// Applied once, when the underlying transport is built.
    pub(crate) fn configure_transport(
        &self,
        builder: ClientBuilder,
    ) -> Result<ClientBuilder, ConfigurationError> {
        match self {
            Self::ClientCertificate(certificate) => certificate.configure(builder),
            Self::None | Self::Basic { .. } | Self::Bearer { .. } => Ok(builder),
        }
    }

    /// Adds the `Authorization` header for the current mode. Bearer mode
    /// issues a token through `client` on first use and reuses it
    /// afterwards; concurrent first uses wait for the same issuance.
    pub(crate) fn decorate(
        &self,
        client: &ApiClient,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, ApiClientError> {
        match self {
            Self::None | Self::ClientCertificate(_) => Ok(builder),
            Self::Basic {
                credentials,
                header,
            } => {
                let value = header.get_or_init(|| {
                    let raw = format!("{}:{}", credentials.username, credentials.password);
                    format!("Basic {}", STANDARD.encode(raw))
                });
                Ok(builder.header(AUTHORIZATION, value.as_str()))
            }
            Self::Bearer { credentials, token } => {
                let token = token.get_or_try_init(|| issue_token(client, credentials))?;
                Ok(builder.bearer_auth(token))
            }
        }
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { credentials, .. } => f.debug_tuple("Basic").field(credentials).finish(),
            Self::Bearer { credentials, token } => f
                .debug_struct("Bearer")
                .field("credentials", credentials)
                .field("token_issued", &token.get().is_some())
                .finish(),
            Self::ClientCertificate(certificate) => {
                f.debug_tuple("ClientCertificate").field(certificate).finish()
            }
        }
    }
}

fn issue_token(client: &ApiClient, credentials: &Credentials) -> Result<String, ApiClientError> {
    log::debug!("Issuing bearer token for {}", credentials.username);

    let request = Request::post(["auth", "tokens"])
        .anonymous()
        .json(&TokenRequest {
            username: &credentials.username,
            password: &credentials.password,
        })?;

    let response = client.execute(&request).map_err(|e| match e {
        ApiClientError::Unauthorized(failure)
        | ApiClientError::InsufficientCredit(failure)
        | ApiClientError::Failure(failure) => ApiClientError::Authentication(format!(
            "token issuance returned {}",
            failure.status
        )),
        other => other,
    })?;

    if response.status() != StatusCode::OK {
        return Err(ApiClientError::Authentication(format!(
            "token issuance returned {}",
            response.status()
        )));
    }

    response
        .json::<TokenResponse>()
        .ok()
        .and_then(|body| body.access_token)
        .ok_or_else(|| {
            ApiClientError::Authentication("token issuance response lacks accessToken".to_string())
        })
}
