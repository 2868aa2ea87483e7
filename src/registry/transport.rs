//! HTTP transport stack for registry listing requests
//!
//! [`HttpTransport`] is the seam every listing request goes through.
//! [`ReqwestTransport`] talks to the network, [`BasicAuthTransport`] decorates any
//! transport with a single retry using HTTP Basic credentials when the registry
//! challenges with `WWW-Authenticate: Basic ...`.

use crate::config::AuthConfig;
use crate::error::handlers::NetworkErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue, WWW_AUTHENTICATE};
use reqwest::{Client, Request, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Sends a prepared request and hands back the raw response
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}

/// Plain transport backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client honouring the timeout and TLS verification settings
    pub fn build(timeout: Duration, skip_tls: bool) -> Result<Self> {
        let mut builder = Client::builder().timeout(timeout);
        if skip_tls {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let client = builder
            .build()
            .map_err(|e| RegistryError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::new(client))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<Response> {
        let context = format!("GET {}", request.url());
        self.client
            .execute(request)
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, &context))
    }
}

/// Retries a request once with Basic credentials on a Basic challenge
pub struct BasicAuthTransport<T> {
    inner: T,
    base_url: Url,
    auth: AuthConfig,
    output: Logger,
}

impl<T: HttpTransport> BasicAuthTransport<T> {
    pub fn new(inner: T, base_url: &str, auth: AuthConfig, output: Logger) -> Result<Self> {
        Ok(Self {
            inner,
            base_url: Url::parse(base_url)?,
            auth,
            output,
        })
    }

    /// Same origin as the base, and a path at or below the base path
    fn is_under_base(&self, url: &Url) -> bool {
        let base = &self.base_url;
        if url.scheme() != base.scheme()
            || url.host_str() != base.host_str()
            || url.port_or_known_default() != base.port_or_known_default()
        {
            return false;
        }

        let base_path = base.path().trim_end_matches('/');
        let path = url.path();
        base_path.is_empty()
            || path == base_path
            || path
                .strip_prefix(base_path)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    fn authorization(&self) -> Result<HeaderValue> {
        let credentials = format!(
            "{}:{}",
            self.auth.username.as_deref().unwrap_or_default(),
            self.auth.password.as_deref().unwrap_or_default()
        );
        let mut value = HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(credentials)))
            .map_err(|e| RegistryError::Validation(format!("Invalid basic credentials: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn should_retry(&self, request_url: &Url, response: &Response) -> bool {
        if response.status() != StatusCode::UNAUTHORIZED {
            return false;
        }
        if !self.is_under_base(request_url) {
            return false;
        }

        let basic_challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("basic"));

        basic_challenge && self.auth.has_credentials()
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for BasicAuthTransport<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        let url = request.url().clone();
        let retry = request.try_clone();

        let response = self.inner.execute(request).await?;
        if !self.should_retry(&url, &response) {
            return Ok(response);
        }

        let Some(mut retry) = retry else {
            self.output.debug(&format!("Cannot replay request body for {}, not retrying", url));
            return Ok(response);
        };

        self.output.detail(&format!("Basic auth challenge from {}, retrying with credentials", url));
        retry.headers_mut().insert(AUTHORIZATION, self.authorization()?);
        self.inner.execute(retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> BasicAuthTransport<ReqwestTransport> {
        BasicAuthTransport::new(
            ReqwestTransport::new(Client::new()),
            base,
            AuthConfig::new("user".to_string(), "pass".to_string()),
            Logger::new_quiet(),
        )
        .unwrap()
    }

    fn under(base: &str, url: &str) -> bool {
        transport(base).is_under_base(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_host_case_and_default_port_are_normalized() {
        assert!(under("https://Registry.example.com", "https://registry.example.com/v2/_catalog"));
        assert!(under("https://registry.example.com:443", "https://registry.example.com/v2/_catalog"));
        assert!(under("http://registry.example.com:80/", "http://registry.example.com/api/projects"));
    }

    #[test]
    fn test_other_origins_are_rejected() {
        assert!(!under("http://127.0.0.1:4506", "http://127.0.0.1:45063/v2/_catalog"));
        assert!(!under("https://registry.example.com", "https://registry.example.com.evil.io/v2/_catalog"));
        assert!(!under("https://registry.example.com", "http://registry.example.com/v2/_catalog"));
        assert!(!under("https://registry.example.com", "https://cdn.example.com/v2/_catalog"));
    }

    #[test]
    fn test_base_path_is_a_segment_boundary() {
        assert!(under("https://example.com/registry", "https://example.com/registry/v2/_catalog"));
        assert!(under("https://example.com/registry/", "https://example.com/registry/v2/_catalog"));
        assert!(!under("https://example.com/registry", "https://example.com/registry-other/v2/_catalog"));
        assert!(!under("https://example.com/registry", "https://example.com/v2/_catalog"));
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        let result = BasicAuthTransport::new(
            ReqwestTransport::new(Client::new()),
            "not a url",
            AuthConfig::default(),
            Logger::new_quiet(),
        );
        assert!(matches!(result, Err(RegistryError::Validation(_))));
    }
}
