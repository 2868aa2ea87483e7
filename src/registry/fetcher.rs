//! Paginated JSON fetching

use crate::error::handlers::HttpErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::link::next_link;
use crate::registry::transport::HttpTransport;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, Request};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// One decoded page plus where to go next.
///
/// `Last` is the "no more pages" outcome: its body is still a valid page.
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    Next { body: T, next: String },
    Last(T),
}

impl<T> Page<T> {
    pub fn into_parts(self) -> (T, Option<String>) {
        match self {
            Page::Next { body, next } => (body, Some(next)),
            Page::Last(body) => (body, None),
        }
    }
}

/// Issues GETs through the transport stack and follows `Link` pagination
#[derive(Clone)]
pub struct PaginatedFetcher {
    client: Client,
    transport: Arc<dyn HttpTransport>,
    output: Logger,
}

impl PaginatedFetcher {
    pub fn new(client: Client, transport: Arc<dyn HttpTransport>, output: Logger) -> Self {
        Self {
            client,
            transport,
            output,
        }
    }

    /// Fetch `url`, decode its body as `T` and resolve the next page against `url`
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>> {
        self.output.detail(&format!("GET {}", url));

        let request: Request = self
            .client
            .request(Method::GET, url)
            .header(ACCEPT, "application/json")
            .build()
            .map_err(|e| RegistryError::Validation(format!("Invalid request URL {}: {}", url, e)))?;

        let response = self.transport.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();

        let text = response
            .text()
            .await
            .map_err(|e| RegistryError::Network(format!("Failed to read response from {}: {}", url, e)))?;

        if !status.is_success() {
            return Err(HttpErrorHandler::status_error(status, url, &text));
        }

        let body: T = serde_json::from_str(&text).map_err(|e| {
            RegistryError::Parse(format!("Failed to decode response from {}: {}", url, e))
        })?;

        match next_link(url, &headers)? {
            Some(next) => Ok(Page::Next { body, next }),
            None => Ok(Page::Last(body)),
        }
    }
}
