// This file contains the RegistryClient, which discovers the repositories
// hosted by a registry, and the builder that wires its transport stack.

use crate::config::{AuthConfig, ListingConfig};
use crate::error::Result;
use crate::error::handlers::ValidationErrorHandler;
use crate::logging::Logger;
use crate::registry::discovery::{Discovery, Session};
use crate::registry::fetcher::PaginatedFetcher;
use crate::registry::listing::Endpoints;
use crate::registry::stream::RepositoryStream;
use crate::registry::transport::{BasicAuthTransport, HttpTransport, ReqwestTransport};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

pub struct RegistryClientBuilder {
    address: String,
    auth_config: Option<AuthConfig>,
    skip_tls: bool,
    timeout: u64,
    listing: ListingConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    output: Logger,
}

impl RegistryClientBuilder {
    pub fn new(address: String) -> Self {
        Self {
            address,
            auth_config: None,
            skip_tls: false,
            timeout: 300,
            listing: ListingConfig::default(),
            transport: None,
            output: Logger::new(false),
        }
    }

    pub fn with_auth(mut self, auth_config: Option<AuthConfig>) -> Self {
        self.auth_config = auth_config;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    /// Request timeout in seconds
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.output = Logger::new(verbose);
        self
    }

    pub fn with_logger(mut self, output: Logger) -> Self {
        self.output = output;
        self
    }

    pub fn with_listing(mut self, listing: ListingConfig) -> Self {
        self.listing = listing;
        self
    }

    /// Replace the network transport; Basic auth retry is still layered on top
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        ValidationErrorHandler::validate_registry_url(&self.address)?;
        ValidationErrorHandler::validate_timeout(self.timeout)?;

        let address = self.address.trim_end_matches('/').to_string();

        let (client, inner): (Client, Arc<dyn HttpTransport>) = match self.transport {
            Some(transport) => (Client::new(), transport),
            None => {
                let transport =
                    ReqwestTransport::build(Duration::from_secs(self.timeout), self.skip_tls)?;
                (transport.client().clone(), Arc::new(transport) as Arc<dyn HttpTransport>)
            }
        };

        let transport = BasicAuthTransport::new(
            inner,
            &address,
            self.auth_config.unwrap_or_default(),
            self.output.clone(),
        )?;
        let fetcher = PaginatedFetcher::new(client, Arc::new(transport), self.output.clone());

        Ok(RegistryClient {
            address,
            fetcher,
            listing: self.listing,
            output: self.output,
        })
    }
}

/// Discovers repositories across the catalog, DTR and Harbor listing APIs
#[derive(Clone)]
pub struct RegistryClient {
    address: String,
    fetcher: PaginatedFetcher,
    listing: ListingConfig,
    output: Logger,
}

impl RegistryClient {
    pub fn new(
        address: String,
        username: Option<String>,
        password: Option<String>,
        skip_tls: bool,
    ) -> Result<Self> {
        let auth_config = AuthConfig { username, password };
        Self::builder(address)
            .with_auth(Some(auth_config))
            .with_skip_tls(skip_tls)
            .build()
    }

    pub fn builder(address: String) -> RegistryClientBuilder {
        RegistryClientBuilder::new(address)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Start discovery on a background task.
    ///
    /// Must be called within a tokio runtime. Cancelling `cancel` stops the
    /// producer before its next request or handoff without reporting an error.
    pub fn stream_repositories(&self, cancel: CancellationToken) -> RepositoryStream {
        let (names_tx, names_rx) = mpsc::channel(1);
        let (errors_tx, errors_rx) = oneshot::channel();

        let session = Session::new(
            Endpoints::new(&self.address, self.listing.page_size),
            &self.listing,
        );
        let discovery = Discovery::new(session, self.fetcher.clone(), self.output.clone());

        self.output
            .verbose(&format!("Listing repositories of {}", self.address));
        tokio::spawn(discovery.run(names_tx, errors_tx, cancel.clone()));

        RepositoryStream::new(names_rx, errors_rx, cancel)
    }

    /// Every repository, in discovery order.
    ///
    /// Any error discards the names gathered so far.
    pub async fn repositories(&self) -> Result<Vec<String>> {
        self.stream_repositories(CancellationToken::new())
            .collect()
            .await
    }
}
