//! Registry module for repository discovery
//!
//! This module provides the transport stack, pagination and the dialect
//! fallback state machine used to enumerate every repository of a registry.

pub mod client;
pub(crate) mod discovery;
pub mod fetcher;
pub mod link;
pub mod listing;
pub mod stream;
pub mod transport;

pub use crate::config::AuthConfig;
pub use client::{RegistryClient, RegistryClientBuilder};
pub use fetcher::{Page, PaginatedFetcher};
pub use listing::Dialect;
pub use stream::RepositoryStream;
pub use transport::{BasicAuthTransport, HttpTransport, ReqwestTransport};
