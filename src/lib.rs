//! Registry Catalog Library
//!
//! Discovers every repository hosted by a container registry, falling back
//! from the Docker Registry v2 catalog to the DTR and Harbor listing APIs,
//! and streams the names as they are found.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;

pub use config::{AuthConfig, ListingConfig};
pub use error::{RegistryError, Result};
pub use logging::Logger;
pub use registry::{RegistryClient, RegistryClientBuilder, RepositoryStream};
pub use tokio_util::sync::CancellationToken;
