//! Runner that lists a registry's repositories for the command line

use crate::cli::args::{Args, OutputFormat};
use crate::config::{AuthConfig, Config, ListingConfig};
use crate::error::handlers::ValidationErrorHandler;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::{RegistryClient, RegistryClientBuilder};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Arguments merged with environment fallbacks
#[derive(Debug, Clone)]
pub struct Settings {
    pub registry: String,
    pub auth: Option<AuthConfig>,
    pub skip_tls: bool,
    pub listing: ListingConfig,
}

#[derive(Debug, Serialize)]
struct CatalogOutput<'a> {
    registry: &'a str,
    count: usize,
    repositories: Vec<String>,
}

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Ok(Self { args, output })
    }

    pub fn output(&self) -> &Logger {
        &self.output
    }

    pub async fn run(&self) -> Result<()> {
        self.output.section("Registry Catalog");
        self.args.validate()?;

        let settings = self.resolve_settings(Config::from_env()?)?;
        let client = self.create_registry_client(&settings)?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        let count = match self.args.output {
            OutputFormat::Text => self.print_text(&client, cancel.clone()).await?,
            OutputFormat::Json => self.print_json(&client, cancel.clone()).await?,
        };

        if cancel.is_cancelled() {
            self.output
                .warning(&format!("Interrupted after {} repositories", count));
        } else {
            if count == 0 {
                self.output.info("Registry returned no repositories");
            }
            self.output.success(&format!(
                "Listed {} repositories in {}",
                count,
                self.output.format_duration(self.output.elapsed())
            ));
        }

        Ok(())
    }

    /// Command-line values win over REGISTRY_* environment variables
    pub fn resolve_settings(&self, env: Config) -> Result<Settings> {
        let registry = self
            .args
            .registry
            .clone()
            .or(env.registry_address)
            .ok_or_else(|| {
                RegistryError::Config(
                    "Registry URL is required (--registry or REGISTRY_ADDRESS)".to_string(),
                )
            })?;
        ValidationErrorHandler::validate_registry_url(&registry)?;

        let (username, password) = if self.args.username.is_some() || self.args.password.is_some() {
            (self.args.username.clone(), self.args.password.clone())
        } else {
            (env.username, env.password)
        };
        let auth = AuthConfig { username, password };

        let listing = ListingConfig::default()
            .with_namespaced_fallback(!self.args.no_namespaced_fallback)
            .with_project_fallback(self.args.project_fallback || env.project_fallback)
            .with_page_size(self.args.page_size);

        Ok(Settings {
            registry,
            auth: auth.has_credentials().then_some(auth),
            skip_tls: self.args.skip_tls || env.skip_tls,
            listing,
        })
    }

    fn create_registry_client(&self, settings: &Settings) -> Result<RegistryClient> {
        self.output.summary_kv(
            "Discovery settings",
            &[
                ("Registry", settings.registry.clone()),
                (
                    "Credentials",
                    if settings.auth.is_some() { "provided" } else { "anonymous" }.to_string(),
                ),
                ("DTR fallback", settings.listing.namespaced_fallback.to_string()),
                ("Harbor fallback", settings.listing.project_fallback.to_string()),
            ],
        );

        if settings.skip_tls {
            self.output.warning("TLS certificate verification is disabled");
        }

        RegistryClientBuilder::new(settings.registry.clone())
            .with_auth(settings.auth.clone())
            .with_skip_tls(settings.skip_tls)
            .with_timeout(self.args.timeout)
            .with_listing(settings.listing.clone())
            .with_logger(self.output.clone())
            .build()
    }

    async fn print_text(&self, client: &RegistryClient, cancel: CancellationToken) -> Result<usize> {
        self.output.step("Streaming repositories");

        let mut stream = client.stream_repositories(cancel);
        let mut count = 0;
        while let Some(item) = stream.next().await {
            println!("{}", item?);
            count += 1;
        }
        Ok(count)
    }

    async fn print_json(&self, client: &RegistryClient, cancel: CancellationToken) -> Result<usize> {
        self.output.step("Collecting repositories");

        let repositories = client.stream_repositories(cancel).collect().await?;
        let document = CatalogOutput {
            registry: client.address(),
            count: repositories.len(),
            repositories,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        Ok(document.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn runner(argv: &[&str]) -> Runner {
        let mut full = vec!["registry-catalog"];
        full.extend_from_slice(argv);
        Runner::new(Args::try_parse_from(full).unwrap()).unwrap()
    }

    #[test]
    fn test_arguments_override_environment() {
        let env = Config {
            registry_address: Some("https://env.example.com".to_string()),
            username: Some("env-user".to_string()),
            password: Some("env-pass".to_string()),
            skip_tls: true,
            project_fallback: false,
        };

        let settings = runner(&["-r", "https://cli.example.com", "-u", "cli", "-p", "pw"])
            .resolve_settings(env)
            .unwrap();

        assert_eq!(settings.registry, "https://cli.example.com");
        let auth = settings.auth.unwrap();
        assert_eq!(auth.username.as_deref(), Some("cli"));
        assert!(settings.skip_tls);
    }

    #[test]
    fn test_environment_fills_missing_arguments() {
        let env = Config {
            registry_address: Some("https://env.example.com".to_string()),
            project_fallback: true,
            ..Config::default()
        };

        let settings = runner(&["--no-namespaced-fallback"]).resolve_settings(env).unwrap();
        assert_eq!(settings.registry, "https://env.example.com");
        assert!(settings.auth.is_none());
        assert!(!settings.listing.namespaced_fallback);
        assert!(settings.listing.project_fallback);
    }

    #[test]
    fn test_missing_registry_is_a_config_error() {
        let err = runner(&[]).resolve_settings(Config::default()).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
