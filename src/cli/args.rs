//! Command-line argument parsing

use crate::error::handlers::ValidationErrorHandler;
use crate::error::{RegistryError, Result};
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "registry-catalog")]
#[command(about = "List every repository hosted by a Docker/OCI registry")]
#[command(version, author)]
pub struct Args {
    /// Registry base URL (falls back to REGISTRY_ADDRESS)
    #[arg(
        long = "registry",
        short = 'r',
        help = "Registry base URL, e.g. https://registry.example.com"
    )]
    pub registry: Option<String>,

    /// Registry username
    #[arg(
        long = "username",
        short = 'u',
        help = "Username for registry authentication"
    )]
    pub username: Option<String>,

    /// Registry password
    #[arg(
        long = "password",
        short = 'p',
        help = "Password for registry authentication"
    )]
    pub password: Option<String>,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for each request
    #[arg(
        long = "timeout",
        short = 't',
        default_value = "300",
        help = "Timeout for each listing request in seconds"
    )]
    pub timeout: u64,

    #[arg(long = "page-size", help = "Requested number of entries per page")]
    pub page_size: Option<u32>,

    #[arg(
        long = "no-namespaced-fallback",
        help = "Do not try the DTR /api/v0/repositories/ listing when the catalog is unauthorized"
    )]
    pub no_namespaced_fallback: bool,

    #[arg(
        long = "project-fallback",
        help = "Also try the Harbor /api/projects listing when earlier dialects fail"
    )]
    pub project_fallback: bool,

    /// Output format for results
    #[arg(
        long = "output",
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format: text or json"
    )]
    pub output: OutputFormat,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long = "quiet",
        short = 'q',
        conflicts_with = "verbose",
        help = "Only print repository names and errors"
    )]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(registry) = &self.registry {
            ValidationErrorHandler::validate_registry_url(registry)?;
        }
        ValidationErrorHandler::validate_credentials(&self.username, &self.password)?;
        ValidationErrorHandler::validate_timeout(self.timeout)?;

        if self.page_size == Some(0) {
            return Err(RegistryError::Validation(
                "Page size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "registry-catalog",
            "-r",
            "https://harbor.example.com",
            "-u",
            "admin",
            "-p",
            "secret",
            "--page-size",
            "50",
            "--project-fallback",
            "-o",
            "json",
        ])
        .unwrap();

        assert_eq!(args.registry.as_deref(), Some("https://harbor.example.com"));
        assert_eq!(args.page_size, Some(50));
        assert!(args.project_fallback);
        assert!(!args.no_namespaced_fallback);
        assert_eq!(args.output, OutputFormat::Json);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let args = Args::try_parse_from(["registry-catalog", "--page-size", "0"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["registry-catalog", "-q", "-v"]).is_err());
    }
}
