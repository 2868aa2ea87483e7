//! Standardized error handling patterns to eliminate duplication

use crate::error::{RegistryError, Result};
use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Build the status error for a non-2xx listing response
    pub fn status_error(status: StatusCode, url: &str, error_text: &str) -> RegistryError {
        let body = match status.as_u16() {
            401 => format!("authentication required: {}", error_text.trim()),
            403 => format!("insufficient permissions: {}", error_text.trim()),
            404 => format!("listing endpoint not found: {}", error_text.trim()),
            429 => format!("rate limited: {}", error_text.trim()),
            502 | 503 => format!("registry unavailable: {}", error_text.trim()),
            _ => error_text.trim().to_string(),
        };

        RegistryError::HttpStatus {
            status,
            url: url.to_string(),
            body,
        }
    }
}

/// Network error categorization and handling
pub struct NetworkErrorHandler;

impl NetworkErrorHandler {
    /// Categorize and format network errors with helpful context
    pub fn handle_network_error(error: &reqwest::Error, context: &str) -> RegistryError {
        if error.is_timeout() {
            RegistryError::Network(format!("{} timeout: {}", context, error))
        } else if error.is_connect() {
            RegistryError::Network(format!("Connection error during {}: {}", context, error))
        } else if error.to_string().contains("dns") {
            RegistryError::Network(format!("DNS resolution error for {}: {}", context, error))
        } else if error.to_string().contains("certificate") {
            RegistryError::Network(format!(
                "TLS certificate error during {}: {}",
                context, error
            ))
        } else {
            RegistryError::Network(format!("{} network error: {}", context, error))
        }
    }
}

/// Validation error utilities
pub struct ValidationErrorHandler;

impl ValidationErrorHandler {
    /// Standard URL validation
    pub fn validate_registry_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(RegistryError::Validation(
                "Registry URL cannot be empty".to_string(),
            ));
        }

        if !url.contains("://") {
            return Err(RegistryError::Validation(
                "Registry URL must include protocol (http:// or https://)".to_string(),
            ));
        }

        url::Url::parse(url)?;
        Ok(())
    }

    /// Standard credential validation
    pub fn validate_credentials(
        username: &Option<String>,
        password: &Option<String>,
    ) -> Result<()> {
        match (username, password) {
            (Some(_), None) => Err(RegistryError::Validation(
                "Password is required when username is provided".to_string(),
            )),
            (None, Some(_)) => Err(RegistryError::Validation(
                "Username is required when password is provided".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Standard numeric range validation
    pub fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(RegistryError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if timeout > 86400 {
            return Err(RegistryError::Validation(
                "Timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_registry_url() {
        assert!(ValidationErrorHandler::validate_registry_url("https://registry.example.com").is_ok());
        assert!(ValidationErrorHandler::validate_registry_url("").is_err());
        assert!(ValidationErrorHandler::validate_registry_url("registry.example.com").is_err());
    }

    #[test]
    fn test_validate_credentials() {
        let some = Some("x".to_string());
        assert!(ValidationErrorHandler::validate_credentials(&some, &some).is_ok());
        assert!(ValidationErrorHandler::validate_credentials(&None, &None).is_ok());
        assert!(ValidationErrorHandler::validate_credentials(&some, &None).is_err());
        assert!(ValidationErrorHandler::validate_credentials(&None, &some).is_err());
    }

    #[test]
    fn test_status_error_keeps_status() {
        let err = HttpErrorHandler::status_error(StatusCode::UNAUTHORIZED, "https://r/v2/_catalog", "denied\n");
        assert!(err.is_unauthorized());
        assert!(err.to_string().contains("authentication required: denied"));
    }
}
