//! Error types and handlers for registry discovery

pub mod handlers;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Network related errors
    #[error("Network error: {0}")]
    Network(String),
    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
    /// Registry answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        body: String,
    },
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// HTTP status carried by the error, if the registry answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RegistryError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 401 Unauthorized is the only status that moves discovery to the next dialect
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Network(err.to_string())
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(code: u16) -> RegistryError {
        RegistryError::HttpStatus {
            status: StatusCode::from_u16(code).unwrap(),
            url: "https://registry.example.com/v2/_catalog".to_string(),
            body: String::new(),
        }
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(status_error(401).is_unauthorized());
        assert!(!status_error(403).is_unauthorized());
        assert!(!status_error(404).is_unauthorized());
        assert!(!RegistryError::Network("connection refused".to_string()).is_unauthorized());
    }

    #[test]
    fn test_status_is_exposed() {
        assert_eq!(status_error(404).status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(RegistryError::Parse("eof".to_string()).status(), None);
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: RegistryError = serde_json::from_str::<Vec<String>>("{").unwrap_err().into();
        assert!(matches!(err, RegistryError::Parse(_)));
    }
}
