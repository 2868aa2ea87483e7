//! Configuration module for registry credentials, listing dialects and environment overrides

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn new(username: String, password: String) -> Self {
        Self {
            username: Some(username),
            password: Some(password),
        }
    }

    /// At least one of username/password is non-empty
    pub fn has_credentials(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        filled(&self.username) || filled(&self.password)
    }
}

/// Which listing dialects discovery may fall back to after the catalog API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingConfig {
    /// DTR-style `/api/v0/repositories/` listing
    pub namespaced_fallback: bool,
    /// Harbor-style `/api/projects` + `/api/repositories` listing
    pub project_fallback: bool,
    /// Requested page size; `None` leaves it to the registry
    pub page_size: Option<u32>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            namespaced_fallback: true,
            project_fallback: false,
            page_size: None,
        }
    }
}

impl ListingConfig {
    pub fn with_namespaced_fallback(mut self, enabled: bool) -> Self {
        self.namespaced_fallback = enabled;
        self
    }

    pub fn with_project_fallback(mut self, enabled: bool) -> Self {
        self.project_fallback = enabled;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Settings read from the process environment
#[derive(Debug, Default)]
pub struct Config {
    pub registry_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub skip_tls: bool,
    pub project_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, used by `from_env` and tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| -> Result<bool> {
            match lookup(key).as_deref().map(str::trim) {
                None | Some("") => Ok(false),
                Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
                Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
                Some(v) => Err(RegistryError::Config(format!(
                    "{} must be true or false, got '{}'",
                    key, v
                ))),
            }
        };

        Ok(Config {
            registry_address: lookup("REGISTRY_ADDRESS"),
            username: lookup("REGISTRY_USERNAME"),
            password: lookup("REGISTRY_PASSWORD"),
            skip_tls: flag("SKIP_TLS")?,
            project_fallback: flag("REGISTRY_PROJECT_FALLBACK")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_has_credentials() {
        assert!(AuthConfig::new("user".into(), "pass".into()).has_credentials());
        assert!(AuthConfig { username: None, password: Some("token".into()) }.has_credentials());
        assert!(!AuthConfig { username: Some(String::new()), password: Some(String::new()) }.has_credentials());
        assert!(!AuthConfig::default().has_credentials());
    }

    #[test]
    fn test_listing_defaults() {
        let listing = ListingConfig::default();
        assert!(listing.namespaced_fallback);
        assert!(!listing.project_fallback);
        assert_eq!(listing.page_size, None);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("REGISTRY_ADDRESS", "https://harbor.example.com"),
            ("REGISTRY_USERNAME", "admin"),
            ("SKIP_TLS", "true"),
            ("REGISTRY_PROJECT_FALLBACK", "1"),
        ]))
        .unwrap();

        assert_eq!(config.registry_address.as_deref(), Some("https://harbor.example.com"));
        assert_eq!(config.username.as_deref(), Some("admin"));
        assert_eq!(config.password, None);
        assert!(config.skip_tls);
        assert!(config.project_fallback);
    }

    #[test]
    fn test_config_rejects_bad_flag() {
        let err = Config::from_lookup(lookup(&[("SKIP_TLS", "maybe")])).unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
