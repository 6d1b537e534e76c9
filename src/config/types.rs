use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PurinaError;

pub const DEFAULT_ENDPOINT: &str = "https://profiles.purina.com";
pub const DEFAULT_CACHE_DIR: &str = "./cache/";

/// Settings the client is built from. Immutable once handed to the client.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            endpoint: None,
            cache_dir: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_CACHE_DIR))
    }

    /// Both credentials must be present before anything else happens.
    pub fn validate(&self) -> Result<(), PurinaError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PurinaError::Configuration("Missing credentials".to_string()));
        }
        Ok(())
    }
}

/// On-disk configuration file. Every field is optional so files can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurinaConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl PurinaConfig {
    /// Fill fields that are still unset from `other`. Values already present win.
    pub fn merge(&mut self, other: PurinaConfig) {
        if self.client_id.is_none() {
            self.client_id = other.client_id;
        }
        if self.client_secret.is_none() {
            self.client_secret = other.client_secret;
        }
        if self.endpoint.is_none() {
            self.endpoint = other.endpoint;
        }
        if self.cache_dir.is_none() {
            self.cache_dir = other.cache_dir;
        }
    }

    /// Missing credentials become empty strings and are rejected by
    /// `ClientConfig::validate`.
    pub fn into_client_config(self) -> ClientConfig {
        ClientConfig {
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret.unwrap_or_default(),
            endpoint: self.endpoint,
            cache_dir: self.cache_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = ClientConfig::new("id_1", "secret");
        assert_eq!(cfg.endpoint(), "https://profiles.purina.com");
        assert_eq!(cfg.cache_dir(), Path::new("./cache/"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = ClientConfig::new("id_1", "secret")
            .with_endpoint("https://staging.example.com")
            .with_cache_dir("/var/cache/purina");
        assert_eq!(cfg.endpoint(), "https://staging.example.com");
        assert_eq!(cfg.cache_dir(), Path::new("/var/cache/purina"));
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        for cfg in [
            ClientConfig::new("", "secret"),
            ClientConfig::new("id", ""),
            ClientConfig::default(),
        ] {
            let err = cfg.validate().unwrap_err();
            assert_eq!(err.to_string(), "Configuration error: Missing credentials");
        }
        assert!(ClientConfig::new("id", "secret").validate().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = ClientConfig::new("id_1", "hunter2");
        let dbg = format!("{cfg:?}");
        assert!(dbg.contains("id_1"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn deserialize_file_config() {
        let json = r#"{
            "clientId": "acme_123",
            "clientSecret": "s3cret",
            "endpoint": "https://staging.example.com",
            "cacheDir": "/tmp/tokens"
        }"#;
        let cfg: PurinaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.client_id.as_deref(), Some("acme_123"));
        assert_eq!(cfg.client_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.endpoint.as_deref(), Some("https://staging.example.com"));
        assert_eq!(cfg.cache_dir, Some(PathBuf::from("/tmp/tokens")));
    }

    #[test]
    fn deserialize_minimal_file_config() {
        let cfg: PurinaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, PurinaConfig::default());
    }

    #[test]
    fn merge_keeps_existing_values() {
        let mut target = PurinaConfig {
            client_id: Some("first".into()),
            ..Default::default()
        };
        target.merge(PurinaConfig {
            client_id: Some("second".into()),
            client_secret: Some("secret".into()),
            endpoint: None,
            cache_dir: Some(PathBuf::from("/c")),
        });
        assert_eq!(target.client_id.as_deref(), Some("first"));
        assert_eq!(target.client_secret.as_deref(), Some("secret"));
        assert!(target.endpoint.is_none());
        assert_eq!(target.cache_dir, Some(PathBuf::from("/c")));
    }

    #[test]
    fn into_client_config_with_missing_credentials_fails_validation() {
        let cfg = PurinaConfig {
            client_id: Some("acme_1".into()),
            ..Default::default()
        }
        .into_client_config();
        assert_eq!(cfg.client_id, "acme_1");
        assert!(cfg.client_secret.is_empty());
        assert!(cfg.validate().is_err());
    }
}
