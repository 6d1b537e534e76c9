use std::path::PathBuf;

use crate::client::ApiClient;
use crate::config::{load_config, ClientConfig};
use crate::error::PurinaError;

/// Connection settings given on the command line (or via their env vars).
/// Anything set here overrides the config files.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub config_path: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub endpoint: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

/// Merge overrides on top of the discovered config files.
pub fn resolve_client_config(
    overrides: &ConnectionOverrides,
) -> Result<ClientConfig, PurinaError> {
    let mut file_config = load_config(overrides.config_path.as_deref())?;

    if overrides.client_id.is_some() {
        file_config.client_id = overrides.client_id.clone();
    }
    if overrides.client_secret.is_some() {
        file_config.client_secret = overrides.client_secret.clone();
    }
    if overrides.endpoint.is_some() {
        file_config.endpoint = overrides.endpoint.clone();
    }
    if overrides.cache_dir.is_some() {
        file_config.cache_dir = overrides.cache_dir.clone();
    }

    Ok(file_config.into_client_config())
}

pub async fn connect(overrides: &ConnectionOverrides) -> Result<ApiClient, PurinaError> {
    let config = resolve_client_config(overrides)?;
    ApiClient::connect(config).await
}
