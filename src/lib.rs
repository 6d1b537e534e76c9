pub mod args;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod transport;
pub mod transports;

pub use client::ApiClient;
pub use config::{load_config, ClientConfig, PurinaConfig};
pub use error::PurinaError;
pub use oauth::{cache_key, Credential, FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiRequest, HttpTransport, Method, RequestOptions};
pub use transports::ReqwestTransport;

/// One-shot convenience function: authenticate, issue a GET, return the body.
pub async fn get_once(
    config: ClientConfig,
    uri: &str,
    params: &[(&str, &str)],
) -> Result<serde_json::Value, PurinaError> {
    let client = ApiClient::connect(config).await?;
    client.get(uri, params, &RequestOptions::default()).await
}
