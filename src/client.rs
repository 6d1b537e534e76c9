//! Authenticated client for the profiles API.
//!
//! The client resolves an access token once, when it is built, and attaches
//! it to every call as the `access_token` query parameter. It does not
//! re-check expiry per call and does not retry: a request rejected because
//! the token lapsed mid-process surfaces as `PurinaError::Http` and the
//! caller decides whether to `authenticate()` again.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::PurinaError;
use crate::oauth::cache::{cache_key, FileTokenStore, TokenStore};
use crate::oauth::token::{request_token, Credential};
use crate::transport::{ApiRequest, HttpTransport, Method, RequestOptions};
use crate::transports::ReqwestTransport;

pub const API_PATH: &str = "/service/api/v2/";

const ACCESS_TOKEN_PARAM: &str = "access_token";

pub struct ApiClient {
    config: ClientConfig,
    transport: Box<dyn HttpTransport>,
    store: Box<dyn TokenStore>,
    cache_key: String,
    credential: Credential,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("cache_key", &self.cache_key)
            .field("expires_at", &self.credential.expires_at)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client backed by `reqwest` and a token file in the configured
    /// cache directory, authenticating before returning.
    pub async fn connect(config: ClientConfig) -> Result<Self, PurinaError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.endpoint())?;
        let store = FileTokenStore::new(config.cache_dir());
        Self::with_parts(config, Box::new(transport), Box::new(store)).await
    }

    /// Build a client over caller-supplied transport and token store.
    ///
    /// Fails with `Configuration` for missing credentials or an unwritable
    /// store, and with `Authentication` if no token can be obtained.
    pub async fn with_parts(
        config: ClientConfig,
        transport: Box<dyn HttpTransport>,
        store: Box<dyn TokenStore>,
    ) -> Result<Self, PurinaError> {
        config.validate()?;
        store.ensure_writable()?;

        let cache_key = cache_key(&config.client_id);
        let credential =
            resolve_credential(&config, transport.as_ref(), store.as_ref(), &cache_key).await?;

        Ok(Self {
            config,
            transport,
            store,
            cache_key,
            credential,
        })
    }

    /// Adopt the cached token if it is still fresh, otherwise fetch and
    /// persist a new one.
    pub async fn authenticate(&mut self) -> Result<(), PurinaError> {
        self.credential = resolve_credential(
            &self.config,
            self.transport.as_ref(),
            self.store.as_ref(),
            &self.cache_key,
        )
        .await?;
        Ok(())
    }

    /// The token currently attached to requests. Never triggers a refresh.
    pub fn access_token(&self) -> &str {
        &self.credential.access_token
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get(
        &self,
        uri: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Get, uri, None, params, options).await
    }

    pub async fn post(
        &self,
        uri: &str,
        data: &Value,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Post, uri, Some(data), params, options).await
    }

    pub async fn put(
        &self,
        uri: &str,
        data: &Value,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Put, uri, Some(data), params, options).await
    }

    pub async fn patch(
        &self,
        uri: &str,
        data: &Value,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Patch, uri, Some(data), params, options).await
    }

    pub async fn delete(
        &self,
        uri: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Delete, uri, None, params, options).await
    }

    pub async fn options(
        &self,
        uri: &str,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        self.request(Method::Options, uri, None, params, options).await
    }

    /// Issue an authenticated call and decode the response body as JSON.
    ///
    /// An empty 2xx body decodes to `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        data: Option<&Value>,
        params: &[(&str, &str)],
        options: &RequestOptions,
    ) -> Result<Value, PurinaError> {
        let mut request = ApiRequest::new(method, resolve_path(uri));
        request.query = params
            .iter()
            .filter(|(k, _)| *k != ACCESS_TOKEN_PARAM)
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        request
            .query
            .push((ACCESS_TOKEN_PARAM.to_string(), self.credential.access_token.clone()));
        request.body = data.filter(|d| !is_empty_body(d)).cloned();
        request.options = options.clone();

        tracing::debug!(method = %method, path = %request.path, "sending API request");
        let body = self.transport.send(request).await?;
        decode_body(&body)
    }
}

async fn resolve_credential(
    config: &ClientConfig,
    transport: &dyn HttpTransport,
    store: &dyn TokenStore,
    key: &str,
) -> Result<Credential, PurinaError> {
    match store.load(key) {
        Some(cached) if !cached.is_expired() => {
            tracing::debug!(key, expires_at = %cached.expires_at, "using cached access token");
            return Ok(cached);
        }
        Some(_) => tracing::debug!(key, "cached access token expired"),
        None => tracing::debug!(key, "no cached access token"),
    }

    let credential = request_token(transport, &config.client_id, &config.client_secret).await?;
    tracing::info!(key, expires_at = %credential.expires_at, "obtained new access token");

    // The token is still good for this process even if it cannot be persisted.
    if let Err(e) = store.store(key, &credential) {
        tracing::warn!(key, error = %e, "failed to persist access token");
    }
    Ok(credential)
}

/// Absolute paths are used as-is; anything else is a resource under `API_PATH`.
pub fn resolve_path(uri: &str) -> String {
    if uri.starts_with('/') {
        uri.to_string()
    } else {
        format!("{API_PATH}{uri}")
    }
}

fn is_empty_body(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn decode_body(body: &str) -> Result<Value, PurinaError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| PurinaError::Protocol(format!("Failed to parse API response: {e}")))
}
