use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::PurinaError;
use crate::transport::{ApiRequest, HttpTransport, Method};

/// `reqwest`-backed transport rooted at the API endpoint.
///
/// Request paths are joined onto the endpoint URL, so an absolute path such as
/// `/service/api/v2/users` replaces whatever path the endpoint carries.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    pub fn new(endpoint: &str) -> Result<Self, PurinaError> {
        let base_url = reqwest::Url::parse(endpoint).map_err(|e| {
            PurinaError::Configuration(format!("Invalid endpoint '{endpoint}': {e}"))
        })?;

        match base_url.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(PurinaError::Configuration(format!(
                    "Unsupported URL scheme '{scheme}' in '{endpoint}'"
                )));
            }
        }

        let mut header_map = HeaderMap::new();
        header_map.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(header_map)
            .build()
            .map_err(|e| PurinaError::Transport(Box::new(e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn build_url(&self, request: &ApiRequest) -> Result<reqwest::Url, PurinaError> {
        let mut url = self.base_url.join(&request.path).map_err(|e| {
            PurinaError::Configuration(format!("Invalid request path '{}': {e}", request.path))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        Ok(url)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<String, PurinaError> {
        let url = self.build_url(&request)?;
        let mut http_req = self.client.request(to_reqwest_method(request.method), url);

        for (key, value) in &request.options.headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                PurinaError::Configuration(format!("Invalid header name '{key}': {e}"))
            })?;
            let val = HeaderValue::from_str(value).map_err(|e| {
                PurinaError::Configuration(format!("Invalid header value for '{key}': {e}"))
            })?;
            http_req = http_req.header(name, val);
        }
        if let Some(timeout) = request.options.timeout {
            http_req = http_req.timeout(timeout);
        }
        if let Some(ref body) = request.body {
            http_req = http_req.json(body);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| PurinaError::Transport(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), path = %request.path, "API returned error status");
            return Err(PurinaError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| PurinaError::Transport(Box::new(e)))
    }
}
