use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(unused_imports)]
pub use purina_client::oauth::OAUTH_PATH;

/// Mount a token endpoint that issues `token` for the test client credentials.
/// `expected` is the exact number of handshakes the test allows.
#[allow(dead_code)]
pub async fn mount_token_endpoint(server: &MockServer, token: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(OAUTH_PATH))
        .and(query_param("client_id", super::CLIENT_ID))
        .and(query_param("client_secret", super::CLIENT_SECRET))
        .and(query_param("grant_type", "client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .expect(expected)
        .mount(server)
        .await;
}
