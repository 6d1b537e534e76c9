pub mod http_mock;

use std::path::Path;

use purina_client::{cache_key, ClientConfig, Credential, FileTokenStore, TokenStore};

pub const CLIENT_ID: &str = "acme_test_1234";
pub const CLIENT_SECRET: &str = "s3cret";

/// Client config pointed at a mock server and a scratch cache directory.
#[allow(dead_code)]
pub fn client_config(endpoint: &str, cache_dir: &Path) -> ClientConfig {
    ClientConfig::new(CLIENT_ID, CLIENT_SECRET)
        .with_endpoint(endpoint)
        .with_cache_dir(cache_dir)
}

/// Seed the cache directory with a token expiring `secs_from_now` seconds from now.
#[allow(dead_code)]
pub fn seed_cache(cache_dir: &Path, token: &str, secs_from_now: i64) {
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(secs_from_now);
    FileTokenStore::new(cache_dir)
        .store(&cache_key(CLIENT_ID), &Credential::new(token, expires_at))
        .unwrap();
}

/// Read back what is cached for the test client, if anything.
#[allow(dead_code)]
pub fn cached(cache_dir: &Path) -> Option<Credential> {
    FileTokenStore::new(cache_dir).load(&cache_key(CLIENT_ID))
}
