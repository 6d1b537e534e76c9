pub mod cache;
pub mod token;

pub use cache::{cache_key, FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{parse_token_response, request_token, Credential, OAUTH_PATH, SAFETY_MARGIN_SECS};
