use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PurinaError;
use crate::transport::{ApiRequest, HttpTransport, Method};

pub const OAUTH_PATH: &str = "/service/oauth/v2/token";

/// Seconds before the real expiry at which a token stops being handed out.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// An access token together with its absolute expiry.
///
/// Serialized as the on-disk cache record. The `expires_in` field name is kept
/// for compatibility with existing cache files even though it holds an
/// absolute unix timestamp rather than a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(rename = "expires_in", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential, truncating the expiry to whole seconds.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        let expires_at = DateTime::from_timestamp(expires_at.timestamp(), 0).unwrap_or(expires_at);
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Build a credential from a relative lifetime measured from `issued_at`.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        expires_in: i64,
        issued_at: DateTime<Utc>,
    ) -> Option<Self> {
        let secs = issued_at.timestamp().checked_add(expires_in)?;
        let expires_at = DateTime::from_timestamp(secs, 0)?;
        Some(Self {
            access_token: access_token.into(),
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.timestamp() - SAFETY_MARGIN_SECS <= now.timestamp()
    }
}

/// Run the client-credentials handshake against the token endpoint.
pub async fn request_token(
    transport: &dyn HttpTransport,
    client_id: &str,
    client_secret: &str,
) -> Result<Credential, PurinaError> {
    let mut request = ApiRequest::new(Method::Get, OAUTH_PATH);
    request.query = vec![
        ("client_id".to_string(), client_id.to_string()),
        ("client_secret".to_string(), client_secret.to_string()),
        ("grant_type".to_string(), "client_credentials".to_string()),
    ];

    tracing::debug!(path = OAUTH_PATH, "requesting access token");
    let body = transport
        .send(request)
        .await
        .map_err(|e| PurinaError::Authentication(format!("Token request failed: {e}")))?;

    parse_token_response(&body, Utc::now())
}

/// Turn a token endpoint response body into a credential issued at `now`.
pub fn parse_token_response(body: &str, now: DateTime<Utc>) -> Result<Credential, PurinaError> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        PurinaError::Authentication(format!("Failed to parse token response: {e}"))
    })?;

    let access_token = json
        .get("access_token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.is_empty());
    let expires_in = json.get("expires_in").and_then(lifetime_secs);

    let (Some(access_token), Some(expires_in)) = (access_token, expires_in) else {
        return Err(PurinaError::Authentication("missing access token".to_string()));
    };

    Credential::from_expires_in(access_token, expires_in, now).ok_or_else(|| {
        PurinaError::Authentication(format!("expires_in {expires_in} is out of range"))
    })
}

fn lifetime_secs(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn serializes_as_cache_record() {
        let credential = Credential::new("abc", at(1_700_000_000));
        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"access_token": "abc", "expires_in": 1_700_000_000})
        );
    }

    #[test]
    fn deserializes_cache_record() {
        let credential: Credential =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":1700000000}"#).unwrap();
        assert_eq!(credential.access_token, "abc");
        assert_eq!(credential.expires_at, at(1_700_000_000));
    }

    #[test]
    fn new_truncates_subsecond_precision() {
        let precise = at(1_700_000_000) + chrono::Duration::milliseconds(750);
        let credential = Credential::new("abc", precise);
        assert_eq!(credential.expires_at, at(1_700_000_000));
    }

    #[test]
    fn expiry_is_issue_time_plus_lifetime() {
        let credential = Credential::from_expires_in("abc", 3600, at(1_000)).unwrap();
        assert_eq!(credential.expires_at, at(4_600));
    }

    #[test]
    fn expiry_boundary_uses_sixty_second_margin() {
        let now = at(1_000_000);
        let almost = Credential::new("a", at(1_000_059));
        let exact = Credential::new("a", at(1_000_060));
        let fresh = Credential::new("a", at(1_000_061));
        assert!(almost.is_expired_at(now));
        assert!(exact.is_expired_at(now));
        assert!(!fresh.is_expired_at(now));
    }

    #[test]
    fn past_expiry_is_expired() {
        let credential = Credential::new("a", Utc::now() - chrono::Duration::hours(1));
        assert!(credential.is_expired());
    }

    #[test]
    fn far_future_expiry_is_fresh() {
        let credential = Credential::new("a", Utc::now() + chrono::Duration::hours(1));
        assert!(!credential.is_expired());
    }

    #[test]
    fn parse_integer_lifetime() {
        let credential =
            parse_token_response(r#"{"access_token":"tok","expires_in":3600}"#, at(100)).unwrap();
        assert_eq!(credential.access_token, "tok");
        assert_eq!(credential.expires_at, at(3_700));
    }

    #[test]
    fn parse_string_and_float_lifetimes() {
        let credential =
            parse_token_response(r#"{"access_token":"tok","expires_in":"120"}"#, at(0)).unwrap();
        assert_eq!(credential.expires_at, at(120));

        let credential =
            parse_token_response(r#"{"access_token":"tok","expires_in":90.9}"#, at(0)).unwrap();
        assert_eq!(credential.expires_at, at(90));
    }

    #[test]
    fn parse_missing_fields_is_auth_error() {
        for body in [
            r#"{"expires_in":3600}"#,
            r#"{"access_token":"tok"}"#,
            r#"{"access_token":"","expires_in":3600}"#,
            r#"{"access_token":null,"expires_in":3600}"#,
            r#"{"access_token":"tok","expires_in":"soon"}"#,
        ] {
            let err = parse_token_response(body, at(0)).unwrap_err();
            assert!(
                matches!(err, PurinaError::Authentication(ref m) if m == "missing access token"),
                "body {body} gave {err:?}"
            );
        }
    }

    #[test]
    fn parse_invalid_json_is_auth_error() {
        let err = parse_token_response("<html>oops</html>", at(0)).unwrap_err();
        assert!(matches!(err, PurinaError::Authentication(_)));
        assert!(err.to_string().contains("Failed to parse token response"));
    }

    #[test]
    fn parse_overflowing_lifetime_is_auth_error() {
        let body = format!(r#"{{"access_token":"tok","expires_in":{}}}"#, i64::MAX);
        let err = parse_token_response(&body, at(10)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
