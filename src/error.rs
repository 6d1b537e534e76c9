use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PurinaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Error in config {}: {detail}", path.display())]
    ConfigFile { path: PathBuf, detail: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Cannot write token cache {location}: {detail}")]
    Storage { location: String, detail: String },

    #[error("{}", format_http(.status, .body))]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_http(status: &u16, body: &str) -> String {
    if body.is_empty() {
        format!("API returned status {status}")
    } else {
        format!("API returned status {status}: {body}")
    }
}

impl PurinaError {
    /// Error code string for structured JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            PurinaError::Configuration(_) => "config_error",
            PurinaError::ConfigFile { .. } => "config_error",
            PurinaError::Authentication(_) => "auth_error",
            PurinaError::Storage { .. } => "storage_error",
            PurinaError::Http { .. } => "http_error",
            PurinaError::Transport(_) => "transport_error",
            PurinaError::Protocol(_) => "parse_error",
            PurinaError::Io(_) => "io_error",
        }
    }

    /// HTTP status of a non-2xx API response, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match self {
            PurinaError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(status) = self.status() {
            obj.insert("status".into(), serde_json::Value::from(status));
        }
        obj.insert("message".into(), serde_json::Value::String(self.to_string()));
        obj.insert("code".into(), serde_json::Value::String(self.code().to_string()));
        serde_json::json!({ "error": obj })
    }
}
