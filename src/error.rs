use thiserror::Error;

/// Errors raised while pulling, reshaping or storing one day of data
#[derive(Error, Debug)]
pub enum PullError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not authenticated. Run: fitbit-pull --auth")]
    NotAuthenticated,

    #[error("Fetch failed: {endpoint}{} - {message}", status_suffix(.status))]
    Fetch {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Missing field in {resource} response: {path}")]
    MissingField { resource: String, path: String },

    #[error("Invalid field in {resource} response at {path}: {reason}")]
    InvalidField {
        resource: String,
        path: String,
        reason: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" returned {}", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, PullError>;

impl PullError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn missing(resource: &str, path: impl Into<String>) -> Self {
        Self::MissingField {
            resource: resource.to_string(),
            path: path.into(),
        }
    }

    pub fn invalid(resource: &str, path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            resource: resource.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub fn fetch(endpoint: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Fetch {
            endpoint: endpoint.to_string(),
            status,
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for PullError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display_with_status() {
        let err = PullError::fetch(
            "/1/user/-/sleep/date/2019-03-02.json",
            Some(503),
            "unavailable",
        );
        assert_eq!(
            err.to_string(),
            "Fetch failed: /1/user/-/sleep/date/2019-03-02.json returned 503 - unavailable"
        );
    }

    #[test]
    fn test_fetch_error_display_without_status() {
        let err = PullError::fetch("/1/user/-/profile.json", None, "connection reset");
        assert_eq!(err.to_string(), "Fetch failed: /1/user/-/profile.json - connection reset");
    }

    #[test]
    fn test_missing_field_names_resource_and_path() {
        let err = PullError::missing("steps", "/activities-steps/0/value");
        assert!(err.to_string().contains("steps"));
        assert!(err.to_string().contains("/activities-steps/0/value"));
    }

    #[test]
    fn test_not_authenticated_points_at_auth_flag() {
        assert!(PullError::NotAuthenticated.to_string().contains("--auth"));
    }
}
