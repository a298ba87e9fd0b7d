use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Network(reqwest::Error),
    Json(serde_json::Error),
    /// Non-success response; `detail` is what the user gets to see.
    Api { status: u16, detail: String },
    Unauthorized(String),
    Validation(String),
    Session(String),
    Config(String),
    Io(std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Network(e) => write!(f, "Network error: {}", e),
            ClientError::Json(e) => write!(f, "JSON parsing error: {}", e),
            ClientError::Api { detail, .. } => write!(f, "{}", detail),
            ClientError::Unauthorized(e) => write!(f, "Session rejected: {}", e),
            ClientError::Validation(e) => write!(f, "{}", e),
            ClientError::Session(e) => write!(f, "Session error: {}", e),
            ClientError::Config(e) => write!(f, "Configuration error: {}", e),
            ClientError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Network(e) => Some(e),
            ClientError::Json(e) => Some(e),
            ClientError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Json(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_shows_detail_only() {
        let err = ClientError::Api {
            status: 404,
            detail: "Story not found".to_string(),
        };
        assert_eq!(err.to_string(), "Story not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ClientError = io.into();
        assert!(matches!(err, ClientError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.status(), None);
    }
}
