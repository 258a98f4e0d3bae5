//! Errors returned by [`Client::send`](super::Client::send) and [`Response::json`](super::Response::json).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be built (bad method token, unparsable URL).
    #[error("Failed to build request: {0}")]
    Construction(String),

    /// Connection refused, timeout, DNS failure and similar.
    #[error("Request failed")]
    Transport(#[source] reqwest::Error),

    /// The response arrived but its body could not be read.
    #[error("Failed to read response body")]
    Read(#[source] reqwest::Error),

    /// The response body is not valid JSON for the requested type.
    #[error("Failed to decode JSON response")]
    Decode(#[from] serde_json::Error),

    /// Parsing the response panicked; the panic was caught and converted.
    #[error("Response handling panicked: {0}")]
    Panicked(String),
}

impl HttpError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HttpError::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_error_display() {
        let err = HttpError::Construction("invalid HTTP method \"GE T\"".to_string());
        assert!(err.to_string().contains("Failed to build request"));
        assert!(err.to_string().contains("GE T"));
    }

    #[test]
    fn test_decode_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = HttpError::from(serde_err);
        assert!(matches!(err, HttpError::Decode(_)));
        assert!(err.to_string().contains("decode JSON"));
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(!HttpError::Construction("x".to_string()).is_retryable());
        assert!(!HttpError::Panicked("x".to_string()).is_retryable());
        let serde_err = serde_json::from_str::<serde_json::Value>("").unwrap_err();
        assert!(!HttpError::Decode(serde_err).is_retryable());
    }

    #[tokio::test]
    async fn test_transport_error_is_retryable() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();
        let source_message = err.to_string();
        let err = HttpError::Transport(err);
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Request failed");

        // The reqwest message lives only in the source, so an error chain
        // prints it once.
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches(source_message.as_str()).count(), 1);
    }
}
