//! Parsed HTTP responses.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::data::Data;
use super::error::HttpError;

/// A fully read response.
///
/// Header names are lower-case. A header sent several times is stored once
/// with its values joined by `;`. A cookie set several times keeps the last value.
#[derive(Debug, Default)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub cookies: Data,
    pub headers: Data,
    /// The `Content-Type` the request was actually sent with (empty if none).
    pub content_type: String,
}

impl Response {
    /// Reads the whole body and extracts cookies and headers.
    pub async fn from_reqwest(
        response: reqwest::Response,
        content_type: String,
    ) -> Result<Self, HttpError> {
        let status = response.status();

        let mut cookies = Data::new();
        for cookie in response.cookies() {
            cookies.insert(cookie.name(), cookie.value());
        }

        let mut headers = Data::new();
        for name in response.headers().keys() {
            let joined = response
                .headers()
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(";");
            headers.insert(name.as_str(), joined);
        }

        let body = response.bytes().await.map_err(HttpError::Read)?.to_vec();

        Ok(Self {
            status,
            body,
            cookies,
            headers,
            content_type,
        })
    }

    /// Looks a header up by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    /// The body decoded as UTF-8; invalid sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Job {
        id: u32,
        name: String,
    }

    #[test]
    fn test_text_empty_body() {
        assert_eq!(Response::default().text(), "");
    }

    #[test]
    fn test_text_utf8_body() {
        let response = Response {
            body: "héllo".as_bytes().to_vec(),
            ..Default::default()
        };
        assert_eq!(response.text(), "héllo");
    }

    #[test]
    fn test_json_success() {
        let response = Response {
            body: br#"{"id": 2, "name": "build"}"#.to_vec(),
            ..Default::default()
        };
        let job: Job = response.json().unwrap();
        assert_eq!(
            job,
            Job {
                id: 2,
                name: "build".to_string()
            }
        );
    }

    #[test]
    fn test_json_malformed() {
        let response = Response {
            body: b"{\"id\": ".to_vec(),
            ..Default::default()
        };
        let result: Result<Job, HttpError> = response.json();
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }

    #[test]
    fn test_json_incompatible_shape() {
        let response = Response {
            body: br#"["not", "an", "object"]"#.to_vec(),
            ..Default::default()
        };
        let result: Result<Job, HttpError> = response.json();
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }

    #[test]
    fn test_json_empty_body_is_decode_error() {
        let result: Result<serde_json::Value, HttpError> = Response::default().json();
        assert!(matches!(result, Err(HttpError::Decode(_))));
    }

    #[tokio::test]
    async fn test_from_reqwest_collects_headers_and_cookies() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(201)
            .with_header("x-multi", "one")
            .with_header("x-multi", "two")
            .with_header("set-cookie", "session=abc; Path=/")
            .with_header("set-cookie", "theme=dark")
            .with_header("set-cookie", "session=xyz")
            .with_body("created")
            .create_async()
            .await;

        let raw = reqwest::Client::new()
            .get(server.url())
            .send()
            .await
            .unwrap();
        let response = Response::from_reqwest(raw, "text/plain".to_string())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.text(), "created");
        assert_eq!(response.headers.get("x-multi"), Some("one;two"));
        assert_eq!(response.header("X-Multi"), Some("one;two"));
        assert_eq!(response.cookies.get("session"), Some("xyz"));
        assert_eq!(response.cookies.get("theme"), Some("dark"));
        assert_eq!(response.cookies.len(), 2);
        assert_eq!(response.content_type, "text/plain");
    }
}
