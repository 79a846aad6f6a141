//! Reqwest-backed request executor.
//!
//! Owns transport details only: authentication headers, JSON encoding,
//! status handling and error body decoding.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult, FALLBACK_ERROR_MESSAGE};

const USER_AGENT: &str = concat!("xata-rs/", env!("CARGO_PKG_VERSION"));

/// Executes authenticated JSON requests against the service.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: Client,
    api_key: String,
}

impl Fetcher {
    /// Build a fetcher with an explicit request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, api_key })
    }

    /// Send a request without a body.
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> ClientResult<T> {
        self.send::<(), T>(Method::GET, url, None).await
    }

    /// Send a request with a JSON body.
    pub async fn post<B, T>(&self, url: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(Method::POST, url, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> ClientResult<T> {
        self.send::<(), T>(Method::DELETE, url, None).await
    }

    /// Send a request and decode the JSON response.
    ///
    /// A `204 No Content` response decodes as an empty JSON object, so callers
    /// expecting no payload can ask for `serde_json::Value` or a struct whose
    /// fields all carry serde defaults.
    pub async fn send<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!(status = status.as_u16(), bytes = bytes.len(), "Received response");

        decode_response(status, &bytes)
    }
}

/// Decode a response body according to its status.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> ClientResult<T> {
    if status == StatusCode::NO_CONTENT {
        return Ok(serde_json::from_value(serde_json::Value::Object(
            serde_json::Map::new(),
        ))?);
    }

    if !status.is_success() {
        return Err(error_from_body(status, body));
    }

    Ok(serde_json::from_slice(body)?)
}

/// Map an error response to a client error, preferring the service's message.
fn error_from_body(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());

    ClientError::api(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct JobRef {
        #[serde(rename = "jobID")]
        job_id: String,
    }

    #[test]
    fn test_missing_api_key() {
        let err = Fetcher::new("  ", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
    }

    #[test]
    fn test_decode_success() {
        let job: JobRef = decode_response(StatusCode::OK, br#"{"jobID":"1234"}"#).unwrap();
        assert_eq!(job.job_id, "1234");
    }

    #[test]
    fn test_decode_no_content() {
        let value: serde_json::Value = decode_response(StatusCode::NO_CONTENT, b"").unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_error_uses_service_message() {
        let err = decode_response::<serde_json::Value>(
            StatusCode::BAD_REQUEST,
            br#"{"id":"abc","message":"invalid migration checksum"}"#,
        )
        .unwrap_err();

        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid migration checksum");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_falls_back_without_message() {
        let err = decode_response::<serde_json::Value>(StatusCode::BAD_GATEWAY, b"<html>").unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains(FALLBACK_ERROR_MESSAGE));
    }
}
