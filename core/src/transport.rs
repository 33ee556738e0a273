//! Transport seam: sends a [`PreparedRequest`] and hands back the live
//! response with its body still unread.
//!
//! # Design
//! The response body is exposed as a stream of chunks so the check stream can
//! consume it as it arrives, relying on the channel's own buffering.
//! [`ReqwestTransport`] covers both `http` and `https`.

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::content::CONTENT_TYPE;
use crate::error::TransportError;
use crate::http::PreparedRequest;

/// Body chunks of a live response.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A response whose status and headers have arrived and whose body has not
/// been read yet.
pub struct LiveResponse {
    pub status: u16,
    /// Header names are lower-case.
    pub headers: BTreeMap<String, String>,
    pub body: BodyStream,
}

impl LiveResponse {
    pub fn new<K, V>(status: u16, headers: impl IntoIterator<Item = (K, V)>, body: BodyStream) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
                .collect(),
            body,
        }
    }

    /// A response whose body is served from memory.
    pub fn from_chunks<K, V, B>(
        status: u16,
        headers: impl IntoIterator<Item = (K, V)>,
        chunks: impl IntoIterator<Item = B>,
    ) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        B: Into<Bytes>,
    {
        let chunks: Vec<Result<Bytes, TransportError>> =
            chunks.into_iter().map(|chunk| Ok(chunk.into())).collect();
        Self::new(status, headers, Box::pin(futures_util::stream::iter(chunks)))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }
}

impl fmt::Debug for LiveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Issues prepared requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<LiveResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<LiveResponse, TransportError> {
        let options = &request.options;
        let method = reqwest::Method::from_bytes(options.method.as_str().as_bytes())
            .map_err(|err| TransportError::InvalidRequest(err.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                TransportError::InvalidRequest(format!("header name `{name}`: {err}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                TransportError::InvalidRequest(format!("header value for `{name}`: {err}"))
            })?;
            headers.insert(header_name, header_value);
        }

        let url = options.url();
        let mut builder = self.client.request(method, &url).headers(headers);
        if request.content_length > 0 {
            if let Some(content) = &request.content {
                builder = builder.body(content.clone());
            }
        }

        let response = builder.send().await?;
        debug!(%url, status = response.status().as_u16(), "response received");

        let status = response.status().as_u16();
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from));

        Ok(LiveResponse::new(status, response_headers, Box::pin(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_response_yields_chunks_in_order() {
        let mut response = LiveResponse::from_chunks(
            200,
            [("Content-Type", "application/json")],
            ["{\"a\"", ":1}"],
        );
        let mut collected = Vec::new();
        while let Some(chunk) = response.body.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"{\"a\":1}");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = LiveResponse::from_chunks(204, [("X-Request-Id", "abc")], Vec::<Bytes>::new());
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert_eq!(response.header("X-REQUEST-ID"), Some("abc"));
        assert!(response.content_type().is_none());
    }
}
