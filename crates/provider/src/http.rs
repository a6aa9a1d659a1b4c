//! Shared HTTP transport for JSON-over-HTTP backends.
//!
//! `HttpTransport` wraps a `reqwest::Client` with pre-built headers, a base
//! URL, and the configured deadlines. It provides `get_json`/`post_json`
//! for single-shot calls and `stream_ndjson` for newline-delimited JSON
//! streaming, decoding one value per line.

use anyhow::anyhow;
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use llm::{ChatError, Result};
use reqwest::{
    Client, Method,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// HTTP transport with a fixed base URL and per-call deadlines.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    timeout: Duration,
    idle_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport without authentication headers.
    pub fn new(client: Client, base_url: &str, timeout: Duration, idle_timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            client,
            headers,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
            idle_timeout,
        }
    }

    /// The base URL this transport targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request and deserialize the response as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self
            .client
            .request(Method::GET, format!("{}{path}", self.base_url))
            .headers(self.headers.clone())
            .timeout(self.timeout);
        Self::read_json(request).await
    }

    /// Send a POST request with a JSON body and deserialize the response.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T> {
        let request = self
            .client
            .request(Method::POST, format!("{}{path}", self.base_url))
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .json(body);
        Self::read_json(request).await
    }

    async fn read_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(ChatError::provider)?;
        let status = response.status();
        let text = response.text().await.map_err(ChatError::provider)?;
        if !status.is_success() {
            return Err(ChatError::provider(anyhow!("{status}: {text}")));
        }
        tracing::trace!("response: {text}");
        serde_json::from_str(&text)
            .map_err(|e| ChatError::provider(anyhow!("invalid response body: {e}")))
    }

    /// POST a JSON body and decode the newline-delimited JSON response,
    /// one `T` per line.
    ///
    /// Each line is yielded before the next network read is issued. A line
    /// that fails to decode is logged and skipped; the stream only fails on
    /// transport errors or when no data arrives within the idle deadline.
    /// Dropping the stream drops the response body and closes the
    /// connection.
    pub fn stream_ndjson<T>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> impl Stream<Item = Result<T>> + Send
    where
        T: DeserializeOwned + Send + 'static,
    {
        // No overall deadline on streaming calls, only the per-read idle
        // timeout below.
        let request = self
            .client
            .request(Method::POST, format!("{}{path}", self.base_url))
            .headers(self.headers.clone())
            .json(body);
        let idle_timeout = self.idle_timeout;

        try_stream! {
            let response = request
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .map_err(ChatError::provider)?;

            let mut stream = response.bytes_stream();
            let mut buf = String::new();
            loop {
                let next = tokio::time::timeout(idle_timeout, stream.next())
                    .await
                    .map_err(|_| {
                        ChatError::provider(anyhow!(
                            "no stream data within {}s",
                            idle_timeout.as_secs()
                        ))
                    })?;
                let Some(bytes) = next else { break };
                let bytes = bytes.map_err(ChatError::provider)?;
                buf.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buf.find('\n') {
                    let line: String = buf.drain(..=pos).collect();
                    if let Some(value) = decode_line::<T>(line.trim()) {
                        yield value;
                    }
                }
            }

            // A final line without a trailing newline still counts.
            let tail = std::mem::take(&mut buf);
            if let Some(value) = decode_line::<T>(tail.trim()) {
                yield value;
            }
        }
    }
}

/// Decode one NDJSON line, skipping blanks and logging malformed payloads.
fn decode_line<T: DeserializeOwned>(line: &str) -> Option<T> {
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(value) => Some(value),
        Err(e) => {
            let err = ChatError::StreamDecode(format!("{e}: {line}"));
            tracing::warn!("skipping malformed stream unit: {err}");
            None
        }
    }
}
