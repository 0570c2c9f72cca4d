//! Digest-authenticated HTTP access to the alert stream endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, StatusCode};
use url::Url;

use crate::digest::DigestChallenge;
use crate::error::{Result, StreamError};
use crate::supervisor::{ChunkStream, EventSource};

/// How long to wait for the TCP/TLS handshake. The response body itself has
/// no deadline: it is expected to stay open for hours or days.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens the camera's alert stream over HTTP with Digest authentication.
///
/// The body is consumed incrementally; nothing ever buffers the full
/// response, which is unbounded by design.
pub struct StreamClient {
    http: reqwest::Client,
    url: Url,
    username: String,
    password: String,
}

impl StreamClient {
    /// Build a client for the given endpoint and credentials.
    pub fn new(
        url: Url,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            url,
            username: username.into(),
            password: password.into(),
        })
    }

    /// The request-URI hashed into the Digest response: path plus query.
    fn request_uri(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }
}

#[async_trait]
impl EventSource for StreamClient {
    async fn connect(&self) -> Result<ChunkStream> {
        let first = self.http.get(self.url.clone()).send().await?;

        let response = if first.status() == StatusCode::UNAUTHORIZED {
            let header_value = first
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    StreamError::Challenge("401 without a WWW-Authenticate header".to_string())
                })?;
            let challenge = DigestChallenge::parse(header_value)?;
            let authorization =
                challenge.respond(&self.username, &self.password, "GET", &self.request_uri());

            self.http
                .get(self.url.clone())
                .header(header::AUTHORIZATION, authorization)
                .send()
                .await?
        } else {
            first
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StreamError::Status(status.as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map_err(StreamError::from)
            .boxed())
    }
}
