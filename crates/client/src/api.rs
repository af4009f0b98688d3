//! The Shelf API caller.

use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shelf_protocol::envelope::{ApiEnvelope, EnvelopeError};

use crate::token::{Credentials, TokenProvider};

/// Deadline for every envelope POST (init, slice url, complete, poll,
/// token). Slice PUTs are exempt: their duration scales with the
/// slice size.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the Shelf API client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// A slice PUT came back with a non-success status.
    #[error("slice upload rejected with status {0}")]
    SliceStatus(u16),

    #[error("token endpoint returned an empty access token")]
    EmptyToken,
}

/// Authenticated caller for the Shelf open API.
///
/// One instance is shared by all upload workers; `reqwest::Client`
/// pools connections internally.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: TokenProvider,
    request_timeout: Duration,
}

impl ApiClient {
    /// Creates a client for the given base URL and credentials.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        // Fixed platform discriminator required by every endpoint.
        headers.insert("Platform", HeaderValue::from_static("open_platform"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            token: TokenProvider::new(credentials),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Shrinks the envelope-POST deadline (for testing).
    #[cfg(test)]
    pub(crate) fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Performs an authenticated JSON POST against `endpoint` and
    /// unwraps the envelope into `T`.
    ///
    /// The HTTP status is deliberately ignored: the envelope `code`
    /// is the authoritative success signal for this API.
    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self
            .token
            .access_token(&self.http, &self.base_url, self.request_timeout)
            .await?;
        let url = format!("{}{}", self.base_url, endpoint);
        let envelope: ApiEnvelope = self
            .http
            .post(&url)
            .timeout(self.request_timeout)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        Ok(envelope.into_data()?)
    }

    /// PUTs one slice body to its presigned destination.
    ///
    /// The exact length is declared up front; presigned destinations
    /// reject unknown-length transfers. No retry here; retries are
    /// applied per file by the dispatcher.
    pub async fn upload_slice(&self, url: &str, body: Vec<u8>) -> Result<(), ClientError> {
        let len = body.len() as u64;
        let resp = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::SliceStatus(status.as_u16()));
        }
        Ok(())
    }
}
