//! Lazy, memoized access-token acquisition.

use std::time::Duration;

use shelf_protocol::endpoints;
use shelf_protocol::envelope::ApiEnvelope;
use shelf_protocol::upload::{TokenRequest, TokenResponse};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::ClientError;

/// API client credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Fetches a bearer token on first use and caches it for the rest of
/// the run. Safe to share across workers.
pub struct TokenProvider {
    credentials: Credentials,
    cached: Mutex<Option<String>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached token, fetching it once if necessary.
    pub async fn access_token(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<String, ClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let req = TokenRequest {
            client_id: self.credentials.client_id.clone(),
            client_secret: self.credentials.client_secret.clone(),
        };
        let url = format!("{}{}", base_url, endpoints::ACCESS_TOKEN);
        let envelope: ApiEnvelope = http
            .post(&url)
            .timeout(timeout)
            .json(&req)
            .send()
            .await?
            .json()
            .await?;
        let resp: TokenResponse = envelope.into_data()?;
        if resp.access_token.is_empty() {
            return Err(ClientError::EmptyToken);
        }

        debug!("access token acquired");
        *cached = Some(resp.access_token.clone());
        Ok(resp.access_token)
    }
}
