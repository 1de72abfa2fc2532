use std::time::Duration;

use futures_util::StreamExt;
use jobdeck_core::ActionOverlay;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use url::Url;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 1024 * 1024,
        }
    }
}

/// Read-only source of the authoritative action snapshot.
#[async_trait::async_trait]
pub trait RemoteActions: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<ActionOverlay, FetchError>;
}

/// Fetches the snapshot with a single GET against `endpoint`.
#[derive(Debug, Clone)]
pub struct ReqwestRemote {
    endpoint: String,
    bearer_token: Option<String>,
    settings: FetchSettings,
}

impl ReqwestRemote {
    pub fn new(endpoint: impl Into<String>, settings: FetchSettings) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            settings,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn too_large(&self, actual: u64) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "snapshot too large",
        )
    }
}

#[async_trait::async_trait]
impl RemoteActions for ReqwestRemote {
    async fn fetch_snapshot(&self) -> Result<ActionOverlay, FetchError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client()?;

        let mut request = client.get(url.as_str()).header(ACCEPT, "application/json");
        if let Some(token) = &self.bearer_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;
        ActionOverlay::from_json(text)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
