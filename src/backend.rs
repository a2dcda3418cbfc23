use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::request::ScanRequest;

/// Default base address of the scanning service.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Raw answer from the scanning service: status code plus the unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raised when no reply was obtained at all (refused, unreachable, timed out, body cut off).
#[derive(Debug)]
pub struct TransportFailure(pub anyhow::Error);

/// Something that can carry one scan request to a scanning service.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    async fn dispatch(&self, request: &ScanRequest) -> Result<BackendReply, TransportFailure>;
}

/// `POST {base}/scan` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    scan_url: String,
}

impl HttpBackend {
    /// `timeout` is the only time limit applied to a scan; there are no retries.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("netscan-console/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            scan_url: format!("{}/scan", base_url.trim_end_matches('/')),
        })
    }

    pub fn scan_url(&self) -> &str {
        &self.scan_url
    }
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn dispatch(&self, request: &ScanRequest) -> Result<BackendReply, TransportFailure> {
        tracing::debug!(url = %self.scan_url, host = %request.target, scan_type = %request.scan_type, "dispatching scan");

        let response = self
            .client
            .post(&self.scan_url)
            .json(request)
            .send()
            .await
            .context("scan request was not answered")
            .map_err(TransportFailure)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .context("failed to read scan response body")
            .map_err(TransportFailure)?;

        tracing::debug!(status, bytes = body.len(), "scan response received");
        Ok(BackendReply { status, body })
    }
}
