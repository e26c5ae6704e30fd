// # HTTP Address Source
//
// This crate provides an HTTP-based address source for adminsync.
//
// ## Purpose
//
// Asks a public echo service (e.g. api.ipify.org) which IPv4 address the
// client's requests arrive from. The service answers with the bare address
// as a plain-text body.
//
// ## Failure Handling
//
// - Unreachable service or unreadable body: `Err`, fatal for the current pass
// - Anything that is not an IPv4 address: the empty record, never an error

use adminsync_core::{AddressRecord, AddressSource, Error, Result};

use std::time::Duration;

/// Request timeout for the echo service
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP echo-service address source
pub struct HttpAddressSource {
    /// URL returning the caller's address as plain text
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a new HTTP address source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "https://api.ipify.org")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(url, client))
    }

    /// Create with a caller-supplied client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn current(&self) -> Result<AddressRecord> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::address_source(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Address service {} answered with HTTP {}", self.url, status);
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::address_source(format!("Failed to read response: {}", e)))?;

        let record = AddressRecord::parse(&body);
        if !record.is_valid() {
            tracing::debug!("Address service body is not an IPv4 address: {:?}", body.trim());
        }

        Ok(record)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
