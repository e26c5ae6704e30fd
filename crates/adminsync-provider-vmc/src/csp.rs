//! Session provider backed by the cloud services platform
//!
//! Both steps are fatal on failure: any transport error, non-success status
//! or missing field comes back as [`Error::Session`].

use adminsync_core::config::ApiConfig;
use adminsync_core::{Error, Result, SessionProvider, SessionToken};
use async_trait::async_trait;
use serde::Deserialize;

use crate::{AUTH_HEADER, http_client};

/// Path of the refresh-token exchange, relative to the auth base URL
const AUTHORIZE_PATH: &str = "/csp/gateway/am/api/auth/api-tokens/authorize";

#[derive(Deserialize)]
struct AuthorizeResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct DatacenterResponse {
    resource_config: Option<ResourceConfig>,
}

#[derive(Deserialize)]
struct ResourceConfig {
    nsx_api_public_endpoint_url: Option<String>,
}

/// Refresh-token exchange plus data-center endpoint discovery
#[derive(Debug)]
pub struct CspSessionProvider {
    /// Authentication service base URL
    auth_url: String,

    /// Management API base URL
    management_url: String,

    client: reqwest::Client,
}

impl CspSessionProvider {
    pub fn new(auth_url: impl Into<String>, management_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            auth_url: trim_base(auth_url.into()),
            management_url: trim_base(management_url.into()),
            client: http_client()?,
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(&api.auth_url, &api.management_url)
    }
}

#[async_trait]
impl SessionProvider for CspSessionProvider {
    /// Exchange the refresh token for a session token
    ///
    /// ```http
    /// POST /csp/gateway/am/api/auth/api-tokens/authorize
    /// Content-Type: application/x-www-form-urlencoded
    ///
    /// api_token=<refresh token>
    /// ```
    async fn authenticate(&self, refresh_token: &str) -> Result<SessionToken> {
        let url = format!("{}{}", self.auth_url, AUTHORIZE_PATH);
        tracing::debug!("Exchanging refresh token at {}", url);

        let response = self
            .client
            .post(&url)
            .form(&[("api_token", refresh_token)])
            .send()
            .await
            .map_err(|e| Error::session(format!("Credential exchange request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::session(match status.as_u16() {
                400 | 401 | 403 => format!(
                    "Credential exchange rejected: invalid or expired refresh token. Status: {}",
                    status
                ),
                _ => format!("Credential exchange failed. Status: {}", status),
            }));
        }

        let body: AuthorizeResponse = response
            .json()
            .await
            .map_err(|e| Error::session(format!("Failed to parse authorize response: {}", e)))?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(SessionToken::new(token)),
            _ => Err(Error::session(
                "Authorize response did not contain an access_token",
            )),
        }
    }

    /// Look up the data center and return its public policy endpoint
    ///
    /// ```http
    /// GET /vmc/api/orgs/:org/sddcs/:sddc
    /// csp-auth-token: <session token>
    /// ```
    async fn resolve_endpoint(
        &self,
        org_id: &str,
        datacenter_id: &str,
        token: &SessionToken,
    ) -> Result<String> {
        let url = format!(
            "{}/vmc/api/orgs/{}/sddcs/{}",
            self.management_url, org_id, datacenter_id
        );

        let response = self
            .client
            .get(&url)
            .header(AUTH_HEADER, token.expose())
            .send()
            .await
            .map_err(|e| Error::session(format!("Data center lookup failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::session(match status.as_u16() {
                401 | 403 => format!(
                    "Data center lookup not authorized for org {}. Status: {}",
                    org_id, status
                ),
                404 => format!(
                    "Data center {} not found in org {}",
                    datacenter_id, org_id
                ),
                _ => format!("Data center lookup failed. Status: {}", status),
            }));
        }

        let body: DatacenterResponse = response
            .json()
            .await
            .map_err(|e| Error::session(format!("Failed to parse data center response: {}", e)))?;

        body.resource_config
            .and_then(|config| config.nsx_api_public_endpoint_url)
            .filter(|endpoint| !endpoint.is_empty())
            .ok_or_else(|| {
                Error::session(
                    "Data center response did not contain resource_config.nsx_api_public_endpoint_url",
                )
            })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
