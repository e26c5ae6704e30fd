//! Configuration types for the sync system
//!
//! This module defines all configuration structures used throughout the crate.
//! The configuration is built once at startup and handed to the session
//! provider, group store and driver at construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::DEFAULT_STATE_FILE;
use crate::types::GatewayDomain;

/// Default IP echo service (plain-text body)
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org";

/// Default name of the managed group
pub const DEFAULT_GROUP_NAME: &str = "Allow-Admin-Access";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cloud API access
    pub api: ApiConfig,

    /// IP echo service
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Persisted address file
    #[serde(default)]
    pub state: StateStoreConfig,

    /// Managed group and gateways
    #[serde(default)]
    pub group: GroupConfig,

    /// Run behavior
    #[serde(default)]
    pub run: RunConfig,
}

impl SyncConfig {
    /// Create a configuration with defaults around the given API settings
    pub fn new(api: ApiConfig) -> Self {
        Self {
            api,
            ip_source: IpSourceConfig::default(),
            state: StateStoreConfig::default(),
            group: GroupConfig::default(),
            run: RunConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.api.validate()?;
        self.ip_source.validate()?;
        self.state.validate()?;
        self.group.validate()?;
        Ok(())
    }
}

/// Cloud API access settings
///
/// All five values are required and must be non-empty.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the management API
    pub management_url: String,

    /// Base URL of the authentication service
    pub auth_url: String,

    /// Long-lived refresh credential
    /// ⚠️ NEVER log this value
    pub refresh_token: String,

    /// Organization id
    pub org_id: String,

    /// Data center id
    pub datacenter_id: String,
}

// Custom Debug implementation that hides the refresh token
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("management_url", &self.management_url)
            .field("auth_url", &self.auth_url)
            .field("refresh_token", &"<REDACTED>")
            .field("org_id", &self.org_id)
            .field("datacenter_id", &self.datacenter_id)
            .finish()
    }
}

impl ApiConfig {
    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("management_url", &self.management_url),
            ("auth_url", &self.auth_url),
            ("refresh_token", &self.refresh_token),
            ("org_id", &self.org_id),
            ("datacenter_id", &self.datacenter_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(crate::Error::config(format!(
                "management_url, auth_url, refresh_token, org_id and datacenter_id must all be populated (missing: {})",
                missing.join(", ")
            )));
        }

        for (name, url) in [
            ("management_url", &self.management_url),
            ("auth_url", &self.auth_url),
        ] {
            if !is_http_url(url) {
                return Err(crate::Error::config(format!(
                    "{} must use HTTP or HTTPS scheme. Got: {}",
                    name, url
                )));
            }
        }

        Ok(())
    }
}

/// IP echo service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning the caller's address as plain text
    pub url: String,
}

impl IpSourceConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP source URL cannot be empty"));
        }
        if !is_http_url(&self.url) {
            return Err(crate::Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_IP_SOURCE_URL.to_string(),
        }
    }
}

/// Persisted address configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateStoreConfig {
    /// Path to the one-line address file
    pub path: String,
}

impl StateStoreConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.path.trim().is_empty() {
            return Err(crate::Error::config("State file path cannot be empty"));
        }
        Ok(())
    }
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STATE_FILE.to_string(),
        }
    }
}

/// Managed group configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Group name (also used as its id and display name on creation)
    #[serde(default = "default_group_name")]
    pub name: String,

    /// Gateway domains to reconcile, in order
    #[serde(default = "default_gateways")]
    pub gateways: Vec<GatewayDomain>,
}

impl GroupConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::config("Group name cannot be empty"));
        }
        if self.name.contains('/') {
            return Err(crate::Error::config(format!(
                "Group name cannot contain '/'. Got: {}",
                self.name
            )));
        }
        if self.gateways.is_empty() {
            return Err(crate::Error::config("At least one gateway domain is required"));
        }
        for (i, gateway) in self.gateways.iter().enumerate() {
            if self.gateways[..i].contains(gateway) {
                return Err(crate::Error::config(format!(
                    "Gateway domain {} is listed more than once",
                    gateway
                )));
            }
        }
        Ok(())
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            name: default_group_name(),
            gateways: default_gateways(),
        }
    }
}

fn default_group_name() -> String {
    DEFAULT_GROUP_NAME.to_string()
}

fn default_gateways() -> Vec<GatewayDomain> {
    GatewayDomain::ALL.to_vec()
}

/// Run behavior
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    /// Perform lookups but only log mutating calls
    #[serde(default)]
    pub dry_run: bool,

    /// Exit non-zero when any gateway domain reports a failure
    #[serde(default)]
    pub strict_exit: bool,
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
