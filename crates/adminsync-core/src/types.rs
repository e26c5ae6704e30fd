//! Domain types shared by the reconciler and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Firewall context within a data center
///
/// Rendered on the wire as `mgw` (management gateway) or `cgw` (compute gateway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayDomain {
    #[serde(rename = "mgw")]
    Management,
    #[serde(rename = "cgw")]
    Compute,
}

impl GatewayDomain {
    /// Fixed driver order
    pub const ALL: [GatewayDomain; 2] = [GatewayDomain::Management, GatewayDomain::Compute];

    /// Path segment used by the policy API
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayDomain::Management => "mgw",
            GatewayDomain::Compute => "cgw",
        }
    }
}

impl fmt::Display for GatewayDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayDomain {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mgw" => Ok(GatewayDomain::Management),
            "cgw" => Ok(GatewayDomain::Compute),
            other => Err(crate::Error::config(format!(
                "Unknown gateway domain '{}'. Valid values: mgw, cgw",
                other
            ))),
        }
    }
}

/// Short-lived bearer token obtained from the credential exchange
///
/// The Debug implementation intentionally does NOT expose the token.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token value, for request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<REDACTED>)")
    }
}

/// Token plus resolved management endpoint, acquired once per run
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: SessionToken,
    pub endpoint: String,
}

impl SessionContext {
    pub fn new(token: SessionToken, endpoint: impl Into<String>) -> Self {
        Self {
            token,
            endpoint: endpoint.into(),
        }
    }
}

/// Membership criteria attached to a group
///
/// Only IP-address expressions are understood; every other criteria type
/// (tags, conjunction operators, paths) decodes as [`MembershipExpression::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resource_type")]
pub enum MembershipExpression {
    #[serde(rename = "IPAddressExpression")]
    IpAddress {
        id: String,
        #[serde(default)]
        ip_addresses: Vec<String>,
    },
    #[serde(other)]
    Other,
}

/// A security group as returned by the policy API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub display_name: String,

    /// `None` when the response carried no `expression` field at all
    #[serde(default, rename = "expression")]
    pub expressions: Option<Vec<MembershipExpression>>,
}

/// Borrowed view of the IP-address expression selected for mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpAddressExpression<'a> {
    pub id: &'a str,
    pub ip_addresses: &'a [String],
}

impl<'a> IpAddressExpression<'a> {
    pub fn contains(&self, address: &str) -> bool {
        self.ip_addresses.iter().any(|member| member == address)
    }
}

impl SecurityGroup {
    /// First IP-address expression in returned order; later ones are ignored
    pub fn ip_address_expression(&self) -> Option<IpAddressExpression<'_>> {
        self.expressions.as_deref()?.iter().find_map(|expr| match expr {
            MembershipExpression::IpAddress { id, ip_addresses } => Some(IpAddressExpression {
                id,
                ip_addresses,
            }),
            MembershipExpression::Other => None,
        })
    }
}

/// Result of looking a group up by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLookup {
    Found(SecurityGroup),
    NotFound,
    /// Any other status, or a success status whose body could not be decoded
    Unexpected { status: u16 },
}

/// Direction of an address mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationOp {
    Add,
    Remove,
}

impl MutationOp {
    /// Value of the `action` query parameter
    pub fn action(&self) -> &'static str {
        match self {
            MutationOp::Add => "add",
            MutationOp::Remove => "remove",
        }
    }
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// HTTP status of a mutating call
///
/// No response-body contract is relied upon beyond the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationStatus(pub u16);

impl MutationStatus {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
