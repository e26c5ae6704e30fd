// # VMware Cloud Provider
//
// This crate provides the cloud-side collaborators for adminsync:
//
// - [`CspSessionProvider`]: exchanges a refresh token for a session token and
//   resolves the data center's NSX policy endpoint
// - [`NsxGroupClient`]: reads, creates and mutates a security group through
//   the NSX policy API
//
// ## Trust Level: Untrusted
//
// Both types are thin, single-shot HTTP accessors:
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation to the caller
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Dry-run mode for the group client
// - ❌ NO retry or backoff
// - ❌ NO caching between calls
// - ❌ NO decision about whether a mutation is needed (owned by `Reconciler`)
//
// ## Security Requirements
//
// - Refresh and session tokens NEVER appear in logs
// - The session token travels only in the `csp-auth-token` header
//
// ## API Reference
//
// - Authorize: POST `/csp/gateway/am/api/auth/api-tokens/authorize`
// - Data center: GET `/vmc/api/orgs/:org/sddcs/:sddc`
// - Group: GET/PUT `policy/api/v1/infra/domains/:gw/groups/:group`
// - Mutation: POST `.../groups/:group/ip-address-expressions/:expr?action=add|remove`

mod csp;
mod nsx;

pub use csp::CspSessionProvider;
pub use nsx::NsxGroupClient;

use std::time::Duration;

/// Header carrying the session token on every management and policy call
pub const AUTH_HEADER: &str = "csp-auth-token";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trailing path segment of the public endpoint that the policy API does not use
const MANAGER_SUFFIX: &str = "sks-nsxt-manager";

/// Build an HTTP client with the provider timeout
fn http_client() -> adminsync_core::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| adminsync_core::Error::http(format!("Failed to build HTTP client: {}", e)))
}

/// Policy API base for a resolved management endpoint
///
/// Removes a trailing `sks-nsxt-manager` segment only when it is exactly
/// the suffix, and always returns a value ending in `/`.
pub fn policy_base(endpoint: &str) -> String {
    let base = endpoint.strip_suffix(MANAGER_SUFFIX).unwrap_or(endpoint);
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}
