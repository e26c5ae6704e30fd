// # Session Provider Trait
//
// Defines the interface for turning a long-lived refresh credential into a
// usable session: a short-lived token plus the management endpoint of one
// data center.

use async_trait::async_trait;
use tracing::info;

use crate::types::{SessionContext, SessionToken};

/// Trait for session provider implementations
///
/// Both calls are fatal on failure. There is no retry, and the session is
/// never refreshed mid-run.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Exchange the refresh credential for a session token
    async fn authenticate(&self, refresh_token: &str) -> Result<SessionToken, crate::Error>;

    /// Resolve the management endpoint URL for an organization/data-center pair
    async fn resolve_endpoint(
        &self,
        org_id: &str,
        datacenter_id: &str,
        token: &SessionToken,
    ) -> Result<String, crate::Error>;
}

/// Run both session steps and bundle the result
pub async fn establish_session<P>(
    provider: &P,
    refresh_token: &str,
    org_id: &str,
    datacenter_id: &str,
) -> Result<SessionContext, crate::Error>
where
    P: SessionProvider + ?Sized,
{
    let token = provider.authenticate(refresh_token).await?;
    info!("Obtained session token");

    let endpoint = provider
        .resolve_endpoint(org_id, datacenter_id, &token)
        .await?;
    info!("Resolved management endpoint: {}", endpoint);

    Ok(SessionContext::new(token, endpoint))
}
