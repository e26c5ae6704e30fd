// # Group Store Trait
//
// Defines the interface for reading and mutating a named security group.
//
// ## Implementations
//
// - Policy API over HTTPS: `adminsync-provider-vmc` crate
//
// ## Usage
//
// ```rust,ignore
// use adminsync_core::{GatewayDomain, GroupLookup, GroupStore};
//
// match store.get_group(&session, GatewayDomain::Management, "Allow-Admin-Access").await? {
//     GroupLookup::Found(group) => println!("{:?}", group.ip_address_expression()),
//     GroupLookup::NotFound => println!("group is missing"),
//     GroupLookup::Unexpected { status } => println!("policy API said {}", status),
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::types::{GatewayDomain, GroupLookup, MutationOp, MutationStatus, SessionContext};

/// Trait for group store implementations
///
/// # Trust Level: Untrusted
///
/// Group stores are thin accessors:
///
/// - One HTTP request per call, no retry, no backoff
/// - No decision about whether a mutation is needed (owned by `Reconciler`)
/// - No caching between calls; every reconciliation fetches the group fresh
///
/// `Err` means the request could not be completed at the transport level.
/// A completed request with a failure status is reported through the return
/// value instead, so the reconciler can log it and carry on.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Look up a group by name
    ///
    /// A 404 maps to [`GroupLookup::NotFound`]; every other non-success
    /// status maps to [`GroupLookup::Unexpected`].
    async fn get_group(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
    ) -> Result<GroupLookup, crate::Error>;

    /// Create (or replace) a group with one IP-address expression holding
    /// exactly `seed`
    async fn create_group(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        seed: &[Ipv4Addr],
    ) -> Result<MutationStatus, crate::Error>;

    /// Add or remove addresses on an existing IP-address expression
    async fn mutate_group_addresses(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        expression_id: &str,
        addresses: &[Ipv4Addr],
        op: MutationOp,
    ) -> Result<MutationStatus, crate::Error>;

    /// Store name (for logging)
    fn store_name(&self) -> &'static str;
}
