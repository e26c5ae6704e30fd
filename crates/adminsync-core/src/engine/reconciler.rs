//! Admin-group reconciliation
//!
//! Given the client's current and former address, converge one named group
//! on one gateway domain so that only the current address is allowed.

use std::net::Ipv4Addr;

use tracing::{debug, error, info, warn};

use crate::address::{AddressPair, AddressResolver};
use crate::error::Result;
use crate::traits::GroupStore;
use crate::types::{
    GatewayDomain, GroupLookup, IpAddressExpression, MutationOp, SecurityGroup, SessionContext,
};

/// What happened to the current address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentOutcome {
    Added,
    AlreadyPresent,
    AddFailed(String),
}

/// What happened to the former address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormerOutcome {
    Removed,
    /// Valid, but not a member of the group
    NotInGroup,
    /// Same as the current address
    Unchanged,
    /// No valid former address on record
    NotAvailable,
    RemoveFailed(String),
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The current address could not be determined; no lookup was made
    CurrentUnavailable,
    /// The group did not exist and was created with the current address
    Created,
    CreateFailed { reason: String },
    /// The group exists but has no IP-address membership expression
    NotIpAddressBased,
    /// The lookup returned a status or body the reconciler cannot act on
    ///
    /// `status` is `None` when the group decoded but carried no `expression` field.
    UnexpectedResponse { status: Option<u16> },
    /// The IP-address expression was inspected and adjusted
    Reconciled {
        members: Vec<String>,
        current: CurrentOutcome,
        former: FormerOutcome,
    },
}

/// Report for one gateway domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub domain: GatewayDomain,
    pub group_name: String,
    pub addresses: AddressPair,
    pub outcome: GroupOutcome,
}

impl GroupReport {
    /// True when something that should have happened did not
    ///
    /// Steady-state no-ops (already present, unchanged, not IP-based) are not failures.
    pub fn has_failure(&self) -> bool {
        match &self.outcome {
            GroupOutcome::CurrentUnavailable | GroupOutcome::CreateFailed { .. } => true,
            GroupOutcome::Reconciled {
                current, former, ..
            } => {
                matches!(current, CurrentOutcome::AddFailed(_))
                    || matches!(former, FormerOutcome::RemoveFailed(_))
            }
            GroupOutcome::Created
            | GroupOutcome::NotIpAddressBased
            | GroupOutcome::UnexpectedResponse { .. } => false,
        }
    }
}

/// Converges a single group against the client's address
pub struct Reconciler {
    resolver: AddressResolver,
    groups: Box<dyn GroupStore>,
}

impl Reconciler {
    pub fn new(resolver: AddressResolver, groups: Box<dyn GroupStore>) -> Self {
        Self { resolver, groups }
    }

    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Reconcile `group_name` on `domain`
    ///
    /// Resolves the current and former address first. `Err` is returned
    /// only for transport-level failures of the address source or the group
    /// lookup; everything else is reported through [`GroupOutcome`].
    pub async fn reconcile(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
    ) -> Result<GroupReport> {
        let addresses = self.resolver.resolve().await?;
        self.reconcile_addresses(session, domain, group_name, addresses)
            .await
    }

    /// Reconcile `group_name` on `domain` against an already resolved pair
    pub async fn reconcile_addresses(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        addresses: AddressPair,
    ) -> Result<GroupReport> {
        let outcome = match addresses.current.address() {
            None => {
                error!("Unable to get current IPv4 address");
                GroupOutcome::CurrentUnavailable
            }
            Some(current) => {
                self.converge(session, domain, group_name, current, &addresses)
                    .await?
            }
        };

        Ok(GroupReport {
            domain,
            group_name: group_name.to_string(),
            addresses,
            outcome,
        })
    }

    async fn converge(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        current: Ipv4Addr,
        addresses: &AddressPair,
    ) -> Result<GroupOutcome> {
        debug!(
            "Looking up group {} on {} via {}",
            group_name,
            domain,
            self.groups.store_name()
        );
        let lookup = self.groups.get_group(session, domain, group_name).await?;

        let outcome = match lookup {
            GroupLookup::NotFound => {
                info!(
                    "Group {} does not exist for {}. Will attempt to create it.",
                    group_name, domain
                );
                self.create(session, domain, group_name, current).await
            }
            GroupLookup::Found(SecurityGroup {
                expressions: None, ..
            }) => {
                warn!("API call failed. Expected a response containing the field \"expression\"");
                GroupOutcome::UnexpectedResponse { status: None }
            }
            GroupLookup::Found(group) => match group.ip_address_expression() {
                Some(expression) => {
                    self.adjust(session, domain, group_name, expression, current, addresses)
                        .await
                }
                None => {
                    warn!(
                        "The group {} is not based on the IP addresses criteria",
                        group_name
                    );
                    GroupOutcome::NotIpAddressBased
                }
            },
            GroupLookup::Unexpected { status } => {
                warn!(
                    "API call failed with status {}. Expected a response containing the field \"expression\"",
                    status
                );
                GroupOutcome::UnexpectedResponse {
                    status: Some(status),
                }
            }
        };

        Ok(outcome)
    }

    async fn create(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        current: Ipv4Addr,
    ) -> GroupOutcome {
        match self
            .groups
            .create_group(session, domain, group_name, &[current])
            .await
        {
            Ok(status) if status.is_success() => {
                info!(
                    "Created group {} and added IP address {}",
                    group_name, current
                );
                GroupOutcome::Created
            }
            Ok(status) => {
                error!("Unable to create group {} (status {})", group_name, status);
                GroupOutcome::CreateFailed {
                    reason: format!("status {}", status),
                }
            }
            Err(e) => {
                error!("Unable to create group {}: {}", group_name, e);
                GroupOutcome::CreateFailed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn adjust(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        expression: IpAddressExpression<'_>,
        current: Ipv4Addr,
        addresses: &AddressPair,
    ) -> GroupOutcome {
        info!(
            "IP addresses currently in the group: {:?}",
            expression.ip_addresses
        );

        // Add and remove are independent: neither aborts nor rolls back the other.
        let current_outcome = if expression.contains(&current.to_string()) {
            info!("Your current IPv4 address is already in the group");
            CurrentOutcome::AlreadyPresent
        } else {
            match self
                .mutate(session, domain, group_name, expression.id, current, MutationOp::Add)
                .await
            {
                Ok(()) => {
                    info!("Your current IPv4 address has been added to the group");
                    CurrentOutcome::Added
                }
                Err(reason) => {
                    error!("Failed to add current IPv4 address {}: {}", current, reason);
                    CurrentOutcome::AddFailed(reason)
                }
            }
        };

        let former_outcome = match addresses.former.address() {
            None => {
                info!("Unable to get former IPv4 address");
                FormerOutcome::NotAvailable
            }
            Some(former) if !expression.contains(&former.to_string()) => {
                info!("Your former IPv4 address was not in the group");
                FormerOutcome::NotInGroup
            }
            Some(former) if former == current => {
                info!("Your IPv4 address has not changed since the last time this program was run");
                FormerOutcome::Unchanged
            }
            Some(former) => match self
                .mutate(session, domain, group_name, expression.id, former, MutationOp::Remove)
                .await
            {
                Ok(()) => {
                    info!("Your former IPv4 address was removed from group");
                    FormerOutcome::Removed
                }
                Err(reason) => {
                    error!("Failed to remove former IPv4 address {}: {}", former, reason);
                    FormerOutcome::RemoveFailed(reason)
                }
            },
        };

        GroupOutcome::Reconciled {
            members: expression.ip_addresses.to_vec(),
            current: current_outcome,
            former: former_outcome,
        }
    }

    /// Issue one mutation, folding transport errors and failure statuses into a reason
    async fn mutate(
        &self,
        session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        expression_id: &str,
        address: Ipv4Addr,
        op: MutationOp,
    ) -> std::result::Result<(), String> {
        match self
            .groups
            .mutate_group_addresses(session, domain, group_name, expression_id, &[address], op)
            .await
        {
            Ok(status) if status.is_success() => {
                info!("{} {} on {}/{}: status {}", op, address, domain, group_name, status);
                Ok(())
            }
            Ok(status) => Err(format!("{} returned status {}", op, status)),
            Err(e) => Err(e.to_string()),
        }
    }
}
