//! Run driver
//!
//! Runs the reconciler once per configured gateway domain, in order, and
//! persists the current address after the last domain has been handled.
//! Any valid current address resolved during the run is persisted, whether
//! or not the group step on that domain succeeded.

use tracing::{debug, error, info};

use crate::address::AddressRecord;
use crate::config::GroupConfig;
use crate::error::Result;
use crate::types::{GatewayDomain, SessionContext};

use super::reconciler::{GroupReport, Reconciler};

/// Result for one gateway domain
#[derive(Debug)]
pub struct DomainResult {
    pub domain: GatewayDomain,
    pub result: Result<GroupReport>,
}

impl DomainResult {
    pub fn is_failure(&self) -> bool {
        match &self.result {
            Ok(report) => report.has_failure(),
            Err(_) => true,
        }
    }
}

/// Everything a single run did
#[derive(Debug, Default)]
pub struct RunSummary {
    pub results: Vec<DomainResult>,

    /// Address written to the store at the end of the run
    pub persisted: Option<AddressRecord>,

    /// Set when persisting the current address failed
    pub persist_error: Option<String>,
}

impl RunSummary {
    /// True when any domain failed or the address could not be persisted
    pub fn has_failures(&self) -> bool {
        self.persist_error.is_some() || self.results.iter().any(DomainResult::is_failure)
    }

    pub fn report(&self, domain: GatewayDomain) -> Option<&GroupReport> {
        self.results
            .iter()
            .find(|r| r.domain == domain)
            .and_then(|r| r.result.as_ref().ok())
    }
}

/// Drives one run across the configured gateway domains
///
/// Each domain is reconciled independently: an error on one is logged and
/// recorded, and the next domain still runs. The former address is read by
/// every pass but written only once, after all passes, so each domain sees
/// the same former address.
pub struct Driver {
    reconciler: Reconciler,
    group_name: String,
    gateways: Vec<GatewayDomain>,
}

impl Driver {
    pub fn new(reconciler: Reconciler, group: &GroupConfig) -> Self {
        Self {
            reconciler,
            group_name: group.name.clone(),
            gateways: group.gateways.clone(),
        }
    }

    /// Run every gateway domain once, then persist the current address
    pub async fn run(&self, session: &SessionContext) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut latest = AddressRecord::empty();

        for &domain in &self.gateways {
            info!("Running against gateway: {}", domain);

            // A resolved address is kept even when the group step fails
            let result = match self.reconciler.resolver().resolve().await {
                Ok(addresses) => {
                    if addresses.current.is_valid() {
                        latest = addresses.current;
                    }
                    self.reconciler
                        .reconcile_addresses(session, domain, &self.group_name, addresses)
                        .await
                }
                Err(e) => Err(e),
            };

            match &result {
                Ok(report) if report.has_failure() => {
                    debug!("Gateway {} finished with failures: {:?}", domain, report.outcome)
                }
                Ok(_) => {}
                Err(e) => error!("Gateway {} failed: {}", domain, e),
            }

            summary.results.push(DomainResult { domain, result });
        }

        if latest.is_valid() {
            match self.reconciler.resolver().persist(&latest).await {
                Ok(()) => summary.persisted = Some(latest),
                Err(e) => {
                    error!("Failed to persist current IPv4 address {}: {}", latest, e);
                    summary.persist_error = Some(e.to_string());
                }
            }
        } else {
            debug!("No valid current IPv4 address this run, leaving the stored address untouched");
        }

        summary
    }
}
