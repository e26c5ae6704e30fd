//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles here hold their state behind `Arc`, so a test can box one
//! clone into the reconciler and keep another to inspect what happened.

#![allow(dead_code)]

use adminsync_core::error::{Error, Result};
use adminsync_core::{
    AddressRecord, AddressResolver, AddressSource, GatewayDomain, GroupLookup, GroupStore,
    MembershipExpression, MemoryAddressStore, MutationOp, MutationStatus, Reconciler,
    SecurityGroup, SessionContext, SessionToken,
};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Expression id given to groups created by [`FakeGroupStore`]
pub const CREATED_EXPRESSION_ID: &str = "created-ip-expression";

pub fn ip(text: &str) -> Ipv4Addr {
    text.parse().expect("valid IPv4 literal")
}

pub fn session() -> SessionContext {
    SessionContext::new(
        SessionToken::new("session-token"),
        "https://nsx.example.com/sks-nsxt-manager",
    )
}

/// A group with a single IP-address expression
pub fn ip_group(name: &str, expression_id: &str, members: &[&str]) -> SecurityGroup {
    SecurityGroup {
        id: name.to_string(),
        display_name: name.to_string(),
        expressions: Some(vec![MembershipExpression::IpAddress {
            id: expression_id.to_string(),
            ip_addresses: members.iter().map(|m| m.to_string()).collect(),
        }]),
    }
}

/// A group whose only criteria is not IP-based
pub fn tag_group(name: &str) -> SecurityGroup {
    SecurityGroup {
        id: name.to_string(),
        display_name: name.to_string(),
        expressions: Some(vec![MembershipExpression::Other]),
    }
}

/// An address source that replays a script, repeating the last entry
#[derive(Clone)]
pub struct ScriptedAddressSource {
    script: Arc<Mutex<VecDeque<std::result::Result<AddressRecord, String>>>>,
    last: Arc<Mutex<std::result::Result<AddressRecord, String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedAddressSource {
    /// Always answer with `text` (parsed; garbage gives the empty record)
    pub fn fixed(text: &str) -> Self {
        Self::sequence(&[text])
    }

    /// Answer with each entry in turn
    pub fn sequence(texts: &[&str]) -> Self {
        let script: VecDeque<_> = texts.iter().map(|t| Ok(AddressRecord::parse(t))).collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or_else(|| Ok(AddressRecord::empty()));
        Self {
            script: Arc::new(Mutex::new(script)),
            last: Arc::new(Mutex::new(last)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every call at the transport level
    pub fn unreachable() -> Self {
        let failure = Err("connection refused".to_string());
        Self {
            script: Arc::new(Mutex::new(VecDeque::from([failure.clone()]))),
            last: Arc::new(Mutex::new(failure)),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn current(&self) -> Result<AddressRecord> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let answer = match next {
            Some(answer) => answer,
            None => self.last.lock().unwrap().clone(),
        };
        answer.map_err(Error::address_source)
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A call observed by [`FakeGroupStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCall {
    Get(GatewayDomain),
    Create {
        domain: GatewayDomain,
        seed: Vec<Ipv4Addr>,
    },
    Mutate {
        domain: GatewayDomain,
        expression_id: String,
        addresses: Vec<Ipv4Addr>,
        op: MutationOp,
    },
}

/// A stateful in-memory group store that records every call
///
/// Successful mutations are applied to the stored group, so a second run
/// against the same store sees the result of the first.
#[derive(Clone, Default)]
pub struct FakeGroupStore {
    groups: Arc<Mutex<HashMap<GatewayDomain, SecurityGroup>>>,
    lookup_overrides: Arc<Mutex<HashMap<GatewayDomain, std::result::Result<GroupLookup, String>>>>,
    status_overrides: Arc<Mutex<HashMap<(GatewayDomain, &'static str), MutationStatus>>>,
    failing_mutations: Arc<Mutex<HashMap<(GatewayDomain, &'static str), String>>>,
    calls: Arc<Mutex<Vec<GroupCall>>>,
}

impl FakeGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(self, domain: GatewayDomain, group: SecurityGroup) -> Self {
        self.groups.lock().unwrap().insert(domain, group);
        self
    }

    /// Answer lookups on `domain` with `lookup` regardless of stored state
    pub fn with_lookup(self, domain: GatewayDomain, lookup: GroupLookup) -> Self {
        self.lookup_overrides
            .lock()
            .unwrap()
            .insert(domain, Ok(lookup));
        self
    }

    /// Fail lookups on `domain` at the transport level
    pub fn with_lookup_error(self, domain: GatewayDomain) -> Self {
        self.lookup_overrides
            .lock()
            .unwrap()
            .insert(domain, Err("lookup timed out".to_string()));
        self
    }

    /// Answer `create`, `add` or `remove` on `domain` with `status`
    pub fn with_status(self, domain: GatewayDomain, call: &'static str, status: u16) -> Self {
        self.status_overrides
            .lock()
            .unwrap()
            .insert((domain, call), MutationStatus(status));
        self
    }

    /// Fail `create`, `add` or `remove` on `domain` at the transport level
    pub fn with_transport_error(self, domain: GatewayDomain, call: &'static str) -> Self {
        self.failing_mutations
            .lock()
            .unwrap()
            .insert((domain, call), format!("{} request timed out", call));
        self
    }

    pub fn group(&self, domain: GatewayDomain) -> Option<SecurityGroup> {
        self.groups.lock().unwrap().get(&domain).cloned()
    }

    /// Members of the first IP-address expression on `domain`
    pub fn members(&self, domain: GatewayDomain) -> Vec<String> {
        self.group(domain)
            .and_then(|g| g.ip_address_expression().map(|e| e.ip_addresses.to_vec()))
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<GroupCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, GroupCall::Get(_)))
            .count()
    }

    pub fn count(&self, op: MutationOp) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GroupCall::Mutate { op: o, .. } if *o == op))
            .count()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GroupCall::Create { .. }))
            .count()
    }

    fn scripted(&self, domain: GatewayDomain, call: &'static str) -> Result<MutationStatus> {
        if let Some(reason) = self.failing_mutations.lock().unwrap().get(&(domain, call)) {
            return Err(Error::group_store(reason.clone()));
        }
        Ok(self
            .status_overrides
            .lock()
            .unwrap()
            .get(&(domain, call))
            .copied()
            .unwrap_or(MutationStatus(200)))
    }
}

#[async_trait::async_trait]
impl GroupStore for FakeGroupStore {
    async fn get_group(
        &self,
        _session: &SessionContext,
        domain: GatewayDomain,
        _group_name: &str,
    ) -> Result<GroupLookup> {
        self.calls.lock().unwrap().push(GroupCall::Get(domain));

        if let Some(scripted) = self.lookup_overrides.lock().unwrap().get(&domain) {
            return scripted.clone().map_err(Error::group_store);
        }

        Ok(match self.group(domain) {
            Some(group) => GroupLookup::Found(group),
            None => GroupLookup::NotFound,
        })
    }

    async fn create_group(
        &self,
        _session: &SessionContext,
        domain: GatewayDomain,
        group_name: &str,
        seed: &[Ipv4Addr],
    ) -> Result<MutationStatus> {
        self.calls.lock().unwrap().push(GroupCall::Create {
            domain,
            seed: seed.to_vec(),
        });

        let status = self.scripted(domain, "create")?;
        if status.is_success() {
            let members: Vec<String> = seed.iter().map(|a| a.to_string()).collect();
            let members: Vec<&str> = members.iter().map(String::as_str).collect();
            self.groups.lock().unwrap().insert(
                domain,
                ip_group(group_name, CREATED_EXPRESSION_ID, &members),
            );
        }
        Ok(status)
    }

    async fn mutate_group_addresses(
        &self,
        _session: &SessionContext,
        domain: GatewayDomain,
        _group_name: &str,
        expression_id: &str,
        addresses: &[Ipv4Addr],
        op: MutationOp,
    ) -> Result<MutationStatus> {
        self.calls.lock().unwrap().push(GroupCall::Mutate {
            domain,
            expression_id: expression_id.to_string(),
            addresses: addresses.to_vec(),
            op,
        });

        let status = self.scripted(domain, op.action())?;
        if !status.is_success() {
            return Ok(status);
        }

        let mut groups = self.groups.lock().unwrap();
        if let Some(expressions) = groups
            .get_mut(&domain)
            .and_then(|g| g.expressions.as_mut())
        {
            for expression in expressions.iter_mut() {
                if let MembershipExpression::IpAddress { id, ip_addresses } = expression
                    && *id == expression_id
                {
                    for address in addresses.iter().map(|a| a.to_string()) {
                        match op {
                            MutationOp::Add => {
                                if !ip_addresses.contains(&address) {
                                    ip_addresses.push(address);
                                }
                            }
                            MutationOp::Remove => ip_addresses.retain(|m| *m != address),
                        }
                    }
                }
            }
        }
        Ok(status)
    }

    fn store_name(&self) -> &'static str {
        "fake"
    }
}

/// Build a reconciler over the given doubles
pub fn reconciler(
    source: &ScriptedAddressSource,
    store: &MemoryAddressStore,
    groups: &FakeGroupStore,
) -> Reconciler {
    Reconciler::new(
        AddressResolver::new(Box::new(source.clone()), Box::new(store.clone())),
        Box::new(groups.clone()),
    )
}
