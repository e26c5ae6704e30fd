//! Current/former address resolution
//!
//! [`AddressResolver`] pairs an [`AddressSource`] (where the client is now)
//! with an [`AddressStore`] (where it was last run). Invalid input never
//! becomes a malformed string: it collapses to the empty record.

use std::fmt;
use std::net::Ipv4Addr;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::traits::{AddressSource, AddressStore};

/// A single IPv4 address, or nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressRecord(Option<Ipv4Addr>);

impl AddressRecord {
    pub fn new(address: Ipv4Addr) -> Self {
        Self(Some(address))
    }

    pub fn empty() -> Self {
        Self(None)
    }

    /// Parse text as an IPv4 address, ignoring surrounding whitespace
    ///
    /// Anything that is not IPv4 syntax (including IPv6) yields the empty record.
    pub fn parse(text: &str) -> Self {
        Self(text.trim().parse::<Ipv4Addr>().ok())
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.0
    }
}

impl From<Ipv4Addr> for AddressRecord {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(address) => write!(f, "{}", address),
            None => Ok(()),
        }
    }
}

/// Current and former addresses for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddressPair {
    pub current: AddressRecord,
    pub former: AddressRecord,
}

/// Resolves and persists the client's address
pub struct AddressResolver {
    source: Box<dyn AddressSource>,
    store: Box<dyn AddressStore>,
}

impl AddressResolver {
    pub fn new(source: Box<dyn AddressSource>, store: Box<dyn AddressStore>) -> Self {
        Self { source, store }
    }

    /// Ask the address source for the current address
    ///
    /// Transport failures propagate; an unusable answer is the empty record.
    pub async fn resolve_current(&self) -> Result<AddressRecord> {
        let current = self.source.current().await?;
        if !current.is_valid() {
            warn!(
                "Current IPv4 address from {} is not valid",
                self.source.source_name()
            );
        }
        Ok(current)
    }

    /// Load the address persisted by the previous run
    pub async fn load_former(&self) -> Result<AddressRecord> {
        let former = self.store.load().await?;
        if !former.is_valid() {
            debug!("No valid former IPv4 address on record");
        }
        Ok(former)
    }

    /// Resolve current and former addresses
    ///
    /// When the current address is invalid the former one is not consulted
    /// and the pair comes back empty on both sides.
    pub async fn resolve(&self) -> Result<AddressPair> {
        let current = self.resolve_current().await?;
        if !current.is_valid() {
            return Ok(AddressPair::default());
        }

        let former = self.load_former().await?;
        info!("Your current IPv4 address is: {}", current);
        info!("Your former IPv4 address is: {}", former);

        Ok(AddressPair { current, former })
    }

    /// Persist `current` if it is valid; the empty record leaves the store untouched
    pub async fn persist(&self, current: &AddressRecord) -> Result<()> {
        if !current.is_valid() {
            debug!("Not persisting an invalid current address");
            return Ok(());
        }

        self.store.save(current).await?;
        debug!("Persisted current IPv4 address {}", current);
        Ok(())
    }
}
