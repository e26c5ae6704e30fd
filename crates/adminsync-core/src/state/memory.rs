// # Memory Address Store
//
// In-memory implementation of AddressStore.
//
// ## Purpose
//
// Provides a store that doesn't persist across restarts. Useful for tests
// and for embedding the reconciler where the caller tracks the address.
//
// Clones share the same underlying value.

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::address::AddressRecord;
use crate::traits::AddressStore;

/// In-memory address store
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressStore {
    inner: Arc<RwLock<AddressRecord>>,
}

impl MemoryAddressStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `address`
    pub fn with_address(address: Ipv4Addr) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AddressRecord::new(address))),
        }
    }
}

#[async_trait]
impl AddressStore for MemoryAddressStore {
    async fn load(&self) -> Result<AddressRecord, Error> {
        Ok(*self.inner.read().await)
    }

    async fn save(&self, record: &AddressRecord) -> Result<(), Error> {
        if !record.is_valid() {
            return Err(Error::state_store("Refusing to persist an empty address"));
        }
        *self.inner.write().await = *record;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryAddressStore::new();
        let clone = store.clone();

        assert!(!store.load().await.unwrap().is_valid());

        clone.save(&AddressRecord::parse("1.2.3.4")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), AddressRecord::parse("1.2.3.4"));
    }
}
