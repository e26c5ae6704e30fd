// # Address Store Trait
//
// Defines the interface for persisting the last-seen address.
//
// ## Purpose
//
// The store lets the next run know which address to remove from the group
// once the client's address changes. It holds exactly one value.
//
// ## Implementations
//
// - File-based: a single bare address string (`FileAddressStore`)
// - In-memory: for tests and embedding (`MemoryAddressStore`)

use async_trait::async_trait;

use crate::address::AddressRecord;

/// Trait for address store implementations
///
/// A missing or malformed stored value is not an error: `load` returns the
/// empty record, which is the normal first-run outcome. `Err` is reserved
/// for genuine storage failures (permissions, disk full).
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Load the stored address
    async fn load(&self) -> Result<AddressRecord, crate::Error>;

    /// Overwrite the stored address
    ///
    /// Callers only pass valid records; implementations may reject the empty
    /// record with an error.
    async fn save(&self, record: &AddressRecord) -> Result<(), crate::Error>;
}
