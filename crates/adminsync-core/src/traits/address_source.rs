// # Address Source Trait
//
// Defines the interface for discovering the client's current public IPv4 address.
//
// ## Implementations
//
// - HTTP echo service: `adminsync-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use adminsync_core::AddressSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let current = source.current().await?;
//     if !current.is_valid() {
//         println!("echo service returned garbage");
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::address::AddressRecord;

/// Trait for address source implementations
///
/// # Failure Contract
///
/// Two failure modes are kept deliberately apart:
///
/// - The service answered, but the body is not an IPv4 address:
///   return `Ok(AddressRecord::empty())`. Callers check validity, not errors.
/// - The service could not be reached at all: return `Err`. There is no
///   fallback, so the caller treats this as fatal for the current pass.
///
/// Implementations make a single request per call and never retry.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the current public address
    async fn current(&self) -> Result<AddressRecord, crate::Error>;

    /// Source name (for logging)
    fn source_name(&self) -> &'static str;
}
