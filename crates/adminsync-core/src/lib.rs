// # adminsync-core
//
// Core library for keeping a cloud firewall allow-list group pointed at the
// client's current public IPv4 address.
//
// ## Architecture Overview
//
// This library provides the core functionality for admin-group reconciliation:
// - **AddressSource**: Trait for discovering the current public IPv4 address
// - **AddressStore**: Trait for persisting the last-seen address between runs
// - **SessionProvider**: Trait for exchanging credentials and discovering the management endpoint
// - **GroupStore**: Trait for reading and mutating a named security group
// - **Reconciler**: Converges one group on one gateway domain
// - **Driver**: Runs the reconciler over the configured gateway domains in order
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic never touches HTTP
// 2. **Library-First**: The binary is a thin wiring layer over this crate
// 3. **Isolation**: A failing gateway domain never stops the next one
// 4. **Idempotency**: A second run with nothing changed issues no mutations

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod traits;
pub mod types;

// Re-export core types for convenience
pub use address::{AddressPair, AddressRecord, AddressResolver};
pub use config::SyncConfig;
pub use engine::{
    CurrentOutcome, DomainResult, Driver, FormerOutcome, GroupOutcome, GroupReport, Reconciler,
    RunSummary,
};
pub use error::{Error, Result};
pub use state::{FileAddressStore, MemoryAddressStore};
pub use traits::{AddressSource, AddressStore, GroupStore, SessionProvider, establish_session};
pub use types::{
    GatewayDomain, GroupLookup, IpAddressExpression, MembershipExpression, MutationOp,
    MutationStatus, SecurityGroup, SessionContext, SessionToken,
};
