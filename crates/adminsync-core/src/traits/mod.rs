//! Core traits for the sync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Discover the current public IPv4 address
//! - [`AddressStore`]: Persist the last-seen address between runs
//! - [`SessionProvider`]: Credential exchange and endpoint discovery
//! - [`GroupStore`]: Read and mutate a named security group

pub mod address_source;
pub mod address_store;
pub mod group_store;
pub mod session_provider;

pub use address_source::AddressSource;
pub use address_store::AddressStore;
pub use group_store::GroupStore;
pub use session_provider::{SessionProvider, establish_session};
