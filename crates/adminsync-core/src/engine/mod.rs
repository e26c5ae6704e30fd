//! Reconciliation engine
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐      ┌──────────────┐
//! │ AddressSource │      │ AddressStore │
//! └───────────────┘      └──────────────┘
//!          │  current            │  former
//!          └──────────┬──────────┘
//!                     ▼
//!             ┌──────────────┐        ┌─────────────┐
//!  Driver ──▶ │  Reconciler  │ ─────▶ │ GroupStore  │
//!  (per GW)   └──────────────┘        │ get/create/ │
//!                                     │ add/remove  │
//!                                     └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Driver iterates the configured gateway domains in order
//! 2. Reconciler resolves current and former address
//! 3. Group is looked up; created when absent, adjusted when IP-based
//! 4. Driver persists the current address once all domains are done

pub mod driver;
pub mod reconciler;

pub use driver::{DomainResult, Driver, RunSummary};
pub use reconciler::{CurrentOutcome, FormerOutcome, GroupOutcome, GroupReport, Reconciler};
