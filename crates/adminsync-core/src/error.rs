//! Error types for the admin-group sync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Address source errors (echo service unreachable, unreadable body)
    #[error("Address source error: {0}")]
    AddressSource(String),

    /// Persisted address store errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Credential exchange or endpoint discovery errors
    #[error("Session error: {0}")]
    Session(String),

    /// Group store errors (transport failures talking to the policy API)
    #[error("Group store error: {0}")]
    GroupStore(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Create an address source error
    pub fn address_source(msg: impl Into<String>) -> Self {
        Self::AddressSource(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create a group store error
    pub fn group_store(msg: impl Into<String>) -> Self {
        Self::GroupStore(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}
