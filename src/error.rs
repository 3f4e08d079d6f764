// Error taxonomy for discovery, the ethtool client and the sample store.

use crate::models::TrackedCounter;
use std::path::PathBuf;

/// Failure to read the InfiniBand registry root itself. A missing root is not an error.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("cannot read device registry {path}: {source}")]
    Registry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-candidate resolution failure; the candidate is skipped.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{controller}: no network interface bound")]
    NoInterface { controller: String },
    #[error("{controller}: expected one bound network interface, found {found:?}")]
    MultipleInterfaces {
        controller: String,
        found: Vec<String>,
    },
    #[error("{controller}: cannot read {path}: {source}")]
    Io {
        controller: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("invalid interface name {interface:?}")]
    InterfaceName { interface: String },
    #[error("counter query failed for {interface} ({phase}): {source}")]
    Query {
        interface: String,
        phase: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {phase} response from {interface}: expected {expected} entries, got {actual}")]
    Malformed {
        interface: String,
        phase: &'static str,
        expected: u32,
        actual: u32,
    },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{controller}: counter {} missing from snapshot", .counter.kernel_name())]
    MissingCounter {
        controller: String,
        counter: TrackedCounter,
    },
    #[error("{controller}: not tracked")]
    NotTracked { controller: String },
}
