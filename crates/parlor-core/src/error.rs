//! Error taxonomy for the extension subsystem.
//!
//! No error here is allowed to terminate the client. Load errors go back to
//! whoever asked for the activation, marshal and host API errors are turned
//! into status values at the foreign boundary.

use std::path::PathBuf;

/// Activation or deactivation of an extension module failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to open extension library {path}: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Extension {path} does not export the `parlor_extension` record: {source}")]
    MissingSymbol {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Extension {path} has a malformed record: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    #[error("Extension path cannot be passed to the extension: {0}")]
    InvalidPath(PathBuf),

    #[error("Extension {name} is {state}, expected active")]
    InvalidState {
        name: String,
        state: crate::extension::ExtensionState,
    },

    #[error("Extension not found: {0}")]
    NotFound(String),
}

/// Boundary data could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    #[error("Invalid UTF-8 in field '{field}'")]
    InvalidUtf8 { field: &'static str },

    #[error("Null pointer with non-zero length in field '{field}'")]
    NullPointer { field: &'static str },

    #[error("Length {len} is not addressable in field '{field}'")]
    InvalidLength { field: &'static str, len: usize },

    #[error("Interior NUL byte in field '{field}'")]
    InteriorNul { field: &'static str },
}

/// Semantic failures of a host API call. Never crosses the boundary as such;
/// each one maps to the call's documented failure value.
#[derive(Debug, thiserror::Error)]
pub enum HostApiError {
    #[error("Capability handle is not live")]
    InvalidHandle,

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Unknown channel {channel} on {network}")]
    UnknownChannel { network: String, channel: String },

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Host API call panicked: {0}")]
    Fault(String),
}

/// Failures reported by the client-state collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Not connected to network: {0}")]
    UnknownNetwork(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Rejected: {0}")]
    Rejected(String),
}

/// Addressing a module in the registry failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Extension id {0} is stale or was never issued")]
    StaleId(crate::extension::ExtensionId),
}

/// Routing a command or chat line to one module failed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Configuration could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
