//! Extension host for the parlor IRC client.
//!
//! Loads native extensions, marshals client data into the fixed wire
//! layout they understand, exports the host API they call back into, and
//! routes protocol events, commands and outgoing chat to them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use parlor_core::{client, ExtensionHost, IrcMsg, MemoryClient};
//!
//! let client = client::shared(MemoryClient::new().with_network("libera", "parlor"));
//! let mut host = ExtensionHost::new(client);
//! let id = host.activate("/usr/lib/parlor/libotr.so")?;
//!
//! host.broadcast("libera", &IrcMsg::new("PRIVMSG", ["#rust", "hi"]));
//! host.dispatch_command(id, &["status"])?;
//! ```

pub mod casemap;
pub mod client;
pub mod config;
pub mod error;
pub mod extension;
pub mod host;
pub mod marshal;
pub mod message;

pub use client::{ClientState, MemoryClient, SharedClient};
pub use config::HostConfig;
pub use error::{
    ClientError, ConfigError, DispatchError, HostApiError, LoadError, MarshalError, RegistryError,
};
pub use extension::{
    ChatOutcome, ExtensionHost, ExtensionId, ExtensionInfo, ExtensionLoader, ExtensionModule,
    ExtensionRegistry, ExtensionState, LoadReport,
};
pub use message::{Chat, IrcMsg, Severity, Tag, UserInfo};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::casemap::{identifier_compare, Identifier};
    pub use crate::client::{shared, ClientState, MemoryClient, SharedClient};
    pub use crate::config::{env_vars, HostConfig};
    pub use crate::error::{DispatchError, LoadError};
    pub use crate::extension::{ChatOutcome, ExtensionHost, ExtensionId, ExtensionInfo};
    pub use crate::message::{Chat, IrcMsg, Severity, UserInfo};
}
