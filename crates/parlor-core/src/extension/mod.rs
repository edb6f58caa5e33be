//! Extension modules: loading, registry and dispatch.
//!
//! An extension is a native shared object exporting a `parlor_extension`
//! record (see [`parlor_extension_sdk::ExtensionRecord`]). Its lifecycle:
//!
//! ```text
//! activate ──► Loaded ──start──► Active ──stop──► Stopped ──unload──► Unloaded
//! ```
//!
//! Only `Active` modules receive hooks. [`ExtensionHost`] ties the pieces
//! together for one client.

pub mod dispatch;
pub mod loader;
pub mod module;
pub mod registry;
pub mod safety;

pub use dispatch::{ChatOutcome, ExtensionHost, LoadReport};
pub use loader::{discover, is_native_extension, ExtensionLoader};
pub use module::{ExtensionModule, ExtensionState};
pub use registry::{ExtensionId, ExtensionInfo, ExtensionRegistry};
