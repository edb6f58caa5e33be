//! parlor extension SDK
//!
//! The binary contract shared by the parlor IRC client and the native
//! extensions it loads at runtime, plus a small safe layer for writing
//! those extensions in Rust.
//!
//! # Contract
//!
//! An extension is a shared object exporting one symbol,
//! `parlor_extension`, that points at an [`ExtensionRecord`]: a name, a
//! major/minor version and five optional callbacks. The host calls `start`
//! once after loading and `stop` once before unloading; in between it calls
//! `process_message` for every inbound protocol message, `process_command`
//! for commands the user addresses to this extension, and `process_chat`
//! for outgoing chat the extension may withhold.
//!
//! All data crosses the boundary in the fixed-layout structures of
//! [`wire`]. Nothing passed into a callback outlives that callback.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use parlor_extension_sdk::prelude::*;
//!
//! struct Quiet;
//!
//! impl Extension for Quiet {
//!     fn start(_host: HostRef<'_>, _path: &std::path::Path) -> Option<Self> {
//!         Some(Quiet)
//!     }
//!
//!     fn on_chat(&mut self, _host: HostRef<'_>, chat: &WireChat) -> ProcessResult {
//!         match unsafe { chat.message.as_str() } {
//!             Some(text) if text.starts_with("!quiet") => ProcessResult::Drop,
//!             _ => ProcessResult::Pass,
//!         }
//!     }
//! }
//!
//! declare_extension!(Quiet, "quiet", 1, 0);
//! ```

pub mod extension;
#[cfg(feature = "host-imports")]
pub mod host;
#[macro_use]
pub mod macros;
pub mod record;
pub mod wire;

pub use extension::{Extension, HostRef};
pub use record::{
    ChatFn, CommandFn, ExtensionRecord, MessageFn, ProcessResult, StartFn, StopFn,
    DROP_MESSAGE, ERROR_MESSAGE, EXTENSION_SYMBOL, NORMAL_MESSAGE, PARLOR_FAIL, PARLOR_OK,
    PASS_MESSAGE,
};
pub use wire::{HostHandle, WireChat, WireCommand, WireMessage, WireStringLen};

/// Prelude module with common imports
pub mod prelude {
    pub use crate::declare_extension;
    pub use crate::extension::{Extension, HostRef};
    pub use crate::record::{
        ExtensionRecord, ProcessResult, ERROR_MESSAGE, NORMAL_MESSAGE, PARLOR_FAIL, PARLOR_OK,
    };
    pub use crate::wire::{WireChat, WireCommand, WireMessage, WireStringLen};
}
