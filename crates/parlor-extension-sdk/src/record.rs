//! The exported extension record and its callback signatures.
//!
//! Every extension object exports exactly one symbol, [`EXTENSION_SYMBOL`],
//! pointing at a static [`ExtensionRecord`]:
//!
//! ```c
//! struct parlor_extension {
//!     const char *name;
//!     int major_version, minor_version;
//!     void *(*start)(struct parlor *, const char *path);
//!     void  (*stop)(struct parlor *, void *session);
//!     void  (*process_message)(struct parlor *, void *session, const struct parlor_message *);
//!     void  (*process_command)(struct parlor *, void *session, const struct parlor_command *);
//!     int   (*process_chat)(struct parlor *, void *session, const struct parlor_chat *);
//! };
//! ```
//!
//! Any callback may be null, meaning "not implemented".

use std::ffi::{c_char, c_int, c_void};

use crate::wire::{HostHandle, WireChat, WireCommand, WireMessage};

/// Name of the exported record symbol (NUL terminated for the dynamic loader).
pub const EXTENSION_SYMBOL: &[u8] = b"parlor_extension\0";

/// Host API status: success.
pub const PARLOR_OK: c_int = 0;
/// Host API status: failure.
pub const PARLOR_FAIL: c_int = 1;

/// `print` severity for ordinary lines.
pub const NORMAL_MESSAGE: c_int = 0;
/// `print` severity for error lines.
pub const ERROR_MESSAGE: c_int = 1;

/// Chat hook outcome: send the line unchanged.
pub const PASS_MESSAGE: c_int = 0;
/// Chat hook outcome: withhold the line.
pub const DROP_MESSAGE: c_int = 1;

pub type StartFn = unsafe extern "C" fn(host: *mut HostHandle, path: *const c_char) -> *mut c_void;
pub type StopFn = unsafe extern "C" fn(host: *mut HostHandle, session: *mut c_void);
pub type MessageFn =
    unsafe extern "C" fn(host: *mut HostHandle, session: *mut c_void, msg: *const WireMessage);
pub type CommandFn =
    unsafe extern "C" fn(host: *mut HostHandle, session: *mut c_void, cmd: *const WireCommand);
pub type ChatFn =
    unsafe extern "C" fn(host: *mut HostHandle, session: *mut c_void, chat: *const WireChat) -> c_int;

/// Metadata and callback table exported by an extension.
#[repr(C)]
#[derive(Debug)]
pub struct ExtensionRecord {
    /// Extension name (NUL-terminated UTF-8)
    pub name: *const c_char,
    pub major_version: c_int,
    pub minor_version: c_int,
    pub start: Option<StartFn>,
    pub stop: Option<StopFn>,
    pub process_message: Option<MessageFn>,
    pub process_command: Option<CommandFn>,
    pub process_chat: Option<ChatFn>,
}

// The record is immutable static data; the name points at static bytes.
unsafe impl Sync for ExtensionRecord {}

impl ExtensionRecord {
    /// A record with no callbacks. `name` must be NUL terminated.
    pub const fn named(name: &'static [u8], major_version: c_int, minor_version: c_int) -> Self {
        Self {
            name: name.as_ptr().cast(),
            major_version,
            minor_version,
            start: None,
            stop: None,
            process_message: None,
            process_command: None,
            process_chat: None,
        }
    }
}

/// Decoded chat hook outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessResult {
    #[default]
    Pass,
    Drop,
}

impl ProcessResult {
    /// Decode a raw outcome. Anything other than `PASS_MESSAGE` or
    /// `DROP_MESSAGE` is `None`.
    pub fn from_raw(raw: c_int) -> Option<Self> {
        match raw {
            PASS_MESSAGE => Some(Self::Pass),
            DROP_MESSAGE => Some(Self::Drop),
            _ => None,
        }
    }

    pub fn as_raw(self) -> c_int {
        match self {
            Self::Pass => PASS_MESSAGE,
            Self::Drop => DROP_MESSAGE,
        }
    }
}
