//! One loaded extension: metadata, copied callback table, session, state.

use std::ffi::{c_int, c_void, CStr};
use std::fmt;
use std::path::{Path, PathBuf};

use libloading::Library;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use parlor_extension_sdk::{
    ChatFn, CommandFn, ExtensionRecord, MessageFn, StartFn, StopFn, WireChat, WireCommand,
    WireMessage,
};

use crate::client::SharedClient;
use crate::error::LoadError;
use crate::host::CapabilityScope;

/// Lifecycle of an extension module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionState {
    /// Record resolved and validated, `start` not yet run
    Loaded,
    /// Started; receives hooks
    Active,
    /// `stop` has run
    Stopped,
    /// Library released
    Unloaded,
}

impl fmt::Display for ExtensionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded => write!(f, "loaded"),
            Self::Active => write!(f, "active"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unloaded => write!(f, "unloaded"),
        }
    }
}

/// Callback table copied out of the record at load time.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Callbacks {
    pub start: Option<StartFn>,
    pub stop: Option<StopFn>,
    pub process_message: Option<MessageFn>,
    pub process_command: Option<CommandFn>,
    pub process_chat: Option<ChatFn>,
}

/// A resolved extension module.
///
/// The session pointer is opaque to the host; it is whatever `start`
/// returned and is handed back unchanged to every later callback.
pub struct ExtensionModule {
    name: String,
    version: semver::Version,
    path: PathBuf,
    callbacks: Callbacks,
    session: *mut c_void,
    state: ExtensionState,
    // Set by `start`; `stop` runs against the same client.
    client: Option<SharedClient>,
    // Last so that it is dropped after everything that may point into it.
    library: Option<Library>,
}

fn malformed(path: &Path, reason: impl Into<String>) -> LoadError {
    LoadError::MalformedRecord {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn version_part(path: &Path, what: &str, raw: c_int) -> Result<u64, LoadError> {
    u64::try_from(raw).map_err(|_| malformed(path, format!("negative {what} version {raw}")))
}

impl ExtensionModule {
    /// Validate a record and copy it. Nothing in the record is called.
    ///
    /// # Safety
    /// A non-null `record.name` must point to a NUL-terminated string, and
    /// every callback must be callable for as long as `library` is held.
    pub(crate) unsafe fn from_record(
        record: &ExtensionRecord,
        path: &Path,
        library: Option<Library>,
    ) -> Result<Self, LoadError> {
        if record.name.is_null() {
            return Err(malformed(path, "name is null"));
        }
        let name = CStr::from_ptr(record.name)
            .to_str()
            .map_err(|_| malformed(path, "name is not valid UTF-8"))?
            .to_string();
        if name.is_empty() {
            return Err(malformed(path, "name is empty"));
        }
        let major = version_part(path, "major", record.major_version)?;
        let minor = version_part(path, "minor", record.minor_version)?;

        Ok(Self {
            name,
            version: semver::Version::new(major, minor, 0),
            path: path.to_path_buf(),
            callbacks: Callbacks {
                start: record.start,
                stop: record.stop,
                process_message: record.process_message,
                process_command: record.process_command,
                process_chat: record.process_chat,
            },
            session: std::ptr::null_mut(),
            state: ExtensionState::Loaded,
            client: None,
            library,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> ExtensionState {
        self.state
    }

    /// True when loaded from a shared object rather than an in-process record.
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }

    pub fn has_session(&self) -> bool {
        !self.session.is_null()
    }

    pub fn has_message_hook(&self) -> bool {
        self.callbacks.process_message.is_some()
    }

    pub fn has_command_hook(&self) -> bool {
        self.callbacks.process_command.is_some()
    }

    pub fn has_chat_hook(&self) -> bool {
        self.callbacks.process_chat.is_some()
    }

    /// Run `start` (if any) with the module's own path and become active.
    pub(crate) fn start(&mut self, client: &SharedClient, path: &CStr) {
        self.client = Some(client.clone());
        if let Some(start) = self.callbacks.start {
            debug!(extension = %self.name, "Calling start");
            let scope = CapabilityScope::enter(client);
            self.session = unsafe { start(scope.handle(), path.as_ptr()) };
        }
        self.state = ExtensionState::Active;
    }

    /// Run `stop` when there is a session to stop.
    pub(crate) fn stop(&mut self) {
        let stop = self.callbacks.stop.filter(|_| !self.session.is_null());
        if let (Some(stop), Some(client)) = (stop, &self.client) {
            debug!(extension = %self.name, "Calling stop");
            let scope = CapabilityScope::enter(client);
            unsafe { stop(scope.handle(), self.session) };
        }
        self.session = std::ptr::null_mut();
        self.state = ExtensionState::Stopped;
    }

    /// Release the library. No callback may run afterwards.
    pub(crate) fn unload(&mut self) {
        self.callbacks = Callbacks::default();
        self.client = None;
        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                warn!(extension = %self.name, error = %e, "Failed to close extension library");
            }
        }
        self.state = ExtensionState::Unloaded;
    }

    pub(crate) fn process_message(&self, client: &SharedClient, msg: &WireMessage) {
        if self.state != ExtensionState::Active {
            return;
        }
        if let Some(hook) = self.callbacks.process_message {
            let scope = CapabilityScope::enter(client);
            unsafe { hook(scope.handle(), self.session, msg) };
        }
    }

    pub(crate) fn process_command(&self, client: &SharedClient, cmd: &WireCommand) {
        if self.state != ExtensionState::Active {
            return;
        }
        if let Some(hook) = self.callbacks.process_command {
            let scope = CapabilityScope::enter(client);
            unsafe { hook(scope.handle(), self.session, cmd) };
        }
    }

    /// Raw outcome of the chat hook, `None` when there is no hook to run.
    pub(crate) fn process_chat(&self, client: &SharedClient, chat: &WireChat) -> Option<c_int> {
        if self.state != ExtensionState::Active {
            return None;
        }
        let hook = self.callbacks.process_chat?;
        let scope = CapabilityScope::enter(client);
        Some(unsafe { hook(scope.handle(), self.session, chat) })
    }
}

impl Drop for ExtensionModule {
    fn drop(&mut self) {
        if self.state == ExtensionState::Active {
            warn!(extension = %self.name, "Extension dropped while active, stopping it");
            self.stop();
            self.unload();
        }
    }
}

impl fmt::Debug for ExtensionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionModule")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("path", &self.path)
            .field("state", &self.state)
            .field("dynamic", &self.library.is_some())
            .finish()
    }
}
