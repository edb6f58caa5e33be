//! Event routing to active extensions, and the [`ExtensionHost`] that owns
//! the loader and registry.
//!
//! Inbound protocol messages are broadcast to every module with a message
//! hook, in registration order. Commands and outgoing chat go to a single
//! module, or through the chat filter chain. No lock is held while any
//! hook runs, so hooks may call back into the host API.

use std::collections::HashSet;
use std::ffi::c_int;
use std::path::{Path, PathBuf};

use parlor_extension_sdk::{ExtensionRecord, ProcessResult};
use tracing::{debug, info, warn};

use super::loader::{discover, ExtensionLoader};
use super::registry::{ExtensionId, ExtensionInfo, ExtensionRegistry};
use crate::client::SharedClient;
use crate::config::{env_vars, HostConfig};
use crate::error::{DispatchError, LoadError, RegistryError};
use crate::marshal::{WireChatBuf, WireCommandBuf, WireMessageBuf};
use crate::message::{Chat, IrcMsg};

/// What happens to an outgoing chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatOutcome {
    #[default]
    Pass,
    Drop,
}

impl ChatOutcome {
    pub fn is_drop(self) -> bool {
        self == Self::Drop
    }

    /// Decode a raw hook result. Unknown values withhold the line.
    fn from_raw(extension: &str, raw: c_int) -> Self {
        match ProcessResult::from_raw(raw) {
            Some(ProcessResult::Pass) => Self::Pass,
            Some(ProcessResult::Drop) => Self::Drop,
            None => {
                warn!(extension, raw, "Unknown chat outcome, dropping line");
                Self::Drop
            }
        }
    }
}

/// Result of [`ExtensionHost::load_configured`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub activated: Vec<ExtensionId>,
    pub failed: Vec<(PathBuf, LoadError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the active extensions of one client.
///
/// Dropping the host deactivates every extension in reverse order.
pub struct ExtensionHost {
    loader: ExtensionLoader,
    registry: ExtensionRegistry,
}

impl ExtensionHost {
    pub fn new(client: SharedClient) -> Self {
        Self {
            loader: ExtensionLoader::new(client),
            registry: ExtensionRegistry::new(),
        }
    }

    pub fn client(&self) -> &SharedClient {
        self.loader.client()
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Load and start the extension object at `path`.
    pub fn activate(&mut self, path: impl AsRef<Path>) -> Result<ExtensionId, LoadError> {
        let module = self.loader.activate(path.as_ref())?;
        Ok(self.registry.insert(module))
    }

    /// Start an extension compiled into this process.
    pub fn activate_static(
        &mut self,
        record: &'static ExtensionRecord,
        label: impl AsRef<Path>,
    ) -> Result<ExtensionId, LoadError> {
        let module = self.loader.activate_static(record, label)?;
        Ok(self.registry.insert(module))
    }

    /// Stop, unload and unregister one extension.
    pub fn deactivate(&mut self, id: ExtensionId) -> Result<ExtensionInfo, LoadError> {
        let mut module = self
            .registry
            .remove(id)
            .map_err(|_| LoadError::NotFound(id.to_string()))?;
        self.loader.deactivate(&mut module)?;
        Ok(ExtensionInfo {
            id,
            name: module.name().to_string(),
            version: module.version().clone(),
            path: module.path().to_path_buf(),
            state: module.state(),
        })
    }

    /// Deliver an inbound message to every message hook in registration order.
    pub fn broadcast(&self, network: &str, msg: &IrcMsg) {
        if !self.registry.iter().any(|(_, m)| m.has_message_hook()) {
            return;
        }
        let buf = WireMessageBuf::new(network, msg);
        debug!(network, command = %msg.command, "Broadcasting message");
        for (_, module) in self.registry.iter() {
            module.process_message(self.client(), buf.as_wire());
        }
    }

    /// Hand a user command to one extension. A missing hook is a no-op.
    pub fn dispatch_command<S: AsRef<str>>(
        &self,
        id: ExtensionId,
        params: &[S],
    ) -> Result<(), DispatchError> {
        let module = self.registry.get(id)?;
        if !module.has_command_hook() {
            debug!(extension = %module.name(), "No command hook");
            return Ok(());
        }
        let buf = WireCommandBuf::new(params);
        module.process_command(self.client(), buf.as_wire());
        Ok(())
    }

    /// Ask one extension about an outgoing chat line.
    pub fn dispatch_chat(&self, id: ExtensionId, chat: &Chat) -> Result<ChatOutcome, DispatchError> {
        let module = self.registry.get(id)?;
        let buf = WireChatBuf::new(chat);
        Ok(module
            .process_chat(self.client(), buf.as_wire())
            .map(|raw| ChatOutcome::from_raw(module.name(), raw))
            .unwrap_or_default())
    }

    /// Run every chat hook in registration order. The first drop wins and
    /// later hooks are not asked.
    pub fn filter_chat(&self, chat: &Chat) -> ChatOutcome {
        let buf = WireChatBuf::new(chat);
        for (_, module) in self.registry.iter() {
            if let Some(raw) = module.process_chat(self.client(), buf.as_wire()) {
                if ChatOutcome::from_raw(module.name(), raw).is_drop() {
                    debug!(extension = %module.name(), target = %chat.target, "Chat withheld");
                    return ChatOutcome::Drop;
                }
            }
        }
        ChatOutcome::Pass
    }

    pub fn extensions(&self) -> Vec<ExtensionInfo> {
        self.registry.infos()
    }

    pub fn info(&self, id: ExtensionId) -> Result<ExtensionInfo, RegistryError> {
        self.registry.info(id)
    }

    pub fn find(&self, name: &str) -> Option<ExtensionId> {
        self.registry.find(name)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Activate configured extensions, then the contents of the extension
    /// directory, then `PARLOR_EXTENSIONS`. Each path is tried once and
    /// failures are collected rather than returned.
    pub fn load_configured(&mut self, config: &HostConfig) -> LoadReport {
        let mut candidates: Vec<PathBuf> = config.enabled().map(Path::to_path_buf).collect();
        if let Some(dir) = &config.extension_dir {
            candidates.extend(discover(dir));
        }
        candidates.extend(env_vars::extra_extensions());

        let mut seen = HashSet::new();
        let mut report = LoadReport::default();
        for path in candidates {
            if !seen.insert(path.clone()) {
                continue;
            }
            match self.activate(&path) {
                Ok(id) => report.activated.push(id),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping extension");
                    report.failed.push((path, e));
                }
            }
        }
        info!(
            activated = report.activated.len(),
            failed = report.failed.len(),
            "Loaded configured extensions"
        );
        report
    }

    /// Deactivate everything, most recently registered first.
    pub fn shutdown(&mut self) {
        while let Some(id) = self.registry.last() {
            if let Err(e) = self.deactivate(id) {
                warn!(id = %id, error = %e, "Failed to deactivate extension");
            }
        }
    }
}

impl Drop for ExtensionHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
