//! The client-state collaborator reached by the host API.
//!
//! The extension subsystem does not own connections, windows or channel
//! membership. It reaches them through [`ClientState`], shared behind a
//! single `parking_lot::Mutex` ([`SharedClient`]).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::casemap::identifier_eq;
use crate::error::ClientError;
use crate::message::{IrcMsg, Severity};

/// Effects and queries the host API forwards to the running client.
pub trait ClientState: Send {
    fn is_connected(&self, network: &str) -> bool;

    /// Queue `msg` for sending on `network`.
    fn send(&mut self, network: &str, msg: IrcMsg) -> Result<(), ClientError>;

    /// Show a line in the status window.
    fn print(&mut self, severity: Severity, text: &str);

    /// Display a chat line as if it had been received.
    fn inject_chat(
        &mut self,
        network: &str,
        source: &str,
        target: &str,
        message: &str,
    ) -> Result<(), ClientError>;

    /// Currently connected networks. A disconnected network is not listed.
    fn networks(&self) -> Vec<String>;

    /// Joined channels, or `None` for an unknown network.
    fn channels(&self, network: &str) -> Option<Vec<String>>;

    /// Members of a channel, or `None` for an unknown network or channel.
    fn channel_users(&self, network: &str, channel: &str) -> Option<Vec<String>>;

    /// Own nick, or `None` when not connected.
    fn my_nick(&self, network: &str) -> Option<String>;

    fn is_channel(&self, _network: &str, target: &str) -> bool {
        target.starts_with(['#', '&'])
    }

    /// Whether `nick` shares at least one channel with us.
    fn is_logged_on(&self, network: &str, nick: &str) -> bool {
        self.channels(network)
            .unwrap_or_default()
            .iter()
            .filter_map(|chan| self.channel_users(network, chan))
            .any(|users| users.iter().any(|u| identifier_eq(u, nick)))
    }
}

/// Client state shared between the host and every host API call.
///
/// `parking_lot::Mutex` is not reentrant. It is locked only inside a
/// single host API body and never while extension code runs.
pub type SharedClient = Arc<Mutex<dyn ClientState>>;

/// Wrap a client for sharing with an [`ExtensionHost`](crate::ExtensionHost).
pub fn shared<C: ClientState + 'static>(client: C) -> SharedClient {
    Arc::new(Mutex::new(client))
}

/// A chat line injected by an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedChat {
    pub network: String,
    pub source: String,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct Channel {
    name: String,
    users: Vec<String>,
}

#[derive(Debug, Clone)]
struct Network {
    name: String,
    nick: String,
    connected: bool,
    channels: Vec<Channel>,
}

/// In-memory [`ClientState`] that records every effect.
#[derive(Debug, Default)]
pub struct MemoryClient {
    networks: Vec<Network>,
    sent: Vec<(String, IrcMsg)>,
    printed: Vec<(Severity, String)>,
    injected: Vec<InjectedChat>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connected network.
    pub fn with_network(mut self, name: impl Into<String>, nick: impl Into<String>) -> Self {
        self.networks.push(Network {
            name: name.into(),
            nick: nick.into(),
            connected: true,
            channels: Vec::new(),
        });
        self
    }

    /// Join a channel on an existing network. Our own nick is always a member.
    pub fn with_channel<I, S>(mut self, network: &str, channel: impl Into<String>, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(net) = self.network_mut(network) {
            let mut members: Vec<String> = users.into_iter().map(Into::into).collect();
            if !members.iter().any(|u| identifier_eq(u, &net.nick)) {
                members.insert(0, net.nick.clone());
            }
            net.channels.push(Channel {
                name: channel.into(),
                users: members,
            });
        }
        self
    }

    /// Mark a network as disconnected. Its channels are kept.
    pub fn disconnect(&mut self, network: &str) {
        if let Some(net) = self.network_mut(network) {
            net.connected = false;
        }
    }

    pub fn sent(&self) -> &[(String, IrcMsg)] {
        &self.sent
    }

    pub fn printed(&self) -> &[(Severity, String)] {
        &self.printed
    }

    pub fn injected(&self) -> &[InjectedChat] {
        &self.injected
    }

    fn network(&self, name: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.name == name)
    }

    fn network_mut(&mut self, name: &str) -> Option<&mut Network> {
        self.networks.iter_mut().find(|n| n.name == name)
    }
}

impl ClientState for MemoryClient {
    fn is_connected(&self, network: &str) -> bool {
        self.network(network).is_some_and(|n| n.connected)
    }

    fn send(&mut self, network: &str, msg: IrcMsg) -> Result<(), ClientError> {
        if !self.is_connected(network) {
            return Err(ClientError::UnknownNetwork(network.to_string()));
        }
        tracing::debug!(network, command = %msg.command, "Queued message");
        self.sent.push((network.to_string(), msg));
        Ok(())
    }

    fn print(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Normal => tracing::info!(target: "parlor::status", "{}", text),
            Severity::Error => tracing::warn!(target: "parlor::status", "{}", text),
        }
        self.printed.push((severity, text.to_string()));
    }

    fn inject_chat(
        &mut self,
        network: &str,
        source: &str,
        target: &str,
        message: &str,
    ) -> Result<(), ClientError> {
        if !self.is_connected(network) {
            return Err(ClientError::UnknownNetwork(network.to_string()));
        }
        if target.is_empty() {
            return Err(ClientError::UnknownTarget(target.to_string()));
        }
        self.injected.push(InjectedChat {
            network: network.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn networks(&self) -> Vec<String> {
        self.networks
            .iter()
            .filter(|n| n.connected)
            .map(|n| n.name.clone())
            .collect()
    }

    fn channels(&self, network: &str) -> Option<Vec<String>> {
        self.network(network)
            .map(|n| n.channels.iter().map(|c| c.name.clone()).collect())
    }

    fn channel_users(&self, network: &str, channel: &str) -> Option<Vec<String>> {
        self.network(network)?
            .channels
            .iter()
            .find(|c| identifier_eq(&c.name, channel))
            .map(|c| c.users.clone())
    }

    fn my_nick(&self, network: &str) -> Option<String> {
        self.network(network)
            .filter(|n| n.connected)
            .map(|n| n.nick.clone())
    }
}
