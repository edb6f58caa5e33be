//! Host-native message types.
//!
//! These are what the client works with. The marshaling layer turns them
//! into borrowed wire views for the duration of one callback, and turns
//! wire views handed in by extensions back into these owned values.

use serde::{Deserialize, Serialize};

/// A message tag. Valueless tags carry an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Sender identity of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserInfo {
    pub nick: String,
    pub user: Option<String>,
    pub host: Option<String>,
}

impl UserInfo {
    /// Build an identity. Empty `user` / `host` become `None`.
    pub fn new(nick: impl Into<String>, user: Option<String>, host: Option<String>) -> Self {
        Self {
            nick: nick.into(),
            user: user.filter(|u| !u.is_empty()),
            host: host.filter(|h| !h.is_empty()),
        }
    }

    /// An identity that is only a nick (or a server name).
    pub fn nick(nick: impl Into<String>) -> Self {
        Self::new(nick, None, None)
    }
}

/// An IRC protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IrcMsg {
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub prefix: Option<UserInfo>,
    pub command: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl IrcMsg {
    /// A message without tags or prefix.
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: Vec::new(),
            prefix: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_prefix(mut self, prefix: UserInfo) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// A chat line composed locally and about to be sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub network: String,
    pub target: String,
    pub message: String,
}

impl Chat {
    pub fn new(
        network: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            network: network.into(),
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Severity of a line printed into the client's status window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Error,
}

impl Severity {
    /// Decode a `print` code. Zero is normal, everything else an error.
    pub fn from_code(code: std::ffi::c_int) -> Self {
        if code == parlor_extension_sdk::NORMAL_MESSAGE {
            Self::Normal
        } else {
            Self::Error
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Error => write!(f, "error"),
        }
    }
}
