//! Conversion between host-native values and wire structures.
//!
//! Outbound buffers ([`WireMessageBuf`], [`WireCommandBuf`], [`WireChatBuf`])
//! borrow the native value and are meant to live for exactly one call into
//! an extension. Inbound conversion copies every byte into host-owned
//! strings before returning, and fails as a whole on the first bad field.

use std::ffi::{c_char, CString};
use std::marker::PhantomData;

use parlor_extension_sdk::{WireChat, WireCommand, WireMessage, WireStringLen};

use crate::error::MarshalError;
use crate::message::{Chat, IrcMsg, Tag, UserInfo};

fn opt_wire(s: &Option<String>) -> WireStringLen {
    s.as_deref().map(WireStringLen::new).unwrap_or(WireStringLen::EMPTY)
}

/// Wire view of an [`IrcMsg`] received on `network`.
pub struct WireMessageBuf<'a> {
    wire: WireMessage,
    // The wire struct points into these heap buffers.
    _params: Vec<WireStringLen>,
    _tagkeys: Vec<WireStringLen>,
    _tagvals: Vec<WireStringLen>,
    _borrow: PhantomData<&'a IrcMsg>,
}

impl<'a> WireMessageBuf<'a> {
    pub fn new(network: &'a str, msg: &'a IrcMsg) -> Self {
        let params: Vec<WireStringLen> = msg.params.iter().map(|p| WireStringLen::new(p)).collect();
        let tagkeys: Vec<WireStringLen> = msg.tags.iter().map(|t| WireStringLen::new(&t.key)).collect();
        let tagvals: Vec<WireStringLen> =
            msg.tags.iter().map(|t| WireStringLen::new(&t.value)).collect();

        let (prefix_nick, prefix_user, prefix_host) = match &msg.prefix {
            Some(info) => (
                WireStringLen::new(&info.nick),
                opt_wire(&info.user),
                opt_wire(&info.host),
            ),
            None => (WireStringLen::EMPTY, WireStringLen::EMPTY, WireStringLen::EMPTY),
        };

        let wire = WireMessage {
            network: WireStringLen::new(network),
            prefix_nick,
            prefix_user,
            prefix_host,
            command: WireStringLen::new(&msg.command),
            params: params.as_ptr(),
            params_n: params.len(),
            tagkeys: tagkeys.as_ptr(),
            tagvals: tagvals.as_ptr(),
            tags_n: tagkeys.len(),
        };

        Self {
            wire,
            _params: params,
            _tagkeys: tagkeys,
            _tagvals: tagvals,
            _borrow: PhantomData,
        }
    }

    pub fn as_wire(&self) -> &WireMessage {
        &self.wire
    }
}

/// Wire view of a command's parameter list.
pub struct WireCommandBuf<'a> {
    wire: WireCommand,
    _params: Vec<WireStringLen>,
    _borrow: PhantomData<&'a [String]>,
}

impl<'a> WireCommandBuf<'a> {
    pub fn new<S: AsRef<str>>(params: &'a [S]) -> Self {
        let views: Vec<WireStringLen> = params.iter().map(|p| WireStringLen::new(p.as_ref())).collect();
        let wire = WireCommand {
            params: views.as_ptr(),
            params_n: views.len(),
        };
        Self {
            wire,
            _params: views,
            _borrow: PhantomData,
        }
    }

    pub fn as_wire(&self) -> &WireCommand {
        &self.wire
    }
}

/// Wire view of an outgoing chat line.
pub struct WireChatBuf<'a> {
    wire: WireChat,
    _borrow: PhantomData<&'a Chat>,
}

impl<'a> WireChatBuf<'a> {
    pub fn new(chat: &'a Chat) -> Self {
        Self {
            wire: WireChat {
                network: WireStringLen::new(&chat.network),
                target: WireStringLen::new(&chat.target),
                message: WireStringLen::new(&chat.message),
            },
            _borrow: PhantomData,
        }
    }

    pub fn as_wire(&self) -> &WireChat {
        &self.wire
    }
}

/// Copy a wire string into an owned `String`, strictly decoding UTF-8.
///
/// # Safety
/// A non-null `s.str` must point to `s.len` readable bytes.
pub unsafe fn string_from_wire(
    s: WireStringLen,
    field: &'static str,
) -> Result<String, MarshalError> {
    if s.len == 0 {
        return Ok(String::new());
    }
    if s.len > isize::MAX as usize {
        return Err(MarshalError::InvalidLength { field, len: s.len });
    }
    if s.str.is_null() {
        return Err(MarshalError::NullPointer { field });
    }
    let bytes = std::slice::from_raw_parts(s.str.cast::<u8>(), s.len);
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| MarshalError::InvalidUtf8 { field })
}

unsafe fn array_from_wire<'a>(
    ptr: *const WireStringLen,
    n: usize,
    field: &'static str,
) -> Result<&'a [WireStringLen], MarshalError> {
    if n == 0 {
        return Ok(&[]);
    }
    if n > isize::MAX as usize / std::mem::size_of::<WireStringLen>() {
        return Err(MarshalError::InvalidLength { field, len: n });
    }
    if ptr.is_null() {
        return Err(MarshalError::NullPointer { field });
    }
    Ok(std::slice::from_raw_parts(ptr, n))
}

unsafe fn strings_from_wire(
    ptr: *const WireStringLen,
    n: usize,
    field: &'static str,
) -> Result<Vec<String>, MarshalError> {
    array_from_wire(ptr, n, field)?
        .iter()
        .map(|s| string_from_wire(*s, field))
        .collect()
}

/// Decode a wire message into its network name and an owned [`IrcMsg`].
///
/// An all-empty sender triple decodes to no prefix.
///
/// # Safety
/// Every pointer in `wire` must be valid for its declared length or count.
pub unsafe fn message_from_wire(wire: &WireMessage) -> Result<(String, IrcMsg), MarshalError> {
    let network = string_from_wire(wire.network, "network")?;
    let nick = string_from_wire(wire.prefix_nick, "prefix_nick")?;
    let user = string_from_wire(wire.prefix_user, "prefix_user")?;
    let host = string_from_wire(wire.prefix_host, "prefix_host")?;
    let command = string_from_wire(wire.command, "command")?;
    let params = strings_from_wire(wire.params, wire.params_n, "params")?;
    let keys = strings_from_wire(wire.tagkeys, wire.tags_n, "tagkeys")?;
    let vals = strings_from_wire(wire.tagvals, wire.tags_n, "tagvals")?;

    let prefix = if nick.is_empty() && user.is_empty() && host.is_empty() {
        None
    } else {
        Some(UserInfo::new(nick, Some(user), Some(host)))
    };

    let tags = keys
        .into_iter()
        .zip(vals)
        .map(|(key, value)| Tag { key, value })
        .collect();

    Ok((
        network,
        IrcMsg {
            tags,
            prefix,
            command,
            params,
        },
    ))
}

/// # Safety
/// `wire.params` must be valid for `wire.params_n` entries.
pub unsafe fn command_from_wire(wire: &WireCommand) -> Result<Vec<String>, MarshalError> {
    strings_from_wire(wire.params, wire.params_n, "params")
}

/// # Safety
/// Every string in `wire` must be valid for its length.
pub unsafe fn chat_from_wire(wire: &WireChat) -> Result<Chat, MarshalError> {
    Ok(Chat {
        network: string_from_wire(wire.network, "network")?,
        target: string_from_wire(wire.target, "target")?,
        message: string_from_wire(wire.message, "message")?,
    })
}

/// Hand a NUL-terminated copy of `s` to foreign code.
/// Release it with [`release_string`].
pub fn export_string(s: &str) -> Result<*mut c_char, MarshalError> {
    CString::new(s)
        .map(CString::into_raw)
        .map_err(|_| MarshalError::InteriorNul { field: "string" })
}

/// Hand a NULL-terminated array of NUL-terminated copies to foreign code.
/// Release it with [`release_string_array`].
pub fn export_string_array<I, S>(items: I) -> Result<*mut *mut c_char, MarshalError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let owned = items
        .into_iter()
        .map(|s| CString::new(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| MarshalError::InteriorNul {
            field: "string_array",
        })?;

    let mut raw: Vec<*mut c_char> = owned.into_iter().map(CString::into_raw).collect();
    raw.push(std::ptr::null_mut());
    let slice = Box::into_raw(raw.into_boxed_slice());
    Ok(slice.cast::<*mut c_char>())
}

/// Free a string from [`export_string`]. Null is ignored.
///
/// # Safety
/// `s` must come from [`export_string`] and not have been released yet.
pub unsafe fn release_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free an array from [`export_string_array`]. Null is ignored.
///
/// # Safety
/// `list` must come from [`export_string_array`] and not have been
/// released yet.
pub unsafe fn release_string_array(list: *mut *mut c_char) {
    if list.is_null() {
        return;
    }
    let mut n = 0;
    while !(*list.add(n)).is_null() {
        drop(CString::from_raw(*list.add(n)));
        n += 1;
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(list, n + 1)));
}
