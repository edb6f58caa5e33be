//! Host API entry points exported to extensions.
//!
//! Every function validates its handle, copies its arguments into host
//! memory, locks the client only for its own body and converts any failure
//! (including a panic) into the documented failure value. Every string
//! argument is a [`WireStringLen`] passed by value. Strings and arrays
//! handed out are released with [`parlor_free_string`] and
//! [`parlor_free_strings`].

use std::ffi::{c_char, c_int};
use std::ptr;

use tracing::{debug, error, warn};

use parlor_extension_sdk::{HostHandle, WireMessage, WireStringLen, PARLOR_FAIL, PARLOR_OK};

use crate::casemap::identifier_compare_bytes;
use crate::client::{ClientState, SharedClient};
use crate::error::{HostApiError, MarshalError};
use crate::extension::safety::{contain, contain_or};
use crate::host::capability::resolve;
use crate::marshal::{
    export_string, export_string_array, message_from_wire, release_string, release_string_array,
    string_from_wire,
};
use crate::message::Severity;

/// Run a host API body, mapping errors and panics to `failure`.
fn boundary<T>(call: &'static str, failure: T, body: impl FnOnce() -> Result<T, HostApiError>) -> T {
    match contain(body) {
        Ok(Ok(value)) => value,
        Ok(Err(e @ (HostApiError::UnknownNetwork(_) | HostApiError::UnknownChannel { .. }))) => {
            debug!(call, error = %e, "Host API call failed");
            failure
        }
        Ok(Err(e)) => {
            warn!(call, error = %e, "Host API call rejected");
            failure
        }
        Err(reason) => {
            error!(call, error = %HostApiError::Fault(reason), "Host API call faulted");
            failure
        }
    }
}

/// Lock the client for the duration of `f`.
///
/// The mutex is not reentrant; `f` must not call back into extension code.
fn locked<T>(client: &SharedClient, f: impl FnOnce(&mut dyn ClientState) -> T) -> T {
    let mut state = client.lock();
    f(&mut *state)
}

fn require_network(state: &dyn ClientState, network: &str) -> Result<(), HostApiError> {
    if state.is_connected(network) {
        Ok(())
    } else {
        Err(HostApiError::UnknownNetwork(network.to_string()))
    }
}

/// Send a protocol message on the network named in `msg`.
///
/// Returns `PARLOR_OK`, or `PARLOR_FAIL` for an unknown network, an invalid
/// handle or malformed message data.
#[no_mangle]
pub unsafe extern "C" fn parlor_send_message(host: *mut HostHandle, msg: *const WireMessage) -> c_int {
    boundary("send_message", PARLOR_FAIL, || {
        let client = resolve(host)?;
        let wire = msg
            .as_ref()
            .ok_or(MarshalError::NullPointer { field: "message" })?;
        let (network, msg) = message_from_wire(wire)?;
        locked(&client, |state| {
            require_network(state, &network)?;
            state.send(&network, msg)?;
            Ok(PARLOR_OK)
        })
    })
}

/// Print a line to the status window. `code` 0 is normal, anything else an
/// error line.
#[no_mangle]
pub unsafe extern "C" fn parlor_print(host: *mut HostHandle, code: c_int, text: WireStringLen) -> c_int {
    boundary("print", PARLOR_FAIL, || {
        let client = resolve(host)?;
        let text = string_from_wire(text, "text")?;
        locked(&client, |state| state.print(Severity::from_code(code), &text));
        Ok(PARLOR_OK)
    })
}

/// Display a chat line from `source` to `target` as if it had been received.
#[no_mangle]
pub unsafe extern "C" fn parlor_inject_chat(
    host: *mut HostHandle,
    network: WireStringLen,
    source: WireStringLen,
    target: WireStringLen,
    message: WireStringLen,
) -> c_int {
    boundary("inject_chat", PARLOR_FAIL, || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let source = string_from_wire(source, "source")?;
        let target = string_from_wire(target, "target")?;
        let message = string_from_wire(message, "message")?;
        locked(&client, |state| {
            require_network(state, &network)?;
            state.inject_chat(&network, &source, &target, &message)?;
            Ok(PARLOR_OK)
        })
    })
}

/// NULL-terminated array of connected network names. Never null for a
/// live handle.
#[no_mangle]
pub unsafe extern "C" fn parlor_list_networks(host: *mut HostHandle) -> *mut *mut c_char {
    boundary("list_networks", ptr::null_mut(), || {
        let client = resolve(host)?;
        let networks: Vec<String> = locked(&client, |state| {
            state
                .networks()
                .into_iter()
                .filter(|n| state.is_connected(n))
                .collect()
        });
        Ok(export_string_array(networks)?)
    })
}

/// Joined channels on `network`, or null when it is not connected.
#[no_mangle]
pub unsafe extern "C" fn parlor_list_channels(
    host: *mut HostHandle,
    network: WireStringLen,
) -> *mut *mut c_char {
    boundary("list_channels", ptr::null_mut(), || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let channels = locked(&client, |state| {
            require_network(state, &network)?;
            state
                .channels(&network)
                .ok_or_else(|| HostApiError::UnknownNetwork(network.clone()))
        })?;
        Ok(export_string_array(channels)?)
    })
}

/// Members of `channel` on `network`, or null when either is unknown.
#[no_mangle]
pub unsafe extern "C" fn parlor_list_channel_users(
    host: *mut HostHandle,
    network: WireStringLen,
    channel: WireStringLen,
) -> *mut *mut c_char {
    boundary("list_channel_users", ptr::null_mut(), || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let channel = string_from_wire(channel, "channel")?;
        let users = locked(&client, |state| {
            require_network(state, &network)?;
            state
                .channel_users(&network, &channel)
                .ok_or_else(|| HostApiError::UnknownChannel {
                    network: network.clone(),
                    channel: channel.clone(),
                })
        })?;
        Ok(export_string_array(users)?)
    })
}

/// Own nick on `network`, or null when not connected.
#[no_mangle]
pub unsafe extern "C" fn parlor_my_nick(host: *mut HostHandle, network: WireStringLen) -> *mut c_char {
    boundary("my_nick", ptr::null_mut(), || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let nick = locked(&client, |state| state.my_nick(&network))
            .ok_or(HostApiError::UnknownNetwork(network))?;
        Ok(export_string(&nick)?)
    })
}

/// Compare two identifiers under rfc1459 casemapping: -1, 0 or 1.
///
/// Needs no handle. Unreadable input compares equal and is logged.
#[no_mangle]
pub unsafe extern "C" fn parlor_identifier_cmp(a: WireStringLen, b: WireStringLen) -> c_int {
    boundary("identifier_cmp", 0, || {
        let a = a.as_bytes().ok_or(MarshalError::NullPointer { field: "a" })?;
        let b = b.as_bytes().ok_or(MarshalError::NullPointer { field: "b" })?;
        Ok(identifier_compare_bytes(a, b) as c_int)
    })
}

/// 1 when `target` names a channel on `network`, else 0.
#[no_mangle]
pub unsafe extern "C" fn parlor_is_channel(
    host: *mut HostHandle,
    network: WireStringLen,
    target: WireStringLen,
) -> c_int {
    boundary("is_channel", 0, || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let target = string_from_wire(target, "target")?;
        Ok(locked(&client, |state| state.is_channel(&network, &target)) as c_int)
    })
}

/// 1 when `nick` shares a channel with us on `network`, else 0.
#[no_mangle]
pub unsafe extern "C" fn parlor_is_logged_on(
    host: *mut HostHandle,
    network: WireStringLen,
    nick: WireStringLen,
) -> c_int {
    boundary("is_logged_on", 0, || {
        let client = resolve(host)?;
        let network = string_from_wire(network, "network")?;
        let nick = string_from_wire(nick, "nick")?;
        Ok(locked(&client, |state| state.is_logged_on(&network, &nick)) as c_int)
    })
}

/// Release a string returned by [`parlor_my_nick`].
#[no_mangle]
pub unsafe extern "C" fn parlor_free_string(s: *mut c_char) {
    contain_or("free_string", (), || release_string(s))
}

/// Release an array returned by one of the list calls.
#[no_mangle]
pub unsafe extern "C" fn parlor_free_strings(list: *mut *mut c_char) {
    contain_or("free_strings", (), || release_string_array(list))
}

/// Name and address of every exported entry point.
///
/// Referencing this from an executable also keeps the entry points linked.
pub fn entry_points() -> Vec<(&'static str, usize)> {
    vec![
        ("parlor_send_message", parlor_send_message as usize),
        ("parlor_print", parlor_print as usize),
        ("parlor_inject_chat", parlor_inject_chat as usize),
        ("parlor_list_networks", parlor_list_networks as usize),
        ("parlor_list_channels", parlor_list_channels as usize),
        ("parlor_list_channel_users", parlor_list_channel_users as usize),
        ("parlor_my_nick", parlor_my_nick as usize),
        ("parlor_identifier_cmp", parlor_identifier_cmp as usize),
        ("parlor_is_channel", parlor_is_channel as usize),
        ("parlor_is_logged_on", parlor_is_logged_on as usize),
        ("parlor_free_string", parlor_free_string as usize),
        ("parlor_free_strings", parlor_free_strings as usize),
    ]
}
