//! Host API imports for Rust-written extensions (feature `host-imports`).
//!
//! These symbols are exported by the client executable and resolved when the
//! extension object is opened. Strings and arrays returned by the host must
//! be released with [`parlor_free_string`] / [`parlor_free_strings`].
//!
//! Every string argument is a [`WireStringLen`] passed by value, the same
//! view the wire structures use.

use std::ffi::{c_char, c_int, CStr};

use crate::extension::HostRef;
use crate::record::PARLOR_OK;
use crate::wire::{HostHandle, WireMessage, WireStringLen};

extern "C" {
    pub fn parlor_send_message(host: *mut HostHandle, msg: *const WireMessage) -> c_int;
    pub fn parlor_print(host: *mut HostHandle, code: c_int, text: WireStringLen) -> c_int;
    pub fn parlor_inject_chat(
        host: *mut HostHandle,
        network: WireStringLen,
        source: WireStringLen,
        target: WireStringLen,
        message: WireStringLen,
    ) -> c_int;
    pub fn parlor_list_networks(host: *mut HostHandle) -> *mut *mut c_char;
    pub fn parlor_list_channels(host: *mut HostHandle, network: WireStringLen) -> *mut *mut c_char;
    pub fn parlor_list_channel_users(
        host: *mut HostHandle,
        network: WireStringLen,
        channel: WireStringLen,
    ) -> *mut *mut c_char;
    pub fn parlor_my_nick(host: *mut HostHandle, network: WireStringLen) -> *mut c_char;
    pub fn parlor_identifier_cmp(a: WireStringLen, b: WireStringLen) -> c_int;
    pub fn parlor_is_channel(
        host: *mut HostHandle,
        network: WireStringLen,
        target: WireStringLen,
    ) -> c_int;
    pub fn parlor_is_logged_on(
        host: *mut HostHandle,
        network: WireStringLen,
        nick: WireStringLen,
    ) -> c_int;
    pub fn parlor_free_string(s: *mut c_char);
    pub fn parlor_free_strings(list: *mut *mut c_char);
}

unsafe fn take_strings(list: *mut *mut c_char) -> Option<Vec<String>> {
    if list.is_null() {
        return None;
    }
    let mut out = Vec::new();
    let mut cursor = list;
    while !(*cursor).is_null() {
        out.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
        cursor = cursor.add(1);
    }
    parlor_free_strings(list);
    Some(out)
}

impl HostRef<'_> {
    pub fn print(&self, code: c_int, text: &str) -> bool {
        unsafe { parlor_print(self.as_ptr(), code, WireStringLen::new(text)) == PARLOR_OK }
    }

    pub fn send_message(&self, msg: &WireMessage) -> bool {
        unsafe { parlor_send_message(self.as_ptr(), msg) == PARLOR_OK }
    }

    pub fn inject_chat(&self, network: &str, source: &str, target: &str, message: &str) -> bool {
        unsafe {
            parlor_inject_chat(
                self.as_ptr(),
                WireStringLen::new(network),
                WireStringLen::new(source),
                WireStringLen::new(target),
                WireStringLen::new(message),
            ) == PARLOR_OK
        }
    }

    pub fn networks(&self) -> Vec<String> {
        unsafe { take_strings(parlor_list_networks(self.as_ptr())) }.unwrap_or_default()
    }

    pub fn channels(&self, network: &str) -> Option<Vec<String>> {
        unsafe {
            take_strings(parlor_list_channels(self.as_ptr(), WireStringLen::new(network)))
        }
    }

    pub fn channel_users(&self, network: &str, channel: &str) -> Option<Vec<String>> {
        unsafe {
            take_strings(parlor_list_channel_users(
                self.as_ptr(),
                WireStringLen::new(network),
                WireStringLen::new(channel),
            ))
        }
    }

    pub fn my_nick(&self, network: &str) -> Option<String> {
        unsafe {
            let raw = parlor_my_nick(self.as_ptr(), WireStringLen::new(network));
            if raw.is_null() {
                return None;
            }
            let nick = CStr::from_ptr(raw).to_string_lossy().into_owned();
            parlor_free_string(raw);
            Some(nick)
        }
    }
}
