//! Host API behaviour as seen from extension code.

use std::ffi::{c_char, CStr};
use std::sync::Arc;

use parking_lot::Mutex;
use parlor_core::client::shared;
use parlor_core::host::api::*;
use parlor_core::host::CapabilityScope;
use parlor_core::marshal::WireMessageBuf;
use parlor_core::{
    ClientError, ClientState, IrcMsg, MemoryClient, Severity, SharedClient, UserInfo,
};
use parlor_extension_sdk::{HostHandle, WireStringLen, ERROR_MESSAGE, PARLOR_FAIL, PARLOR_OK};

fn memory() -> Arc<Mutex<MemoryClient>> {
    Arc::new(Mutex::new(
        MemoryClient::new()
            .with_network("libera", "parlor")
            .with_channel("libera", "#rust", ["alice", "bob"])
            .with_network("oftc", "parlor"),
    ))
}

fn scope(memory: &Arc<Mutex<MemoryClient>>) -> CapabilityScope {
    let client: SharedClient = memory.clone();
    CapabilityScope::enter(&client)
}

unsafe fn take_list(list: *mut *mut c_char) -> Vec<String> {
    assert!(!list.is_null());
    let mut out = Vec::new();
    let mut i = 0;
    while !(*list.add(i)).is_null() {
        out.push(CStr::from_ptr(*list.add(i)).to_str().unwrap().to_string());
        i += 1;
    }
    parlor_free_strings(list);
    out
}

fn arg(s: &str) -> WireStringLen {
    WireStringLen::new(s)
}

#[test]
fn test_send_message_to_unknown_network_fails() {
    let memory = memory();
    let scope = scope(&memory);
    let msg = IrcMsg::new("PRIVMSG", ["#rust", "hi"]);
    let buf = WireMessageBuf::new("efnet", &msg);

    let status = unsafe { parlor_send_message(scope.handle(), buf.as_wire()) };
    assert_eq!(status, PARLOR_FAIL);
    assert!(memory.lock().sent().is_empty());
}

#[test]
fn test_send_message_on_connected_network_is_observed_once() {
    let memory = memory();
    let scope = scope(&memory);
    let msg = IrcMsg::new("PRIVMSG", ["#rust", "hi"])
        .with_prefix(UserInfo::nick("parlor"))
        .with_tag("label", "42");
    let buf = WireMessageBuf::new("libera", &msg);

    let status = unsafe { parlor_send_message(scope.handle(), buf.as_wire()) };
    assert_eq!(status, PARLOR_OK);

    let client = memory.lock();
    assert_eq!(client.sent().len(), 1);
    assert_eq!(client.sent()[0], ("libera".to_string(), msg));
}

#[test]
fn test_list_channels_distinguishes_unknown_from_empty() {
    let memory = memory();
    let scope = scope(&memory);
    unsafe {
        assert!(parlor_list_channels(scope.handle(), arg("efnet")).is_null());
        assert_eq!(
            take_list(parlor_list_channels(scope.handle(), arg("oftc"))),
            Vec::<String>::new()
        );
        assert_eq!(
            take_list(parlor_list_channels(scope.handle(), arg("libera"))),
            vec!["#rust"]
        );
    }
}

#[test]
fn test_list_networks_and_users() {
    let memory = memory();
    let scope = scope(&memory);
    unsafe {
        assert_eq!(take_list(parlor_list_networks(scope.handle())), vec!["libera", "oftc"]);
        assert_eq!(
            take_list(parlor_list_channel_users(scope.handle(), arg("libera"), arg("#Rust"))),
            vec!["parlor", "alice", "bob"]
        );
        assert!(parlor_list_channel_users(scope.handle(), arg("efnet"), arg("#Rust")).is_null());
        assert!(parlor_list_channel_users(scope.handle(), arg("libera"), arg("#go")).is_null());
    }
}

#[test]
fn test_print_severity_and_invalid_utf8() {
    let memory = memory();
    let scope = scope(&memory);
    let bad = [b'o', b'k', 0xc0];
    unsafe {
        assert_eq!(
            parlor_print(scope.handle(), ERROR_MESSAGE, WireStringLen::new("failed")),
            PARLOR_OK
        );
        let invalid = WireStringLen {
            str: bad.as_ptr().cast(),
            len: bad.len(),
        };
        assert_eq!(parlor_print(scope.handle(), 0, invalid), PARLOR_FAIL);
        let dangling = WireStringLen {
            str: std::ptr::null(),
            len: 3,
        };
        assert_eq!(parlor_print(scope.handle(), 0, dangling), PARLOR_FAIL);
    }
    assert_eq!(
        memory.lock().printed(),
        &[(Severity::Error, "failed".to_string())]
    );
}

#[test]
fn test_inject_chat() {
    let memory = memory();
    let scope = scope(&memory);
    let (source, target, text) = (arg("alice"), arg("#rust"), arg("decrypted text"));
    let status = unsafe { parlor_inject_chat(scope.handle(), arg("libera"), source, target, text) };
    assert_eq!(status, PARLOR_OK);

    let status = unsafe { parlor_inject_chat(scope.handle(), arg("efnet"), source, target, text) };
    assert_eq!(status, PARLOR_FAIL);

    let client = memory.lock();
    assert_eq!(client.injected().len(), 1);
    assert_eq!(client.injected()[0].message, "decrypted text");
    assert_eq!(client.injected()[0].source, "alice");
}

#[test]
fn test_channel_and_logged_on_predicates() {
    let memory = memory();
    let scope = scope(&memory);
    let libera = arg("libera");
    unsafe {
        assert_eq!(parlor_is_channel(scope.handle(), libera, arg("#rust")), 1);
        assert_eq!(parlor_is_channel(scope.handle(), libera, arg("alice")), 0);
        assert_eq!(parlor_is_logged_on(scope.handle(), libera, arg("BOB")), 1);
        assert_eq!(parlor_is_logged_on(scope.handle(), libera, arg("carol")), 0);
    }
}

#[test]
fn test_my_nick_not_connected_is_null() {
    let memory = memory();
    memory.lock().disconnect("oftc");
    let scope = scope(&memory);
    unsafe {
        assert!(parlor_my_nick(scope.handle(), arg("oftc")).is_null());

        let nick = parlor_my_nick(scope.handle(), arg("libera"));
        assert_eq!(CStr::from_ptr(nick).to_str().unwrap(), "parlor");
        parlor_free_string(nick);
    }
}

#[test]
fn test_disconnected_network_is_not_listed() {
    let memory = memory();
    memory.lock().disconnect("libera");
    let scope = scope(&memory);
    unsafe {
        assert_eq!(take_list(parlor_list_networks(scope.handle())), vec!["oftc"]);
        assert!(parlor_my_nick(scope.handle(), arg("libera")).is_null());
        assert!(parlor_list_channels(scope.handle(), arg("libera")).is_null());
        assert!(parlor_list_channel_users(scope.handle(), arg("libera"), arg("#rust")).is_null());
    }
}

// Reports every network as known, leaving connectivity to `is_connected`.
struct EveryNetwork;

impl ClientState for EveryNetwork {
    fn is_connected(&self, network: &str) -> bool {
        network == "up"
    }
    fn send(&mut self, _: &str, _: IrcMsg) -> Result<(), ClientError> {
        Ok(())
    }
    fn print(&mut self, _: Severity, _: &str) {}
    fn inject_chat(&mut self, _: &str, _: &str, _: &str, _: &str) -> Result<(), ClientError> {
        Ok(())
    }
    fn networks(&self) -> Vec<String> {
        vec!["down".to_string(), "up".to_string()]
    }
    fn channels(&self, _: &str) -> Option<Vec<String>> {
        Some(Vec::new())
    }
    fn channel_users(&self, _: &str, _: &str) -> Option<Vec<String>> {
        None
    }
    fn my_nick(&self, _: &str) -> Option<String> {
        None
    }
}

#[test]
fn test_list_networks_filters_by_connection() {
    let client = shared(EveryNetwork);
    let scope = CapabilityScope::enter(&client);
    unsafe {
        assert_eq!(take_list(parlor_list_networks(scope.handle())), vec!["up"]);
        assert!(parlor_list_channels(scope.handle(), arg("down")).is_null());
    }
}

#[test]
fn test_stale_handle_yields_failure_values() {
    let memory = memory();
    let stale: *mut HostHandle = {
        let scope = scope(&memory);
        scope.handle()
    };
    let _current = scope(&memory);
    let msg = IrcMsg::new("PRIVMSG", ["#rust", "late"]);
    let buf = WireMessageBuf::new("libera", &msg);

    unsafe {
        assert_eq!(parlor_send_message(stale, buf.as_wire()), PARLOR_FAIL);
        assert_eq!(parlor_print(stale, 0, WireStringLen::new("late")), PARLOR_FAIL);
        assert!(parlor_list_networks(stale).is_null());
        assert!(parlor_list_channels(stale, arg("libera")).is_null());
        assert!(parlor_my_nick(stale, arg("libera")).is_null());
        assert!(parlor_list_networks(std::ptr::null_mut()).is_null());
    }
    let client = memory.lock();
    assert!(client.sent().is_empty());
    assert!(client.printed().is_empty());
}

#[test]
fn test_identifier_cmp_is_handle_free() {
    unsafe {
        let alice = arg("Alice[m]");
        let bob = arg("bob");
        assert_eq!(parlor_identifier_cmp(alice, arg("alice{M}")), 0);
        assert_eq!(parlor_identifier_cmp(alice, bob), -1);
        assert_eq!(parlor_identifier_cmp(bob, alice), 1);
        assert_eq!(parlor_identifier_cmp(WireStringLen::EMPTY, WireStringLen::EMPTY), 0);
    }
}
