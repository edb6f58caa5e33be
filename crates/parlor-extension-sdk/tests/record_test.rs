//! Integration tests for the exported extension record.

use std::ffi::CStr;
use std::path::Path;

use parlor_extension_sdk::prelude::*;
use parlor_extension_sdk::{ExtensionRecord, WireStringLen, DROP_MESSAGE, PASS_MESSAGE};

struct Filter {
    blocked: String,
}

impl Extension for Filter {
    fn start(_host: HostRef<'_>, path: &Path) -> Option<Self> {
        let blocked = path.file_stem()?.to_str()?.to_string();
        Some(Filter { blocked })
    }

    fn on_chat(&mut self, _host: HostRef<'_>, chat: &WireChat) -> ProcessResult {
        let target = unsafe { chat.target.as_str() }.unwrap_or_default();
        if target == self.blocked {
            ProcessResult::Drop
        } else {
            ProcessResult::Pass
        }
    }
}

declare_extension!(Filter, "filter", 2, 5);

fn exported() -> &'static ExtensionRecord {
    &parlor_extension
}

#[test]
fn test_exported_record_metadata() {
    let record = exported();
    let name = unsafe { CStr::from_ptr(record.name) };
    assert_eq!(name.to_str().unwrap(), "filter");
    assert_eq!(record.major_version, 2);
    assert_eq!(record.minor_version, 5);
}

#[test]
fn test_exported_record_has_all_callbacks() {
    let record = exported();
    assert!(record.start.is_some());
    assert!(record.stop.is_some());
    assert!(record.process_message.is_some());
    assert!(record.process_command.is_some());
    assert!(record.process_chat.is_some());
}

#[test]
fn test_start_without_usable_path_yields_no_session() {
    let record = exported();
    let session = unsafe { (record.start.unwrap())(std::ptr::null_mut(), std::ptr::null()) };
    assert!(session.is_null());
}

#[test]
fn test_chat_filter_uses_session_state() {
    let record = exported();
    let path = c"/opt/parlor/#secret.so";
    unsafe {
        let session = (record.start.unwrap())(std::ptr::null_mut(), path.as_ptr());
        assert!(!session.is_null());

        let chat_fn = record.process_chat.unwrap();
        let blocked = WireChat {
            network: WireStringLen::new("libera"),
            target: WireStringLen::new("#secret"),
            message: WireStringLen::new("hello"),
        };
        let open = WireChat {
            target: WireStringLen::new("#public"),
            ..blocked
        };
        assert_eq!(chat_fn(std::ptr::null_mut(), session, &blocked), DROP_MESSAGE);
        assert_eq!(chat_fn(std::ptr::null_mut(), session, &open), PASS_MESSAGE);

        (record.stop.unwrap())(std::ptr::null_mut(), session);
    }
}
