//! Safe Rust layer for writing extensions.
//!
//! Implement [`Extension`] and export it with
//! [`declare_extension!`](crate::declare_extension). The generated record
//! points at the trampolines in [`trampoline`], which own the session box
//! and contain panics so that nothing unwinds into the host.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crate::record::ProcessResult;
use crate::wire::{HostHandle, WireChat, WireCommand, WireMessage};

/// Borrowed capability handle for the duration of one callback.
#[derive(Debug, Clone, Copy)]
pub struct HostRef<'a> {
    ptr: *mut HostHandle,
    _callback: PhantomData<&'a HostHandle>,
}

impl<'a> HostRef<'a> {
    /// Wrap a raw handle received by a callback.
    ///
    /// # Safety
    /// `ptr` must be the handle passed to the currently running callback.
    pub unsafe fn from_raw(ptr: *mut HostHandle) -> Self {
        Self {
            ptr,
            _callback: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut HostHandle {
        self.ptr
    }
}

/// A Rust-implemented extension. `Self` is the session state.
pub trait Extension: Sized + 'static {
    /// Create the session. `None` runs the extension without a session,
    /// in which case no further hooks reach it.
    fn start(host: HostRef<'_>, path: &Path) -> Option<Self>;

    fn stop(self, _host: HostRef<'_>) {}

    fn on_message(&mut self, _host: HostRef<'_>, _msg: &WireMessage) {}

    fn on_command(&mut self, _host: HostRef<'_>, _cmd: &WireCommand) {}

    fn on_chat(&mut self, _host: HostRef<'_>, _chat: &WireChat) -> ProcessResult {
        ProcessResult::Pass
    }
}

fn contain<T>(hook: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(hook, reason = %reason, "Extension hook panicked");
            fallback
        }
    }
}

unsafe fn path_from_c(path: *const c_char) -> PathBuf {
    if path.is_null() {
        return PathBuf::new();
    }
    let bytes = CStr::from_ptr(path).to_bytes();
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
    }
    #[cfg(not(unix))]
    {
        PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// `extern "C"` entry points generic over an [`Extension`].
pub mod trampoline {
    use super::*;

    pub unsafe extern "C" fn start<E: Extension>(
        host: *mut HostHandle,
        path: *const c_char,
    ) -> *mut c_void {
        contain("start", std::ptr::null_mut(), || {
            let path = path_from_c(path);
            match E::start(HostRef::from_raw(host), &path) {
                Some(ext) => Box::into_raw(Box::new(ext)).cast(),
                None => std::ptr::null_mut(),
            }
        })
    }

    pub unsafe extern "C" fn stop<E: Extension>(host: *mut HostHandle, session: *mut c_void) {
        if session.is_null() {
            return;
        }
        let ext = Box::from_raw(session.cast::<E>());
        contain("stop", (), move || ext.stop(HostRef::from_raw(host)))
    }

    pub unsafe extern "C" fn process_message<E: Extension>(
        host: *mut HostHandle,
        session: *mut c_void,
        msg: *const WireMessage,
    ) {
        let (Some(ext), Some(msg)) = (session.cast::<E>().as_mut(), msg.as_ref()) else {
            return;
        };
        contain("process_message", (), || {
            ext.on_message(HostRef::from_raw(host), msg)
        })
    }

    pub unsafe extern "C" fn process_command<E: Extension>(
        host: *mut HostHandle,
        session: *mut c_void,
        cmd: *const WireCommand,
    ) {
        let (Some(ext), Some(cmd)) = (session.cast::<E>().as_mut(), cmd.as_ref()) else {
            return;
        };
        contain("process_command", (), || {
            ext.on_command(HostRef::from_raw(host), cmd)
        })
    }

    /// A panicking chat hook withholds the line.
    pub unsafe extern "C" fn process_chat<E: Extension>(
        host: *mut HostHandle,
        session: *mut c_void,
        chat: *const WireChat,
    ) -> c_int {
        let (Some(ext), Some(chat)) = (session.cast::<E>().as_mut(), chat.as_ref()) else {
            return ProcessResult::Pass.as_raw();
        };
        contain("process_chat", ProcessResult::Drop, || {
            ext.on_chat(HostRef::from_raw(host), chat)
        })
        .as_raw()
    }
}
