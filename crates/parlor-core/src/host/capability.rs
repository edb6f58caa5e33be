//! Capability handles passed to extension callbacks.
//!
//! A handle is an opaque token, never an address. Each [`CapabilityScope`]
//! draws a fresh token from a process-wide counter and registers it with
//! its client in a thread-local table; dropping the scope removes the
//! entry. The host API resolves incoming handles through that table only,
//! so a handle kept from an earlier call, forged, or carried to another
//! thread is rejected instead of dereferenced, and tokens are never reused.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parlor_extension_sdk::HostHandle;

use crate::client::SharedClient;
use crate::error::HostApiError;

// Zero is the null handle and is never issued.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static LIVE: RefCell<HashMap<u64, SharedClient>> = RefCell::new(HashMap::new());
}

fn token_of(handle: *const HostHandle) -> u64 {
    handle as usize as u64
}

/// Guard around one call into extension code.
pub struct CapabilityScope {
    token: u64,
}

impl CapabilityScope {
    /// Issue a live handle for `client`.
    pub fn enter(client: &SharedClient) -> Self {
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        LIVE.with(|live| live.borrow_mut().insert(token, client.clone()));
        Self { token }
    }

    /// The raw handle to pass across the boundary.
    pub fn handle(&self) -> *mut HostHandle {
        self.token as usize as *mut HostHandle
    }
}

impl Drop for CapabilityScope {
    fn drop(&mut self) {
        // Release the client outside the borrow; its drop may run arbitrary code.
        let released = LIVE.with(|live| live.borrow_mut().remove(&self.token));
        drop(released);
    }
}

/// Whether `handle` was issued by a scope that is still alive on this thread.
pub fn is_live(handle: *const HostHandle) -> bool {
    !handle.is_null() && LIVE.with(|live| live.borrow().contains_key(&token_of(handle)))
}

/// Map a live handle back to the client it grants access to.
pub(crate) fn resolve(handle: *mut HostHandle) -> Result<SharedClient, HostApiError> {
    if handle.is_null() {
        return Err(HostApiError::InvalidHandle);
    }
    LIVE.with(|live| live.borrow().get(&token_of(handle)).cloned())
        .ok_or(HostApiError::InvalidHandle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{shared, MemoryClient};

    #[test]
    fn test_scope_handle_is_live_until_drop() {
        let client = shared(MemoryClient::new());
        let scope = CapabilityScope::enter(&client);
        let handle = scope.handle();
        assert!(is_live(handle));
        assert!(resolve(handle).is_ok());

        drop(scope);
        assert!(!is_live(handle));
        assert!(matches!(resolve(handle), Err(HostApiError::InvalidHandle)));
    }

    #[test]
    fn test_next_scope_does_not_revive_old_handle() {
        let client = shared(MemoryClient::new());
        let stale = CapabilityScope::enter(&client).handle();
        let current = CapabilityScope::enter(&client);

        assert_ne!(stale, current.handle());
        assert!(!is_live(stale));
        assert!(is_live(current.handle()));
    }

    #[test]
    fn test_stale_handle_never_reaches_another_client() {
        let first = shared(MemoryClient::new().with_network("libera", "first"));
        let second = shared(MemoryClient::new().with_network("libera", "second"));
        let stale = CapabilityScope::enter(&first).handle();
        let _other = CapabilityScope::enter(&second);
        assert!(matches!(resolve(stale), Err(HostApiError::InvalidHandle)));
    }

    #[test]
    fn test_null_and_forged_handles_are_rejected() {
        assert!(!is_live(std::ptr::null()));
        let forged = 0x1000usize as *mut HostHandle;
        assert!(matches!(resolve(forged), Err(HostApiError::InvalidHandle)));
    }

    #[test]
    fn test_nested_scopes_are_independent() {
        let client = shared(MemoryClient::new());
        let outer = CapabilityScope::enter(&client);
        let inner = CapabilityScope::enter(&client);
        assert_ne!(outer.handle(), inner.handle());

        let inner_handle = inner.handle();
        drop(inner);
        assert!(is_live(outer.handle()));
        assert!(!is_live(inner_handle));
    }

    #[test]
    fn test_handles_do_not_cross_threads() {
        let client = shared(MemoryClient::new());
        let scope = CapabilityScope::enter(&client);
        let addr = scope.handle() as usize;
        let seen = std::thread::spawn(move || is_live(addr as *const HostHandle))
            .join()
            .unwrap();
        assert!(!seen);
    }
}
