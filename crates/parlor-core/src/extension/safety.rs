//! Panic containment at the extension boundary.
//!
//! Unwinding out of an `extern "C"` function aborts the process, so every
//! host API body and every host-side step that runs near foreign frames
//! goes through [`contain`].

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f`, turning a panic into `Err(message)`.
pub fn contain<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
}

/// Run `f`, logging a panic and returning `fallback` instead.
pub fn contain_or<T>(what: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match contain(f) {
        Ok(value) => value,
        Err(reason) => {
            error!(call = what, reason = %reason, "Panic contained at extension boundary");
            fallback
        }
    }
}
