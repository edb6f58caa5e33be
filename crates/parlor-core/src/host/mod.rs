//! The host side of the extension boundary.
//!
//! Extensions call back into the client through the `#[no_mangle]`
//! functions in [`api`], always passing the capability handle they were
//! given for the current callback. Executables that load extensions must
//! export these symbols dynamically (`-Wl,--export-dynamic` on ELF).

pub mod api;
pub mod capability;

pub use capability::{is_live, CapabilityScope};
