//! Fixed-layout wire structures exchanged across the extension boundary.
//!
//! Every string is a `(pointer, length)` pair that is **not** NUL terminated
//! and is only valid for the duration of the call that receives it. Arrays
//! are paired with an explicit count.

use std::ffi::c_char;
use std::marker::PhantomData;

/// A borrowed, length-delimited string view.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireStringLen {
    /// Start of the UTF-8 bytes (may be null when `len == 0`)
    pub str: *const c_char,
    /// Number of bytes
    pub len: usize,
}

impl WireStringLen {
    /// The zero-length string.
    pub const EMPTY: WireStringLen = WireStringLen {
        str: std::ptr::null(),
        len: 0,
    };

    /// Borrow a Rust string. The view must not outlive `s`.
    pub fn new(s: &str) -> Self {
        Self {
            str: s.as_ptr().cast(),
            len: s.len(),
        }
    }

    /// True when the view has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the bytes.
    ///
    /// Returns `None` when the pointer is null but the length is not zero,
    /// or when the length cannot describe a valid slice.
    ///
    /// # Safety
    /// A non-null `str` must point to `len` readable bytes that stay alive
    /// and unmodified for `'a`.
    pub unsafe fn as_bytes<'a>(&self) -> Option<&'a [u8]> {
        if self.len == 0 {
            return Some(&[]);
        }
        if self.str.is_null() || self.len > isize::MAX as usize {
            return None;
        }
        Some(std::slice::from_raw_parts(self.str.cast::<u8>(), self.len))
    }

    /// View the bytes as UTF-8.
    ///
    /// # Safety
    /// Same requirements as [`WireStringLen::as_bytes`].
    pub unsafe fn as_str<'a>(&self) -> Option<&'a str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }
}

impl Default for WireStringLen {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// An IRC protocol message in wire form.
///
/// An absent sender is encoded as three zero-length prefix strings.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireMessage {
    pub network: WireStringLen,
    pub prefix_nick: WireStringLen,
    pub prefix_user: WireStringLen,
    pub prefix_host: WireStringLen,
    pub command: WireStringLen,
    /// Ordered parameters
    pub params: *const WireStringLen,
    pub params_n: usize,
    /// Tag keys, parallel to `tagvals`
    pub tagkeys: *const WireStringLen,
    pub tagvals: *const WireStringLen,
    pub tags_n: usize,
}

impl WireMessage {
    /// Parameters as a slice.
    ///
    /// # Safety
    /// `params` must point to `params_n` valid entries (or be null with a zero count).
    pub unsafe fn params<'a>(&self) -> &'a [WireStringLen] {
        wire_slice(self.params, self.params_n)
    }

    /// Tag keys and values as parallel slices.
    ///
    /// # Safety
    /// `tagkeys` and `tagvals` must each point to `tags_n` valid entries.
    pub unsafe fn tags<'a>(&self) -> (&'a [WireStringLen], &'a [WireStringLen]) {
        (
            wire_slice(self.tagkeys, self.tags_n),
            wire_slice(self.tagvals, self.tags_n),
        )
    }
}

/// Parameters of a user-issued extension command.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireCommand {
    pub params: *const WireStringLen,
    pub params_n: usize,
}

impl WireCommand {
    /// Parameters as a slice.
    ///
    /// # Safety
    /// `params` must point to `params_n` valid entries (or be null with a zero count).
    pub unsafe fn params<'a>(&self) -> &'a [WireStringLen] {
        wire_slice(self.params, self.params_n)
    }
}

/// A locally composed chat line about to be sent.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct WireChat {
    pub network: WireStringLen,
    pub target: WireStringLen,
    pub message: WireStringLen,
}

/// Opaque capability handle denoting "the running client".
///
/// Only ever seen behind a pointer; valid for the duration of the callback
/// that received it.
#[repr(C)]
pub struct HostHandle {
    _private: [u8; 0],
    _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

unsafe fn wire_slice<'a>(ptr: *const WireStringLen, n: usize) -> &'a [WireStringLen] {
    if n == 0 || ptr.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(ptr, n)
    }
}
