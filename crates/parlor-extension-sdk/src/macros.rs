//! Declarative macros for exporting extension records.

/// Build an [`ExtensionRecord`](crate::record::ExtensionRecord) for a type
/// implementing [`Extension`](crate::extension::Extension).
///
/// The plain form exports the well-known `parlor_extension` symbol, which is
/// what the host resolves when it opens the shared object:
///
/// ```rust,ignore
/// use parlor_extension_sdk::prelude::*;
///
/// struct Greeter;
///
/// impl Extension for Greeter {
///     fn start(_host: HostRef<'_>, _path: &std::path::Path) -> Option<Self> {
///         Some(Greeter)
///     }
/// }
///
/// declare_extension!(Greeter, "greeter", 1, 0);
/// ```
///
/// The `static NAME = Type, ...` form defines an unexported static instead,
/// for extensions compiled into the host itself.
#[macro_export]
macro_rules! declare_extension {
    (@record $ty:ty, $name:literal, $major:expr, $minor:expr) => {
        $crate::record::ExtensionRecord {
            name: concat!($name, "\0").as_ptr() as *const ::std::ffi::c_char,
            major_version: $major,
            minor_version: $minor,
            start: Some($crate::extension::trampoline::start::<$ty>),
            stop: Some($crate::extension::trampoline::stop::<$ty>),
            process_message: Some($crate::extension::trampoline::process_message::<$ty>),
            process_command: Some($crate::extension::trampoline::process_command::<$ty>),
            process_chat: Some($crate::extension::trampoline::process_chat::<$ty>),
        }
    };
    (static $ident:ident = $ty:ty, $name:literal, $major:expr, $minor:expr) => {
        static $ident: $crate::record::ExtensionRecord =
            $crate::declare_extension!(@record $ty, $name, $major, $minor);
    };
    ($ty:ty, $name:literal, $major:expr, $minor:expr) => {
        #[no_mangle]
        #[allow(non_upper_case_globals)]
        pub static parlor_extension: $crate::record::ExtensionRecord =
            $crate::declare_extension!(@record $ty, $name, $major, $minor);
    };
}
