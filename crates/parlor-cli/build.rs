// Extensions resolve the host API against the executable, so its
// `parlor_*` symbols have to be in the dynamic symbol table.
fn main() {
    match std::env::var("CARGO_CFG_TARGET_OS").as_deref() {
        Ok("linux") | Ok("freebsd") | Ok("netbsd") | Ok("openbsd") | Ok("dragonfly") => {
            println!("cargo:rustc-link-arg-bins=-Wl,--export-dynamic");
        }
        Ok("macos") => {
            println!("cargo:rustc-link-arg-bins=-Wl,-export_dynamic");
        }
        _ => {}
    }
}
