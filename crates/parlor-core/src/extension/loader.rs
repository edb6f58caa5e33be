//! Activation and deactivation of extension modules.

use std::ffi::CString;
use std::path::{Path, PathBuf};

use libloading::Library;
use parlor_extension_sdk::{ExtensionRecord, EXTENSION_SYMBOL};
use tracing::{debug, error, info};

use super::module::{ExtensionModule, ExtensionState};
use crate::client::SharedClient;
use crate::error::LoadError;

/// Check if a file looks like a native extension object.
pub fn is_native_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| matches!(ext, "so" | "dylib" | "dll"))
        .unwrap_or(false)
}

/// Native extension objects in `dir`, sorted by path.
///
/// An unreadable directory yields an empty list.
pub fn discover(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_native_extension(path))
            .collect(),
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Cannot read extension directory");
            Vec::new()
        }
    };
    found.sort();
    found
}

fn path_to_cstring(path: &Path) -> Result<CString, LoadError> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path
        .to_str()
        .ok_or_else(|| LoadError::InvalidPath(path.to_path_buf()))?
        .as_bytes()
        .to_vec();
    CString::new(bytes).map_err(|_| LoadError::InvalidPath(path.to_path_buf()))
}

/// Starts and stops extension modules against one client.
pub struct ExtensionLoader {
    client: SharedClient,
}

impl ExtensionLoader {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    /// Open a shared object, resolve its record and start it.
    ///
    /// Nothing in the object is called unless the record resolves and
    /// validates. On error the library is released again.
    pub fn activate(&self, path: &Path) -> Result<ExtensionModule, LoadError> {
        let c_path = path_to_cstring(path)?;
        debug!(path = %path.display(), "Opening extension library");

        let library = unsafe { Library::new(path) }.map_err(|source| {
            error!(path = %path.display(), error = %source, "Failed to open extension library");
            LoadError::Library {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let record: *const ExtensionRecord = unsafe {
            let symbol = library
                .get::<*const ExtensionRecord>(EXTENSION_SYMBOL)
                .map_err(|source| {
                    error!(path = %path.display(), error = %source, "Extension record not exported");
                    LoadError::MissingSymbol {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
            *symbol
        };

        let record = unsafe { record.as_ref() }.ok_or_else(|| LoadError::MalformedRecord {
            path: path.to_path_buf(),
            reason: "record symbol is null".to_string(),
        })?;

        let module = unsafe { ExtensionModule::from_record(record, path, Some(library)) }
            .inspect_err(|e| error!(path = %path.display(), error = %e, "Rejected extension record"))?;

        Ok(self.start(module, &c_path))
    }

    /// Validate and start a record compiled into this process.
    ///
    /// `label` stands in for the object path and is what `start` receives.
    pub fn activate_static(
        &self,
        record: &'static ExtensionRecord,
        label: impl AsRef<Path>,
    ) -> Result<ExtensionModule, LoadError> {
        let label = label.as_ref();
        let c_path = path_to_cstring(label)?;
        let module = unsafe { ExtensionModule::from_record(record, label, None) }?;
        Ok(self.start(module, &c_path))
    }

    fn start(&self, mut module: ExtensionModule, c_path: &CString) -> ExtensionModule {
        module.start(&self.client, c_path);
        info!(
            extension = %module.name(),
            version = %module.version(),
            path = %module.path().display(),
            session = module.has_session(),
            "Extension activated"
        );
        module
    }

    /// Stop and unload an active module.
    ///
    /// A module in any other state is rejected and nothing is called.
    pub fn deactivate(&self, module: &mut ExtensionModule) -> Result<(), LoadError> {
        if module.state() != ExtensionState::Active {
            return Err(LoadError::InvalidState {
                name: module.name().to_string(),
                state: module.state(),
            });
        }
        module.stop();
        module.unload();
        info!(extension = %module.name(), "Extension deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{shared, MemoryClient};

    #[test]
    fn test_is_native_extension() {
        assert!(is_native_extension(Path::new("libotr.so")));
        assert!(is_native_extension(Path::new("otr.dylib")));
        assert!(is_native_extension(Path::new("otr.dll")));
        assert!(!is_native_extension(Path::new("otr.wasm")));
        assert!(!is_native_extension(Path::new("README")));
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.so", "a.so", "notes.txt", "c.dylib"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.so")).unwrap();

        let found: Vec<String> = discover(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.so", "b.so", "c.dylib"]);
    }

    #[test]
    fn test_discover_missing_dir_is_empty() {
        assert!(discover(Path::new("/nonexistent/parlor/extensions")).is_empty());
    }

    #[test]
    fn test_missing_library_is_a_load_error() {
        let loader = ExtensionLoader::new(shared(MemoryClient::new()));
        let err = loader
            .activate(Path::new("/nonexistent/libparlor_missing.so"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Library { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_with_nul_is_invalid() {
        use std::os::unix::ffi::OsStrExt;
        let path = Path::new(std::ffi::OsStr::from_bytes(b"bad\0name.so"));
        assert!(matches!(path_to_cstring(path), Err(LoadError::InvalidPath(_))));
    }
}
