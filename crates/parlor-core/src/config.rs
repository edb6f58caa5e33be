//! Extension configuration.
//!
//! ```toml
//! extension_dir = "~/.config/parlor/extensions"
//!
//! [[extensions]]
//! path = "libotr.so"
//!
//! [[extensions]]
//! path = "/opt/parlor/highlight.so"
//! enabled = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable names.
pub mod env_vars {
    use std::path::PathBuf;

    /// Extra extension objects, as a platform path list.
    pub const PARLOR_EXTENSIONS: &str = "PARLOR_EXTENSIONS";
    /// Emit JSON logs when set to `true`.
    pub const PARLOR_LOG_JSON: &str = "PARLOR_LOG_JSON";

    /// Paths listed in `PARLOR_EXTENSIONS`, empty entries skipped.
    pub fn extra_extensions() -> Vec<PathBuf> {
        std::env::var_os(PARLOR_EXTENSIONS)
            .map(|list| {
                std::env::split_paths(&list)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn log_json() -> bool {
        std::env::var(PARLOR_LOG_JSON)
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false)
    }
}

fn default_enabled() -> bool {
    true
}

/// One configured extension object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub path: PathBuf,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Which extensions to activate at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
    /// Every native object in this directory is activated after the
    /// explicitly listed ones.
    #[serde(default)]
    pub extension_dir: Option<PathBuf>,
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

fn resolve(path: &Path, base: &Path) -> PathBuf {
    let path = expand_home(path);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

impl HostConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a config file. Relative paths in it resolve against the
    /// file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolved_against(base))
    }

    /// Make every path absolute relative to `base`, expanding `~`.
    pub fn resolved_against(mut self, base: &Path) -> Self {
        for entry in &mut self.extensions {
            entry.path = resolve(&entry.path, base);
        }
        self.extension_dir = self.extension_dir.map(|dir| resolve(&dir, base));
        self
    }

    /// Default config location, `<config dir>/parlor/extensions.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parlor").join("extensions.toml"))
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Path> + '_ {
        self.extensions
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_enabled() {
        let config = HostConfig::from_toml_str(
            r#"
            [[extensions]]
            path = "otr.so"

            [[extensions]]
            path = "hl.so"
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.extensions.len(), 2);
        assert!(config.extensions[0].enabled);
        assert!(!config.extensions[1].enabled);
        assert_eq!(config.enabled().collect::<Vec<_>>(), vec![Path::new("otr.so")]);
        assert_eq!(config.extension_dir, None);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(HostConfig::from_toml_str("").unwrap(), HostConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        let err = HostConfig::from_toml_str("extensions = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let config = HostConfig::from_toml_str(
            r#"
            extension_dir = "ext"
            [[extensions]]
            path = "otr.so"
            [[extensions]]
            path = "/abs/hl.so"
            "#,
        )
        .unwrap()
        .resolved_against(Path::new("/etc/parlor"));
        assert_eq!(config.extensions[0].path, PathBuf::from("/etc/parlor/otr.so"));
        assert_eq!(config.extensions[1].path, PathBuf::from("/abs/hl.so"));
        assert_eq!(config.extension_dir, Some(PathBuf::from("/etc/parlor/ext")));
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/x.so")), home.join("x.so"));
        }
        assert_eq!(expand_home(Path::new("/x/~y")), PathBuf::from("/x/~y"));
    }
}
