//! Installer configuration read from `tspi.json`.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use tspi_dts::FileSystem;

/// Config file used when none is named on the command line
pub const DEFAULT_CONFIG_FILE: &str = "tspi.json";
pub const DEFAULT_PACKAGE_CONFIG: &str = "package.json";
pub const DEFAULT_LOCAL_TYPINGS_DIR: &str = "typings";
pub const DEFAULT_LOCAL_TSD_CONFIG: &str = "tsd.json";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Run even if we do not appear to be installed inside `node_modules`.
    pub force: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_config: Option<PathBuf>,

    /// Declaration file to wrap. Derived from the package "main" script when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_declaration: Option<PathBuf>,

    /// Declaration files copied alongside the main declaration.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_declarations: Vec<PathBuf>,

    /// Leave the main declaration unwrapped (it already declares its own modules).
    pub no_wrap: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_typings_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_typings_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub typings_subdir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_tsd_config: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_tsd_config: Option<PathBuf>,
}

impl Config {
    /// Load the configuration.
    ///
    /// With `explicit = None` the default `tspi.json` is tried and a missing
    /// file yields the defaults. A file named explicitly must exist.
    pub fn load(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let content = fs.read_optional(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(content) = content else {
            debug!("Config file not found: {}", path.display());
            if explicit.is_some() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Ok(Config::default());
        };
        debug!("Config file contents:\n{}", content);
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn package_config_path(&self) -> PathBuf {
        self.package_config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_CONFIG))
    }

    pub fn local_typings_dir(&self) -> PathBuf {
        self.local_typings_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_TYPINGS_DIR))
    }

    pub fn local_tsd_config_path(&self) -> PathBuf {
        self.local_tsd_config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_TSD_CONFIG))
    }

    /// Typings subdirectory, defaulting to the package name
    pub fn typings_subdir_or<'a>(&'a self, package_name: &'a str) -> &'a str {
        self.typings_subdir
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(package_name)
    }

    /// Ambient module name, defaulting to the package name
    pub fn module_name_or<'a>(&'a self, package_name: &'a str) -> &'a str {
        self.module_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(package_name)
    }
}
