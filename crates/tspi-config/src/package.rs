//! The part of `package.json` the installer cares about.

use crate::errors::PackageConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use tspi_dts::FileSystem;

pub const DEFAULT_MAIN_SCRIPT: &str = "index.js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConfig {
    pub name: String,
    pub main: PathBuf,
}

#[derive(Deserialize)]
struct RawPackageConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    main: Option<String>,
}

impl PackageConfig {
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self, PackageConfigError> {
        debug!("Reading package config file: {}", path.display());
        let content = fs.read_text(path).map_err(|source| PackageConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Parse package metadata; `path` is only used for error messages.
    pub fn from_json(content: &str, path: &Path) -> Result<Self, PackageConfigError> {
        let raw: RawPackageConfig =
            serde_json::from_str(content).map_err(|source| PackageConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PackageConfigError::MissingName(path.to_path_buf()))?;
        let main = raw
            .main
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MAIN_SCRIPT.to_string());

        Ok(Self {
            name,
            main: PathBuf::from(main),
        })
    }

    /// Scoped packages (`@scope/name`) sit one directory deeper under `node_modules`.
    pub fn is_scoped(&self) -> bool {
        self.name.starts_with('@')
    }

    /// The `*.d.ts` sharing the basename of the "main" script.
    pub fn main_declaration(&self) -> PathBuf {
        let main = self.main.to_string_lossy();
        match main.strip_suffix(".js") {
            Some(stem) => PathBuf::from(format!("{}.d.ts", stem)),
            None => self.main.clone(),
        }
    }
}
