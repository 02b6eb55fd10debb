//! Manifest operations - parsing, serializing and merging

use crate::errors::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One installed declaration file, keyed by its path below the typings directory
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InstalledTyping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of a `tsd.json` file. Keys this tool does not interpret are
/// carried through unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Typings directory, relative to the directory holding the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,

    #[serde(default)]
    pub installed: BTreeMap<String, InstalledTyping>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(ManifestError::Parse)
    }

    /// Two-space indented JSON with a trailing newline, as tsd writes it
    pub fn to_json_string(&self) -> Result<String, ManifestError> {
        let mut content = serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)?;
        content.push('\n');
        Ok(content)
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Merge the installed typings of `other` into this manifest.
    ///
    /// Entries already present here are kept as they are. Returns the number
    /// of entries added, so incorporating a subset is a no-op returning 0.
    pub fn incorporate(&mut self, other: &Manifest) -> usize {
        let mut added = 0;
        for (name, typing) in &other.installed {
            if !self.installed.contains_key(name) {
                debug!("Incorporating typing: {}", name);
                self.installed.insert(name.clone(), typing.clone());
                added += 1;
            }
        }
        added
    }
}
