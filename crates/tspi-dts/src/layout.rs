//! Where exported typings land.
//!
//! npm installs a dependency at `node_modules/<name>` (or
//! `node_modules/@scope/<name>`), and the installer runs with that directory
//! as its working directory. The depending package's typings tree and TSD
//! manifest are therefore a fixed number of `..` steps away, one per path
//! segment of the package name plus one for `node_modules` itself.

use crate::paths::{relative, to_slash, PathResolver};
use std::path::{Path, PathBuf};

/// Typings directory of the package being installed
pub const LOCAL_TYPINGS_DIR: &str = "typings";

/// File name of the TSD manifest
pub const MANIFEST_FILE: &str = "tsd.json";

const NODE_MODULES: &str = "node_modules";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Export into the package's own directory
    SelfInstall,
    /// Export into the package that depends on us
    Dependency,
}

impl InstallMode {
    pub fn from_self_install(self_install: bool) -> Self {
        if self_install {
            InstallMode::SelfInstall
        } else {
            InstallMode::Dependency
        }
    }
}

/// `..` steps from a dependency's directory up to the depending package
fn package_root_steps(scoped: bool) -> PathBuf {
    let mut path = PathBuf::from("..").join("..");
    if scoped {
        path.push("..");
    }
    path
}

/// Directory receiving the wrapped declaration and its neighbours
pub fn exported_typings_dir(scoped: bool, mode: InstallMode, override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    match mode {
        InstallMode::SelfInstall => PathBuf::from(LOCAL_TYPINGS_DIR),
        InstallMode::Dependency => package_root_steps(scoped).join(LOCAL_TYPINGS_DIR),
    }
}

/// Location of the exported TSD manifest.
///
/// For dependency installs this is the depending package's `node_modules`
/// directory, one level below the package root.
pub fn exported_manifest_path(
    scoped: bool,
    mode: InstallMode,
    override_path: Option<&Path>,
) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    match mode {
        InstallMode::SelfInstall => PathBuf::from(LOCAL_TYPINGS_DIR).join(MANIFEST_FILE),
        InstallMode::Dependency => {
            let mut path = PathBuf::from("..");
            if scoped {
                path.push("..");
            }
            path.join(MANIFEST_FILE)
        }
    }
}

/// Resolved destinations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLocation {
    pub typings_dir: PathBuf,
    /// `typings_dir` joined with the typings subdirectory
    pub typings_subdir: PathBuf,
    pub manifest_path: PathBuf,
}

impl ExportLocation {
    /// `typings_subdir` must already be defaulted (usually to the package name).
    pub fn resolve(
        package_name: &str,
        typings_subdir: &str,
        mode: InstallMode,
        typings_override: Option<&Path>,
        manifest_override: Option<&Path>,
    ) -> Self {
        let scoped = package_name.starts_with('@');
        let typings_dir = exported_typings_dir(scoped, mode, typings_override);
        let typings_subdir = typings_dir.join(typings_subdir);
        let manifest_path = exported_manifest_path(scoped, mode, manifest_override);
        Self {
            typings_dir,
            typings_subdir,
            manifest_path,
        }
    }

    /// Typings directory as seen from the manifest's directory, which is what
    /// the manifest's `path` field holds
    pub fn manifest_typings_path(&self, resolver: &dyn PathResolver) -> String {
        let manifest_dir = self
            .manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        to_slash(&relative(
            &resolver.absolute(&manifest_dir),
            &resolver.absolute(&self.typings_dir),
        ))
    }
}

/// Whether `cwd` looks like `node_modules/<name>` or `node_modules/@scope/<name>`
pub fn is_installed_dependency(cwd: &Path) -> bool {
    let Some(parent) = cwd.parent() else {
        return false;
    };
    let parent_name = parent.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if parent_name == NODE_MODULES {
        return true;
    }
    let grandparent_name = parent
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");
    parent_name.starts_with('@') && grandparent_name == NODE_MODULES
}

/// npm fires `postinstall` both when we are installed into a depending package
/// and after our own dependencies are installed; only the former should export.
pub fn should_run(cwd: &Path, mode: InstallMode, force: bool) -> bool {
    mode == InstallMode::SelfInstall || force || is_installed_dependency(cwd)
}
