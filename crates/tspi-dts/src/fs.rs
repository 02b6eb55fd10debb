//! Filesystem capability used by the installer.
//!
//! Every read and write the installer performs goes through [`FileSystem`].
//! Dry runs wrap the real filesystem in [`DryRun`], which still reads but
//! turns every mutation into a log line, so both modes compute identical
//! output.

use crate::paths::{LexicalResolver, PathResolver};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read_text(&self, path: &Path) -> io::Result<String>;

    fn write_text(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn real_path(&self, path: &Path) -> io::Result<PathBuf>;

    /// Read a file, mapping "not found" to `None`
    fn read_optional(&self, path: &Path) -> io::Result<Option<String>> {
        match self.read_text(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// Suppresses every mutation of the wrapped filesystem
#[derive(Debug, Clone, Default)]
pub struct DryRun<F> {
    inner: F,
}

impl<F: FileSystem> DryRun<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: FileSystem> FileSystem for DryRun<F> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.inner.read_text(path)
    }

    fn write_text(&self, path: &Path, contents: &str) -> io::Result<()> {
        info!(
            "Dry run: would write {} ({} bytes)",
            path.display(),
            contents.len()
        );
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        info!("Dry run: would create {}", path.display());
        Ok(())
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        self.inner.real_path(path)
    }
}

/// In-memory filesystem rooted at a virtual working directory
#[derive(Debug)]
pub struct MemoryFs {
    resolver: LexicalResolver,
    files: Mutex<BTreeMap<PathBuf, String>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
}

impl MemoryFs {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let resolver = LexicalResolver::new(cwd);
        let fs = Self {
            resolver,
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
        };
        fs.add_dirs(fs.resolver.cwd());
        fs
    }

    /// Seed a file, creating its parent directories
    pub fn with_file(self, path: impl AsRef<Path>, contents: &str) -> Self {
        let path = self.resolver.absolute(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dirs(parent);
        }
        self.files.lock().insert(path, contents.to_string());
        self
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = self.resolver.absolute(path.as_ref());
        self.files.lock().get(&path).cloned()
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    fn add_dirs(&self, dir: &Path) {
        let mut dirs = self.dirs.lock();
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl FileSystem for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let path = self.resolver.absolute(path);
        self.files.lock().contains_key(&path) || self.dirs.lock().contains(&path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.file(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn write_text(&self, path: &Path, contents: &str) -> io::Result<()> {
        let path = self.resolver.absolute(path);
        let parent_exists = path
            .parent()
            .is_some_and(|parent| self.dirs.lock().contains(parent));
        if !parent_exists {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory for: {}", path.display()),
            ));
        }
        self.files.lock().insert(path, contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = self.resolver.absolute(path);
        self.add_dirs(&path);
        Ok(())
    }

    fn real_path(&self, path: &Path) -> io::Result<PathBuf> {
        if self.exists(path) {
            Ok(self.resolver.absolute(path))
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such path: {}", path.display()),
            ))
        }
    }
}
