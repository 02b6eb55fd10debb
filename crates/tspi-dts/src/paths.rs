//! Lexical path algebra.
//!
//! Everything here works on path text only: `..` segments are collapsed
//! without touching the filesystem, the way `path.resolve` and
//! `path.relative` behave in node. Reference directives in a declaration file
//! may point at files that do not exist yet, so canonicalizing through the
//! filesystem is not an option.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Turns possibly-relative paths into absolute, normalized ones.
///
/// Equality checks between paths (e.g. "is this reference one of the
/// secondary declarations?") must go through a resolver so that tests can
/// substitute their own working directory.
pub trait PathResolver: Send + Sync {
    fn absolute(&self, path: &Path) -> PathBuf;
}

/// Resolves relative paths against a fixed working directory
#[derive(Debug, Clone)]
pub struct LexicalResolver {
    cwd: PathBuf,
}

impl LexicalResolver {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: normalize(&cwd.into()),
        }
    }

    pub fn from_current_dir() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl PathResolver for LexicalResolver {
    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.cwd.join(path))
        }
    }
}

/// Collapse `.` and `..` segments.
///
/// `..` never climbs above the root of an absolute path; leading `..`
/// segments of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Path of `to` relative to the directory `from`. Both should be absolute.
pub fn relative(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);
    pathdiff::diff_paths(&to, &from).unwrap_or(to)
}

/// Render a path with `/` separators, as reference directives expect
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        let part = match component {
            Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy(),
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::CurDir => ".".into(),
            Component::ParentDir => "..".into(),
            Component::Normal(name) => name.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}
