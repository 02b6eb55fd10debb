//! Reference directives and the path rewriting applied to them.

use crate::paths::{relative, to_slash, PathResolver};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

const DTS_BUNDLE_GENERATED: &str = "// Generated by dts-bundle ";
const DTS_BUNDLE_DEPENDENCIES: &str = "// Dependencies for this module:";

/// Which comment form counts as a reference directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recognizer {
    /// `/// <reference path="P"/>` only
    #[default]
    Standard,
    /// Also `// P`, as written by dts-bundle below its header lines
    Bundle,
}

impl Recognizer {
    /// Path of the reference directive on `line`, if there is one
    pub fn reference_path<'a>(self, line: &'a str) -> Option<&'a str> {
        match self {
            Recognizer::Standard => parse_reference_directive(line),
            Recognizer::Bundle => {
                parse_reference_directive(line).or_else(|| parse_bundle_reference(line))
            }
        }
    }
}

/// Whether the line is one of the header lines dts-bundle writes
pub fn is_bundle_header(line: &str) -> bool {
    line.starts_with(DTS_BUNDLE_GENERATED) || line.starts_with(DTS_BUNDLE_DEPENDENCIES)
}

/// Parse `/// <reference path="P" />`, tolerating whitespace around every
/// token and either quote character.
pub fn parse_reference_directive(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("///")?.trim_start();
    let rest = rest.strip_prefix("<reference")?.trim_start();
    let rest = rest.strip_prefix("path")?.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();

    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[quote.len_utf8()..];
    let rest = rest.strip_suffix("/>")?.trim_end();
    let path = rest.strip_suffix(['"', '\''])?;

    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Parse a dts-bundle dependency comment: `//` followed by a single path
fn parse_bundle_reference(line: &str) -> Option<&str> {
    let rest = line.trim();
    if rest.starts_with("///") {
        return None;
    }
    let path = rest.strip_prefix("//")?;
    if !path.starts_with(char::is_whitespace) {
        return None;
    }
    let path = path.trim();
    if path.is_empty() || path.contains(char::is_whitespace) {
        None
    } else {
        Some(path)
    }
}

/// Render a reference directive
pub fn format_reference(path: &str) -> String {
    format!("/// <reference path=\"{}\" />", path)
}

/// Settings the rewriter is built from. Relative paths are resolved with the
/// rewriter's [`PathResolver`].
#[derive(Debug, Clone)]
pub struct RewriteSettings<'a> {
    pub main_declaration_dir: &'a Path,
    pub local_typings_dir: &'a Path,
    /// Already defaulted to the package name
    pub typings_subdir: &'a str,
    pub secondary_declarations: &'a [PathBuf],
}

/// Re-expresses reference paths relative to where the declaration will live
/// once exported.
///
/// The exported layout mirrors a package sitting at
/// `<localTypingsDir>/<typingsSubdir>`, so a reference that is valid from the
/// source tree is rewritten to be valid from that spot. References to
/// secondary declarations are left alone: those files travel with the main
/// declaration and keep their relative positions.
pub struct ReferencePathRewriter<'r> {
    resolver: &'r dyn PathResolver,
    main_declaration_dir: PathBuf,
    local_typings_subdir: PathBuf,
    secondary_declarations: Vec<PathBuf>,
}

impl<'r> ReferencePathRewriter<'r> {
    pub fn new(resolver: &'r dyn PathResolver, settings: &RewriteSettings<'_>) -> Self {
        let main_declaration_dir = resolver.absolute(settings.main_declaration_dir);
        let local_typings_subdir =
            resolver.absolute(&settings.local_typings_dir.join(settings.typings_subdir));
        let secondary_declarations = settings
            .secondary_declarations
            .iter()
            .map(|p| resolver.absolute(p))
            .collect();
        Self {
            resolver,
            main_declaration_dir,
            local_typings_subdir,
            secondary_declarations,
        }
    }

    pub fn main_declaration_dir(&self) -> &Path {
        &self.main_declaration_dir
    }

    pub fn is_secondary_declaration(&self, reference_path: &str, origin_dir: &Path) -> bool {
        let target = self.resolver.absolute(&origin_dir.join(reference_path));
        let matched = self.secondary_declarations.iter().any(|s| *s == target);
        trace!(
            "Reference path {} secondary declaration: {}",
            reference_path,
            matched
        );
        matched
    }

    /// New path for `reference_path`, which appeared in a file in `origin_dir`
    pub fn rewrite_path(&self, reference_path: &str, origin_dir: &Path) -> String {
        if self.is_secondary_declaration(reference_path, origin_dir) {
            return reference_path.to_string();
        }

        let origin_dir = self.resolver.absolute(origin_dir);
        let exported_from = self.exported_origin(&origin_dir);
        let target = self.resolver.absolute(&origin_dir.join(reference_path));
        let rewritten = to_slash(&relative(&exported_from, &target));
        debug!("Rewrote reference path {} -> {}", reference_path, rewritten);
        rewritten
    }

    /// The rewritten directive line for `reference_path`
    pub fn rewrite(&self, reference_path: &str, origin_dir: &Path) -> String {
        format_reference(&self.rewrite_path(reference_path, origin_dir))
    }

    /// Directory a rewritten reference from `origin_dir` is relative to
    pub fn exported_origin(&self, origin_dir: &Path) -> PathBuf {
        let origin_dir = self.resolver.absolute(origin_dir);
        let source_dir = relative(&self.main_declaration_dir, &origin_dir);
        self.resolver
            .absolute(&self.local_typings_subdir.join(source_dir))
    }
}
