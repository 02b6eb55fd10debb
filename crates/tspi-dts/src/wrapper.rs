//! Wrapping a declaration file in an ambient module block.
//!
//! A declaration file starts with a header of comments and reference
//! directives, followed by a body of declarations. The header stays outside
//! the module block (its directives rewritten for the exported location);
//! the body goes inside it, minus the `declare` keywords that are not allowed
//! within an ambient module.

use crate::reference::{is_bundle_header, ReferencePathRewriter, Recognizer};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A declaration file split into lines, with the directory its relative
/// reference paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationDocument {
    lines: Vec<String>,
    source_dir: PathBuf,
}

impl DeclarationDocument {
    pub fn new(text: &str, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
            source_dir: source_dir.into(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapperState {
    #[default]
    Header,
    Body,
}

/// Parse state threaded through one wrapping pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanState {
    pub state: WrapperState,
    pub recognizer: Recognizer,
}

/// How a header line is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderLine<'a> {
    BundleHeader,
    Reference(&'a str),
    Comment,
    Blank,
    Content,
}

fn classify_header_line<'a>(line: &'a str, recognizer: Recognizer) -> HeaderLine<'a> {
    if is_bundle_header(line) {
        HeaderLine::BundleHeader
    } else if let Some(path) = recognizer.reference_path(line) {
        HeaderLine::Reference(path)
    } else if line.trim_start().starts_with("//") {
        HeaderLine::Comment
    } else if line.trim().is_empty() {
        HeaderLine::Blank
    } else {
        HeaderLine::Content
    }
}

/// Drop the `declare` keyword from `[export ]declare <rest>`
pub fn strip_declare(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("export declare ") {
        format!("export {}", rest)
    } else if let Some(rest) = line.strip_prefix("declare ") {
        rest.to_string()
    } else {
        line.to_string()
    }
}

pub fn module_declaration(module_name: &str) -> String {
    format!("declare module '{}' {{", module_name)
}

pub struct DeclarationWrapper<'a> {
    rewriter: &'a ReferencePathRewriter<'a>,
    module_name: String,
    no_wrap: bool,
}

impl<'a> DeclarationWrapper<'a> {
    pub fn new(rewriter: &'a ReferencePathRewriter<'a>, module_name: &str, no_wrap: bool) -> Self {
        Self {
            rewriter,
            module_name: module_name.to_string(),
            no_wrap,
        }
    }

    pub fn wrap(&self, document: &DeclarationDocument) -> String {
        if self.no_wrap {
            debug!("Main ambient external module declaration disabled");
            self.rewrite_unwrapped(document)
        } else {
            self.wrap_in_module(document)
        }
    }

    /// Rewrite directives on every line; no module block is added.
    ///
    /// Standard directives are rewritten anywhere. dts-bundle dependency
    /// comments are only recognized in the header, below a bundle marker.
    fn rewrite_unwrapped(&self, document: &DeclarationDocument) -> String {
        let mut scan = ScanState::default();
        let mut out = String::new();
        for line in document.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let recognizer = match scan.state {
                WrapperState::Header => match classify_header_line(line, scan.recognizer) {
                    HeaderLine::BundleHeader => {
                        scan.recognizer = Recognizer::Bundle;
                        out.push_str(line);
                        out.push('\n');
                        continue;
                    }
                    HeaderLine::Content => {
                        scan.state = WrapperState::Body;
                        Recognizer::Standard
                    }
                    _ => scan.recognizer,
                },
                WrapperState::Body => Recognizer::Standard,
            };

            match recognizer.reference_path(line) {
                Some(path) => out.push_str(&self.rewriter.rewrite(path, document.source_dir())),
                None => out.push_str(line),
            }
            out.push('\n');
        }
        out
    }

    fn wrap_in_module(&self, document: &DeclarationDocument) -> String {
        let mut scan = ScanState::default();
        let mut out: Vec<String> = Vec::with_capacity(document.lines().len() + 3);

        for line in document.lines() {
            if scan.state == WrapperState::Header {
                match classify_header_line(line, scan.recognizer) {
                    HeaderLine::BundleHeader => {
                        scan.recognizer = Recognizer::Bundle;
                        out.push(line.clone());
                        continue;
                    }
                    HeaderLine::Reference(path) => {
                        out.push(self.rewriter.rewrite(path, document.source_dir()));
                        continue;
                    }
                    HeaderLine::Comment => {
                        out.push(line.clone());
                        continue;
                    }
                    HeaderLine::Blank => continue,
                    HeaderLine::Content => {
                        out.push(module_declaration(&self.module_name));
                        scan.state = WrapperState::Body;
                    }
                }
            }

            if line.trim().is_empty() {
                continue;
            }
            out.push(strip_declare(line));
        }

        if scan.state == WrapperState::Header {
            out.push(module_declaration(&self.module_name));
        }
        out.push("}".to_string());
        out.push(String::new());
        out.join("\n")
    }
}
