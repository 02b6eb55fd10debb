//! Declaration file processing for the tspi installer.
//!
//! - [`layout`]: where exported typings and the TSD manifest go
//! - [`reference`]: recognizing reference directives and rewriting their paths
//! - [`wrapper`]: the header/body pass that wraps a declaration in `declare module`
//! - [`secondary`]: directive rewriting for files copied alongside the main declaration
//! - [`fs`] and [`paths`]: the filesystem and path-resolution capabilities the above rely on

pub mod fs;
pub mod layout;
pub mod paths;
pub mod reference;
pub mod secondary;
pub mod wrapper;

pub use fs::{DryRun, FileSystem, MemoryFs, OsFs};
pub use layout::{ExportLocation, InstallMode};
pub use paths::{LexicalResolver, PathResolver};
pub use reference::{ReferencePathRewriter, RewriteSettings};
pub use wrapper::{DeclarationDocument, DeclarationWrapper};
