//! TSD Manifest Management
//!
//! A TSD manifest (`tsd.json`) records which third-party declaration files a
//! package has installed and where its typings directory lives. The installer
//! hauls the manifest of each installed package up into the depending
//! package's manifest so that one `tsd reinstall` there restores every
//! transitive typing.

pub mod errors;
pub mod manifest;

pub use errors::ManifestError;
pub use manifest::{InstalledTyping, Manifest};
