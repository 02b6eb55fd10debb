//! tspi - export a package's TypeScript declarations into the depending
//! package's typings tree when it is installed by npm.

pub mod common;
pub mod errors;
pub mod installer;

pub use common::GlobalOpts;
pub use errors::InstallError;
pub use installer::{InstallOptions, InstallOutcome, InstallReport, Installer, ManifestOutcome};

use tspi_dts::{DryRun, LexicalResolver, OsFs};
use tspi_logger::Logger;

/// Run the installer against the real filesystem in the current directory
pub fn run(options: InstallOptions, logger: &Logger) -> Result<InstallOutcome, InstallError> {
    let resolver = LexicalResolver::from_current_dir().map_err(InstallError::WorkingDirectory)?;
    if options.dry_run {
        Installer::new(DryRun::new(OsFs), resolver, logger.clone(), options).install()
    } else {
        Installer::new(OsFs, resolver, logger.clone(), options).install()
    }
}
