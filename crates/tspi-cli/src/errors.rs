//! Errors that end an installer run

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tspi_config::{ConfigError, PackageConfigError};
use tspi_manifest::ManifestError;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    PackageMetadata(#[from] PackageConfigError),

    #[error("Main declaration file could not be wrapped: {0}")]
    DeclarationWrap(String),

    #[error("Secondary declaration file {} could not be wrapped: {message}", path.display())]
    SecondaryDeclaration { path: PathBuf, message: String },

    #[error("TSD config file {} could not be processed: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine the working directory: {0}")]
    WorkingDirectory(#[source] io::Error),
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| InstallError::Io { path, source }
    }
}
