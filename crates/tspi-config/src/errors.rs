use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading `tspi.json`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Config file could not be read: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file is not valid JSON: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while reading the package metadata (`package.json`)
#[derive(Error, Debug)]
pub enum PackageConfigError {
    #[error("Package config file could not be read: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Package config file could not be parsed: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Package config file has no \"name\": {}", .0.display())]
    MissingName(PathBuf),
}
