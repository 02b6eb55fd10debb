//! Configuration for the tspi installer: the `tspi.json` settings file and
//! the package metadata read from `package.json`.

pub mod config;
pub mod errors;
pub mod package;

pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use errors::{ConfigError, PackageConfigError};
pub use package::PackageConfig;
