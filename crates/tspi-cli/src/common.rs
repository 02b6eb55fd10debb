//! Common types shared by the binary and the library

use clap::Parser;
use std::path::PathBuf;
use tspi_logger::Logger;

/// Logging options
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,

    #[arg(long, value_name = "PATH", help = "Also write log messages to this file")]
    pub log_file: Option<PathBuf>,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    pub fn logger(&self) -> Result<Logger, String> {
        let logger = Logger::new(self.verbosity_level());
        match self.log_file {
            Some(ref path) => logger.with_log_file(path),
            None => Ok(logger),
        }
    }
}
