//! Console and file logging for the tspi CLI.
//!
//! A [`Logger`] is built once from the command-line verbosity and handed to
//! whatever needs to report progress. There is no process-wide verbosity flag.

use colored::Colorize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Verbosity levels understood by [`Logger`]
/// 0 = warn only, 1 = debug (-v), 2 = trace (-vv)
pub const VERBOSITY_WARN: u8 = 0;
pub const VERBOSITY_DEBUG: u8 = 1;
pub const VERBOSITY_TRACE: u8 = 2;

#[derive(Debug, Clone, Default)]
pub struct Logger {
    verbosity: u8,
    log_file: Option<PathBuf>,
}

impl Logger {
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            log_file: None,
        }
    }

    /// Also append every message to `path`, truncating it first.
    pub fn with_log_file(mut self, path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create log directory: {}", e))?;
        }
        std::fs::write(path, "")
            .map_err(|e| format!("Failed to create log file {}: {}", path.display(), e))?;
        self.log_file = Some(path.to_path_buf());
        Ok(self)
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Filter directive for `tracing_subscriber::EnvFilter` matching this verbosity
    pub fn tracing_directive(&self) -> &'static str {
        match self.verbosity {
            VERBOSITY_WARN => "warn",
            VERBOSITY_DEBUG => "debug",
            _ => "trace",
        }
    }

    fn write_to_log(&self, message: &str) {
        let Some(ref log_path) = self.log_file else {
            return;
        };
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let _ = writeln!(file, "[{}] {}", timestamp, message);
        }
    }

    /// Log an informational message (to console if verbose >= 1, always to file)
    pub fn info(&self, message: &str) {
        self.write_to_log(&format!("INFO {}", message));
        if self.verbosity >= VERBOSITY_DEBUG {
            eprintln!("{}", message);
        }
    }

    /// Log a debug message (to console if verbose >= 1, always to file)
    pub fn debug(&self, message: &str) {
        self.write_to_log(&format!("DEBUG {}", message));
        if self.verbosity >= VERBOSITY_DEBUG {
            eprintln!("{} {}", "DEBUG:".blue().bold(), message);
        }
    }

    /// Log a step message (console only at -vv)
    pub fn step(&self, message: &str) {
        self.write_to_log(&format!("STEP {}", message));
        if self.verbosity >= VERBOSITY_TRACE {
            eprintln!("TRACE: {}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        self.write_to_log(&format!("WARN {}", message));
        eprintln!("{} {}", "warning:".yellow().bold(), message);
    }

    pub fn error(&self, message: &str) {
        self.write_to_log(&format!("ERROR {}", message));
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    pub fn success(&self, message: &str) {
        self.write_to_log(&format!("SUCCESS {}", message));
        if self.verbosity >= VERBOSITY_DEBUG {
            eprintln!("{} {}", "\u{2714}".green().bold(), message);
        }
    }
}
