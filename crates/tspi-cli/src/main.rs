use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tspi::{GlobalOpts, InstallOptions, InstallOutcome};
use tspi_logger::Logger;

#[derive(Parser)]
#[command(name = "tspi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "TypeScript package installer",
    long_about = "Wraps a package's main declaration file in an ambient module and exports it, \
                  together with its TSD manifest, into the typings of the package that depends on it. \
                  Meant to run from an npm postinstall script."
)]
struct Cli {
    #[arg(short = 'f', long, value_name = "PATH", help = "Config file [default: tspi.json]")]
    config_file: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Log what would be done without writing anything")]
    dry_run: bool,

    #[arg(short, long, help = "Install typings into this package's own typings directory")]
    self_install: bool,

    #[command(flatten)]
    global: GlobalOpts,
}

fn init_tracing(logger: &Logger) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| logger.tracing_directive().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let logger = match cli.global.logger() {
        Ok(logger) => logger,
        Err(e) => {
            let logger = Logger::new(cli.global.verbosity_level());
            logger.warn(&format!("Failed to initialize log file: {}", e));
            logger
        }
    };
    init_tracing(&logger);

    let options = InstallOptions {
        config_file: cli.config_file,
        dry_run: cli.dry_run,
        self_install: cli.self_install,
    };
    let dry_run = options.dry_run;

    match tspi::run(options, &logger) {
        Ok(InstallOutcome::Skipped) => {}
        Ok(InstallOutcome::Installed(report)) => {
            let verb = if dry_run { "Would install" } else { "Installed" };
            logger.success(&format!(
                "{} typings for {} at {}",
                verb,
                report.package_name,
                report.main_declaration.display()
            ));
        }
        Err(e) => {
            logger.error(&e.to_string());
            std::process::exit(1);
        }
    }
}
