//! novel-dl CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use novel_dl::{
    error::Result,
    models::Config,
    pipeline::{self, Target},
    services::Discoverer,
    session::{HttpSession, PageSession},
};

/// novel-dl - Web Novel Downloader
#[derive(Parser, Debug)]
#[command(
    name = "novel-dl",
    version,
    about = "Download web novels into a single text file",
    long_about = "Download web novels into a single text file.\n\n\
                  Pages are fetched over plain HTTP, so there is no browser window \
                  and no headless switch."
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "novel-dl.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a novel and print its metadata as JSON
    Info {
        /// Novel name or catalog URL
        target: String,
    },

    /// Download every chapter of a novel
    Download {
        /// Novel name or catalog URL
        target: String,

        /// Directory for the output file (default: from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of concurrent workers (default: from config)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-page timeout in seconds (default: from config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn open_session(config: &Config) -> Result<Arc<dyn PageSession>> {
    Ok(Arc::new(HttpSession::new(&config.catalog)?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Info { target } => {
            config.validate()?;
            let discoverer = Discoverer::new(open_session(&config)?, &config);
            let record = match pipeline::discover(&discoverer, &Target::parse(&target)).await {
                Ok(record) => record,
                Err(failure) => {
                    log::error!("Discovery failed: {}", failure);
                    std::process::exit(1);
                }
            };

            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Command::Download {
            target,
            output_dir,
            workers,
            timeout,
        } => {
            if let Some(dir) = output_dir {
                config.download.output_dir = dir;
            }
            if let Some(secs) = timeout {
                config.download.timeout_secs = secs;
            }
            let workers = workers.unwrap_or(config.download.concurrency);
            config.validate()?;

            let session = open_session(&config)?;
            let outcome =
                match pipeline::run_download(session, &config, &Target::parse(&target), workers)
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(failure) => {
                        log::error!("Discovery failed: {}", failure);
                        std::process::exit(1);
                    }
                };

            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.is_success() {
                log::error!(
                    "{}",
                    outcome.message.as_deref().unwrap_or("download incomplete")
                );
                std::process::exit(1);
            }
            log::info!("Saved to {}", outcome.output_path.display());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({})", cli.config.display());
        }
    }

    Ok(())
}
