use clap::Parser;
use cost_guard::args::{Args, Command};
use cost_guard::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().costguard_home().path();

    // This allows for running the program without any upstream cost API. When
    // COSTGUARD_DEMO is set and non-zero in length, the mode will be
    // Mode::Demo, otherwise it will be Mode::Upstream.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.upstream_url())
            .await?
            .print(),

        Command::Serve => {
            let config = Config::load(home).await?;
            commands::serve(config, mode).await?.print()
        }

        Command::Movers(movers_args) => {
            let config = Config::load(home).await?;
            commands::movers(&config, mode, movers_args.window(), movers_args.limit())
                .await?
                .print()
        }

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::summary(&config, mode, summary_args.window())
                .await?
                .print()
        }

        Command::Analyze(analyze_args) => {
            let config = Config::load(home).await?;
            commands::analyze(&config, mode, analyze_args.out(), analyze_args.csv())
                .await?
                .print()
        }

        Command::Resource(resource_args) => {
            let config = Config::load(home).await?;
            commands::resource(&config, mode, resource_args.id())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
