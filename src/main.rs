//! Scantool Supervisor - supervised execution of the scan worker.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scantool_supervisor::command::{CommandMasker, InvocationBuilder};
use scantool_supervisor::config::ConfigLoader;
use scantool_supervisor::display::ConsoleSink;
use scantool_supervisor::supervisor::{Outcome, WorkerCommand};

#[derive(Parser)]
#[command(
    name = "scantool-supervisor",
    about = "Run the scan worker under supervision with live progress",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a worker command line under supervision.
    Run {
        /// Append the porcelain flag so the worker frames its output.
        #[arg(long)]
        porcelain: bool,
        /// Override the poll interval from the configuration.
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        /// The worker command: program followed by its arguments
        /// (`-J`-prefixed arguments are routed to the launcher).
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        argv: Vec<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            porcelain,
            poll_interval_ms,
            argv,
        } => {
            let config = match ConfigLoader::new().load() {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    std::process::exit(2);
                }
            };

            let mut invocation = InvocationBuilder::new(argv[0].clone()).porcelain(porcelain);
            invocation = invocation.args(argv[1..].iter().cloned());
            let argv = invocation.build();

            let poll_interval = poll_interval_ms
                .map_or_else(|| config.poll_interval(), Duration::from_millis);
            let mut command = WorkerCommand::new(argv)
                .poll_interval(poll_interval)
                .terminate_timeout(config.terminate_timeout());

            let masked = CommandMasker::new().render(command.argv());
            tracing::info!(command = %masked, "starting supervised worker");

            match command.run(Arc::new(ConsoleSink::new())).await {
                Ok(Outcome::Success) => {}
                Ok(Outcome::FailureReported) => {
                    eprintln!(
                        "{}",
                        "worker failed; the cause is in the diagnostic output above".red()
                    );
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("{} {err}", "error:".red().bold());
                    std::process::exit(1);
                }
            }
        }
    }
}
