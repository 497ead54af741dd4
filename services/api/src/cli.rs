use crate::commands::{run_estimate, run_simulate, EstimateArgs, SimulateArgs};
use crate::server;
use aid_engine::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Activity Aid Estimator",
    about = "Estimate financial aid for youth activities from the command line or over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run the bracket-only simulator for a QF and a price
    Simulate(SimulateArgs),
    /// Run a staged estimate from a JSON input file
    Estimate(EstimateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Simulate(args) => run_simulate(args),
        Command::Estimate(args) => run_estimate(args),
    }
}
