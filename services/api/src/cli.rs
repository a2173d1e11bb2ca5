use crate::demo::{run_availability, run_demo, run_match, AvailabilityArgs, DemoArgs, MatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use homevisit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Home Visit Scheduler",
    about = "Run and explore the home visit availability and staff matching engine",
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
    /// Print slot availability for a date against the demo tenant
    Availability(AvailabilityArgs),
    /// Pick the best staff member for a slot against the demo tenant
    Match(MatchArgs),
    /// Walk through availability, calendar, and staff matching for the demo tenant
    Demo(DemoArgs),
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
        Command::Availability(args) => run_availability(args).await,
        Command::Match(args) => run_match(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
