use crate::demo::{run_demo, run_dispatch_overview, DemoArgs, OverviewArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use solar_ops::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Solar Ops Dispatch",
    about = "Recommend installation crews for upcoming solar jobs",
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
    /// Inspect the dispatch board from the command line
    Dispatch {
        #[command(subcommand)]
        command: DispatchCommand,
    },
    /// Walk through a recommendation and commit against the sample board
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum DispatchCommand {
    /// Print recommendations for every candidate job on a date
    Overview(OverviewArgs),
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
        Command::Dispatch {
            command: DispatchCommand::Overview(args),
        } => run_dispatch_overview(args),
        Command::Demo(args) => run_demo(args),
    }
}
