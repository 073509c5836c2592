use crate::demo::{run_demo, run_summary, DemoArgs, SummaryArgs};
use crate::export::{run_export, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sole_agent::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sole Agent",
    about = "Run and inspect the sole agent lettings pipeline from the command line",
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
    /// Walk an applicant and a property from intake to archive in memory
    Demo(DemoArgs),
    /// Print the pipeline summary of the persisted snapshot
    Summary(SummaryArgs),
    /// Export applicants, properties and matches as CSV
    Export(ExportArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Summary(args) => run_summary(args),
        Command::Export(args) => run_export(args),
    }
}
