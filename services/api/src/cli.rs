use crate::commands::{
    run_export, run_reindex, run_translate, ExportArgs, ReindexArgs, TranslateArgs,
};
use crate::server;
use bsd_index::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bsd-index",
    about = "Index waste tracking documents and query the registry from the command line",
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
    /// Rebuild the index from a fixtures file and print the job report
    Reindex(ReindexArgs),
    /// Print the search body a registry `where` clause translates to
    Translate(TranslateArgs),
    /// Index a fixtures file and export the documents matching a `where` clause as CSV
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
    /// JSON file of bordereaux to load and index before accepting traffic
    #[arg(long)]
    pub(crate) fixtures: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Reindex(args) => run_reindex(args).await,
        Command::Translate(args) => run_translate(args),
        Command::Export(args) => run_export(args).await,
    }
}
