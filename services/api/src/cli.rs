use crate::server;
use crate::sweeper;
use clap::{Args, Parser, Subcommand};
use client_matrix::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Client Matrix",
    about = "Serve and maintain client prioritization matrices",
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
    /// Run one retention sweep: purge expired matrices and assessment sessions
    Purge(PurgeArgs),
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

#[derive(Args, Debug, Default)]
pub(crate) struct PurgeArgs {
    /// SQLite database to sweep (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Days a soft-deleted matrix is kept (defaults to MATRIX_RETENTION_DAYS)
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    pub(crate) retention_days: Option<i64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Purge(args) => sweeper::run_once(args),
    }
}
