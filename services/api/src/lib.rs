mod cli;
mod infra;
mod routes;
mod server;
mod sweeper;

use client_matrix::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
