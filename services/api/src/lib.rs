mod cli;
mod commands;
mod infra;
mod requests;
mod routes;
mod server;

use aid_engine::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
