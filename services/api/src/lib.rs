mod cli;
mod infra;
mod routes;
mod server;
mod solve;

use volunteer_match::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
