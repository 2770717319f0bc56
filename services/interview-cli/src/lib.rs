mod cli;
mod demo;
mod infra;
mod review;

use interview_engine::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
