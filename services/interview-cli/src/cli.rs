use crate::demo::{run_demo, DemoArgs};
use crate::review::{run_expire, run_history, run_questions, ExpireArgs, HistoryArgs, QuestionArgs};
use clap::{Parser, Subcommand};
use interview_engine::config::AppConfig;
use interview_engine::error::AppError;
use interview_engine::telemetry;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Interview Coach",
    about = "Run and review mock interview sessions from the command line",
    version
)]
struct Cli {
    /// Override the configured store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted offline interview session (default command)
    Demo(DemoArgs),
    /// List stored interview reports or show one in detail
    History(HistoryArgs),
    /// Show question reuse statistics for a role and resume
    Questions(QuestionArgs),
    /// Remove question history older than the retention window
    Expire(ExpireArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;

    if let Some(store) = cli.store {
        config.storage.store_path = store;
    }

    telemetry::init(&config.telemetry)?;
    info!(
        ?config.environment,
        store = %config.storage.store_path.display(),
        "interview coach ready"
    );

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Demo(args) => run_demo(&config, args).await,
        Command::History(args) => run_history(&config, args),
        Command::Questions(args) => run_questions(&config, args),
        Command::Expire(args) => run_expire(&config, args),
    }
}
