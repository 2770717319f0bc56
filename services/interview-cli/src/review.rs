use crate::demo::{render_history, render_report};
use crate::infra::{offline_collaborators, open_store, read_resume, SimulatedClock};
use chrono::Utc;
use clap::Args;
use interview_engine::config::AppConfig;
use interview_engine::error::AppError;
use interview_engine::workflows::interview::{
    resume_fingerprint, QuestionHistoryStore, ReportId, SessionController,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct HistoryArgs {
    /// Show one stored report in detail
    #[arg(long)]
    pub(crate) report: Option<String>,
    /// Print as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QuestionArgs {
    /// Job role the questions were generated for
    #[arg(long)]
    pub(crate) role: String,
    /// Resume text file the questions were generated from
    #[arg(long)]
    pub(crate) resume: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExpireArgs {
    /// Retention window in days. Defaults to INTERVIEW_HISTORY_RETENTION_DAYS.
    #[arg(long)]
    pub(crate) days: Option<u32>,
}

pub(crate) fn run_history(config: &AppConfig, args: HistoryArgs) -> Result<(), AppError> {
    let store = open_store(&config.storage.store_path)?;
    let clock = Arc::new(SimulatedClock::starting_now());
    let mut controller = SessionController::new(config.session, store, offline_collaborators(clock));

    match args.report {
        Some(id) => {
            controller.show_history()?;
            let report = controller.view_report(&ReportId(id))?;
            if args.json {
                let encoded = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
                println!("{encoded}");
            } else {
                render_report(report);
            }
        }
        None => {
            let reports = controller.show_history()?;
            if args.json {
                let encoded =
                    serde_json::to_string_pretty(reports).map_err(std::io::Error::from)?;
                println!("{encoded}");
            } else {
                render_history(reports);
            }
        }
    }

    Ok(())
}

pub(crate) fn run_questions(config: &AppConfig, args: QuestionArgs) -> Result<(), AppError> {
    let QuestionArgs { role, resume } = args;
    let history = QuestionHistoryStore::new(open_store(&config.storage.store_path)?);
    let resume = read_resume(&resume)?;

    let stats = history.statistics(&role, &resume);
    println!(
        "Question history for '{}' (resume {})",
        role.trim(),
        resume_fingerprint(&resume)
    );
    println!(
        "- {} unique questions | {} presentations | {:.2} average reuse",
        stats.unique_count, stats.total_asked, stats.average_reuse
    );
    for question in history.previously_asked(&role, &resume) {
        println!("  - {question}");
    }

    Ok(())
}

pub(crate) fn run_expire(config: &AppConfig, args: ExpireArgs) -> Result<(), AppError> {
    let days = args
        .days
        .unwrap_or(config.storage.history_retention_days);
    let history = QuestionHistoryStore::new(open_store(&config.storage.store_path)?);

    let removed = history.expire(days, Utc::now())?;
    println!("Removed {removed} question history entries older than {days} days");

    Ok(())
}
