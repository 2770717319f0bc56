use crate::infra::{offline_collaborators, open_store, read_resume, SimulatedClock};
use chrono::Duration;
use clap::Args;
use interview_engine::config::AppConfig;
use interview_engine::error::AppError;
use interview_engine::workflows::interview::{
    BeginOutcome, EvaluationConfig, EvaluationEngine, InterviewReport, QuestionAndAnswer,
    SessionController,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SAMPLE_RESUME: &str = "Frontend engineer with 5 years of React and TypeScript. \
Led a design system rollout across four product teams, cut bundle size by 40% with route-level \
code splitting, and introduced Playwright end-to-end tests in CI.";

const SAMPLE_ANSWERS: &[&str] = &[
    "At my last company I owned the checkout flow. I rewrote it with React hooks, added \
     Playwright coverage for every payment path, and we cut checkout errors by about a third.",
    "Um, I think the most important skill is, uh, communication. You know, making sure the \
     designers and backend engineers agree on the contract before anyone writes code.",
    "We had a memory leak in a long lived dashboard. I profiled it with the browser tools, found \
     subscriptions that were never cleaned up, and fixed them in a shared hook.",
    "Basically I read the release notes and, like, try things in small side projects.",
    "",
];

/// Milliseconds of simulated speaking time per transcribed word.
const WORD_MILLIS: i64 = 450;
const THINKING_SECS: i64 = 3;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Job role to interview for
    #[arg(long, default_value = "Frontend Developer")]
    pub(crate) role: String,
    /// Resume text file. Defaults to a bundled sample resume.
    #[arg(long)]
    pub(crate) resume: Option<PathBuf>,
    /// File with one scripted answer per line. Defaults to bundled sample answers.
    #[arg(long)]
    pub(crate) answers: Option<PathBuf>,
    /// Simulate this many focus-loss events during the first question
    #[arg(long, default_value_t = 0)]
    pub(crate) focus_losses: u32,
    /// Stop the interview after this many answers
    #[arg(long)]
    pub(crate) stop_after: Option<usize>,
    /// Seed the score jitter for reproducible output
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Print the report as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            role: "Frontend Developer".to_string(),
            resume: None,
            answers: None,
            focus_losses: 0,
            stop_after: None,
            seed: None,
            json: false,
        }
    }
}

pub(crate) async fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        role,
        resume,
        answers,
        focus_losses,
        stop_after,
        seed,
        json,
    } = args;

    let store = open_store(&config.storage.store_path)?;
    let clock = Arc::new(SimulatedClock::starting_now());
    let engine = match seed {
        Some(seed) => EvaluationEngine::with_seed(EvaluationConfig::default(), seed),
        None => EvaluationEngine::default(),
    };
    let mut controller = SessionController::new(
        config.session,
        store,
        offline_collaborators(Arc::clone(&clock)),
    )
    .with_engine(engine);

    println!("Mock interview demo");
    if let BeginOutcome::LimitReached { notice } = controller.begin()? {
        println!("{notice}");
        render_history(&controller.state().history);
        return Ok(());
    }

    let resume = match resume {
        Some(path) => read_resume(&path)?,
        None => SAMPLE_RESUME.to_string(),
    };
    let answers = scripted_answers(answers.as_deref())?;

    controller.submit_setup(&role, &resume)?;
    controller.grant_permissions().await?;

    let total = controller.state().questions.len();
    let answer_limit = stop_after.unwrap_or(total).min(total);
    println!(
        "Role: {} | {} questions | daily attempts used: {}",
        controller.state().job_role,
        total,
        controller.state().daily_attempts.count
    );

    for index in 0..answer_limit {
        if let Some(notice) = controller.present_question().await {
            println!("{notice}");
        }
        if index == 0 {
            for _ in 0..focus_losses {
                if let Some(notice) = controller.record_focus_loss() {
                    println!("! {notice}");
                }
            }
        }

        controller.start_answer()?;
        clock.advance(Duration::seconds(THINKING_SECS));
        let answer = answers.get(index).map(String::as_str).unwrap_or("");
        let mut partial = String::new();
        for word in answer.split_whitespace() {
            if !partial.is_empty() {
                partial.push(' ');
            }
            partial.push_str(word);
            clock.advance(Duration::milliseconds(WORD_MILLIS));
            controller.push_transcript(&partial)?;
        }
        let entry = controller.stop_answer()?;
        render_answer(&entry);
    }

    if answer_limit < total {
        println!("\nCandidate ended the interview after {answer_limit} of {total} questions.");
    }
    controller.finish_interview()?;
    let report = controller.evaluate().await?;

    if json {
        let encoded = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
        println!("{encoded}");
    } else {
        render_report(report);
    }

    Ok(())
}

fn scripted_answers(path: Option<&Path>) -> Result<Vec<String>, AppError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?
            .lines()
            .map(|line| line.trim().to_string())
            .collect()),
        None => Ok(SAMPLE_ANSWERS
            .iter()
            .map(|answer| answer.to_string())
            .collect()),
    }
}

fn render_answer(entry: &QuestionAndAnswer) {
    if entry.answer.is_empty() {
        println!("Candidate: (no answer)");
    } else {
        println!("Candidate: {}", entry.answer);
    }
    println!(
        "  {:.1}s | {} hesitations | clarity {:.1} | confidence {:.1}",
        entry.response_time, entry.hesitation_count, entry.clarity_score, entry.confidence
    );
}

fn render_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{title}");
    for item in items {
        println!("- {item}");
    }
}

pub(crate) fn render_report(report: &InterviewReport) {
    println!("\nInterview report {}", report.id);
    println!(
        "Role: {} | {} | scoring: {}",
        report.job_role,
        report.date.format("%Y-%m-%d %H:%M UTC"),
        report.scoring_mode.label()
    );
    println!(
        "Scores: communication {:.1} | technical {:.1} | logic {:.1} | overall {:.1}",
        report.scores.communication,
        report.scores.technical,
        report.scores.logic,
        report.scores.overall
    );
    if report.fraud_status {
        println!("Flag: the focus-loss warning threshold was reached during this session");
    }

    render_list("Strengths", &report.summary.strengths);
    render_list("Weaknesses", &report.summary.weaknesses);
    render_list("Suggestions", &report.summary.suggestions);

    println!("\nQuestion feedback");
    for (index, detail) in report.details.iter().enumerate() {
        println!(
            "{}. {} [{:.1}/10, {}]",
            index + 1,
            detail.question,
            detail.score,
            detail.tone.label()
        );
        println!("   {}", detail.feedback);
    }
}

pub(crate) fn render_history(reports: &[InterviewReport]) {
    if reports.is_empty() {
        println!("No interview reports stored yet.");
        return;
    }
    println!("\nStored reports (newest first)");
    for report in reports {
        println!(
            "- {} | {} | {} | overall {:.1}{}",
            report.id,
            report.date.format("%Y-%m-%d %H:%M"),
            report.job_role,
            report.scores.overall,
            if report.fraud_status { " | flagged" } else { "" }
        );
    }
}
