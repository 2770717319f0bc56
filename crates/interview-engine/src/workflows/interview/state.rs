use serde::{Deserialize, Serialize};

use super::domain::{DailyAttempts, InterviewReport, QuestionAndAnswer, ReportId};

/// Screen-level phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Welcome,
    Setup,
    Permissions,
    Interview,
    Evaluation,
    Report,
    History,
}

impl Phase {
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Welcome => "welcome",
            Phase::Setup => "setup",
            Phase::Permissions => "permissions",
            Phase::Interview => "interview",
            Phase::Evaluation => "evaluation",
            Phase::Report => "report",
            Phase::History => "history",
        }
    }
}

/// Every mutation the session state accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Welcome → Setup.
    Begin,
    /// Setup → Permissions, storing the candidate's role and resume.
    SetSetup {
        job_role: String,
        resume_content: String,
    },
    /// The capture stream is live; stays in Permissions until questions arrive.
    SetPermissions,
    /// Permissions → Interview with a fresh question set.
    StartInterview { questions: Vec<String> },
    /// Append the answer for the current question and advance.
    NextQuestion { entry: QuestionAndAnswer },
    AddWarning,
    /// Interview → Evaluation.
    FinishInterview,
    /// Evaluation → Report with the scored transcript and the updated attempt counter.
    SetEvaluation {
        report: InterviewReport,
        transcript: Vec<QuestionAndAnswer>,
        daily_attempts: DailyAttempts,
    },
    /// Interview/Evaluation → Setup after an irrecoverable failure.
    Abort,
    ShowHistory,
    /// History → Report for a stored report.
    ViewReport { id: ReportId },
    SyncAttempts { daily_attempts: DailyAttempts },
    /// Report/History → Setup with a clean session.
    Reset,
}

impl Action {
    pub const fn name(&self) -> &'static str {
        match self {
            Action::Begin => "begin",
            Action::SetSetup { .. } => "set_setup",
            Action::SetPermissions => "set_permissions",
            Action::StartInterview { .. } => "start_interview",
            Action::NextQuestion { .. } => "next_question",
            Action::AddWarning => "add_warning",
            Action::FinishInterview => "finish_interview",
            Action::SetEvaluation { .. } => "set_evaluation",
            Action::Abort => "abort",
            Action::ShowHistory => "show_history",
            Action::ViewReport { .. } => "view_report",
            Action::SyncAttempts { .. } => "sync_attempts",
            Action::Reset => "reset",
        }
    }
}

/// Reasons the reducer refuses an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalTransition {
    #[error("action '{action}' is not allowed during the {} phase", phase.label())]
    WrongPhase { phase: Phase, action: &'static str },
    #[error("every question already has an answer")]
    QuestionsExhausted,
    #[error("answer recorded for '{found}' but the current question is '{expected}'")]
    QuestionMismatch { expected: String, found: String },
    #[error("an interview needs at least one question")]
    NoQuestions,
    #[error("evaluated transcript has {found} entries, expected {expected}")]
    TranscriptMismatch { expected: usize, found: usize },
    #[error("report {0} is not in the history")]
    UnknownReport(ReportId),
}

/// All data owned by a session controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    pub phase: Phase,
    pub job_role: String,
    pub resume_content: String,
    pub permissions_granted: bool,
    pub questions: Vec<String>,
    pub current_question_index: usize,
    pub transcript: Vec<QuestionAndAnswer>,
    pub warnings: u32,
    pub report: Option<InterviewReport>,
    /// Newest first.
    pub history: Vec<InterviewReport>,
    pub daily_attempts: DailyAttempts,
}

impl InterviewState {
    pub fn new(history: Vec<InterviewReport>, daily_attempts: DailyAttempts) -> Self {
        Self {
            phase: Phase::Welcome,
            job_role: String::new(),
            resume_content: String::new(),
            permissions_granted: false,
            questions: Vec::new(),
            current_question_index: 0,
            transcript: Vec::new(),
            warnings: 0,
            report: None,
            history,
            daily_attempts,
        }
    }

    pub fn current_question(&self) -> Option<&str> {
        if self.phase != Phase::Interview {
            return None;
        }
        self.questions
            .get(self.current_question_index)
            .map(String::as_str)
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.transcript.len() >= self.questions.len()
    }

    fn wrong_phase(&self, action: &Action) -> IllegalTransition {
        IllegalTransition::WrongPhase {
            phase: self.phase,
            action: action.name(),
        }
    }

    /// Pure transition function. The receiver is never modified; a successor state is returned.
    pub fn reduce(&self, action: Action) -> Result<InterviewState, IllegalTransition> {
        let mut next = self.clone();

        match (self.phase, action) {
            (Phase::Welcome, Action::Begin) => {
                next.phase = Phase::Setup;
            }
            (
                Phase::Setup,
                Action::SetSetup {
                    job_role,
                    resume_content,
                },
            ) => {
                next.job_role = job_role;
                next.resume_content = resume_content;
                next.permissions_granted = false;
                next.phase = Phase::Permissions;
            }
            (Phase::Permissions, Action::SetPermissions) => {
                next.permissions_granted = true;
            }
            (Phase::Permissions, Action::StartInterview { questions }) => {
                if questions.is_empty() {
                    return Err(IllegalTransition::NoQuestions);
                }
                if !self.permissions_granted {
                    return Err(self.wrong_phase(&Action::StartInterview { questions }));
                }
                next.questions = questions;
                next.current_question_index = 0;
                next.transcript.clear();
                next.warnings = 0;
                next.phase = Phase::Interview;
            }
            (Phase::Interview, Action::NextQuestion { entry }) => {
                let Some(expected) = self.questions.get(self.current_question_index) else {
                    return Err(IllegalTransition::QuestionsExhausted);
                };
                if *expected != entry.question {
                    return Err(IllegalTransition::QuestionMismatch {
                        expected: expected.clone(),
                        found: entry.question,
                    });
                }
                next.transcript.push(entry);
                next.current_question_index = next.transcript.len();
            }
            (Phase::Interview, Action::AddWarning) => {
                next.warnings = self.warnings.saturating_add(1);
            }
            (Phase::Interview, Action::FinishInterview) => {
                next.permissions_granted = false;
                next.phase = Phase::Evaluation;
            }
            (
                Phase::Evaluation,
                Action::SetEvaluation {
                    report,
                    transcript,
                    daily_attempts,
                },
            ) => {
                if transcript.len() != self.transcript.len()
                    || report.details.len() != self.transcript.len()
                {
                    return Err(IllegalTransition::TranscriptMismatch {
                        expected: self.transcript.len(),
                        found: transcript.len().min(report.details.len()),
                    });
                }
                next.transcript = transcript;
                next.history.insert(0, report.clone());
                next.report = Some(report);
                next.daily_attempts = daily_attempts;
                next.phase = Phase::Report;
            }
            (Phase::Interview | Phase::Evaluation, Action::Abort) => {
                next.questions.clear();
                next.current_question_index = 0;
                next.transcript.clear();
                next.report = None;
                next.warnings = 0;
                next.permissions_granted = false;
                next.phase = Phase::Setup;
            }
            (Phase::Welcome | Phase::Setup | Phase::Report, Action::ShowHistory) => {
                next.phase = Phase::History;
            }
            (Phase::History, Action::ViewReport { id }) => {
                let Some(report) = self.history.iter().find(|report| report.id == id) else {
                    return Err(IllegalTransition::UnknownReport(id));
                };
                next.report = Some(report.clone());
                next.phase = Phase::Report;
            }
            (_, Action::SyncAttempts { daily_attempts }) => {
                next.daily_attempts = daily_attempts;
            }
            (Phase::Report | Phase::History, Action::Reset) => {
                next = InterviewState::new(self.history.clone(), self.daily_attempts);
                next.phase = Phase::Setup;
            }
            (_, action) => return Err(self.wrong_phase(&action)),
        }

        Ok(next)
    }
}
