//! Mock interview session engine: phase control, answer analysis, scoring, and persistence.
//!
//! External services (question generation, rating, speech, capture) sit behind the traits in
//! [`collaborators`], so a session can run fully offline with the template bank and heuristic
//! scoring.

pub mod analysis;
pub mod attempts;
pub mod collaborators;
pub mod controller;
pub mod domain;
pub mod evaluation;
pub mod history;
pub mod questions;
pub mod state;
pub mod storage;

#[cfg(test)]
mod tests;

pub use analysis::{AnswerAnalyzer, AnswerCapture, CapturedAnswer, FillerLexicon, HesitationTracker};
pub use attempts::{AttemptPolicy, DailyLimit, ParseDailyLimitError, WarningOutcome};
pub use collaborators::{
    CaptureDevice, CaptureHandle, CaptureStream, Clock, EvaluationError, EvaluationRater,
    ExternalCategoryScores, ExternalEvaluation, ExternalQuestionFeedback, GenerationError,
    PermissionDenied, QuestionGenerator, SpeechError, SpeechSynthesizer, SystemClock,
};
pub use controller::{
    BeginOutcome, Collaborators, FatalStateError, RequestPurpose, RequestTicket, SessionConfig,
    SessionController, SessionError, SetupValidationError,
};
pub use domain::{
    CategoryScores, DailyAttempts, InterviewReport, QuestionAndAnswer, QuestionFeedback,
    ReportId, ReportSummary, ScoringMode, Tone,
};
pub use evaluation::{BlendWeights, EvaluationConfig, EvaluationEngine, EvaluationOutcome};
pub use history::{
    resume_fingerprint, QuestionHistoryEntry, QuestionHistoryStore, QuestionStatistics,
    QuestionUsage,
};
pub use questions::TemplateQuestionBank;
pub use state::{Action, IllegalTransition, InterviewState, Phase};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, StorageError};
