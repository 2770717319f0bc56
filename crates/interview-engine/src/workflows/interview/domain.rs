use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for generated interview reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery tone attached to an answer, either defaulted or supplied by the rating provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Confident,
    Uncertain,
    #[default]
    Neutral,
    Defensive,
}

impl Tone {
    pub const fn label(self) -> &'static str {
        match self {
            Tone::Confident => "confident",
            Tone::Uncertain => "uncertain",
            Tone::Neutral => "neutral",
            Tone::Defensive => "defensive",
        }
    }
}

/// One asked question together with the captured answer and its heuristic metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionAndAnswer {
    pub question: String,
    pub answer: String,
    /// Seconds between the start and stop of the listening window.
    pub response_time: f32,
    pub hesitation_count: u32,
    pub clarity_score: f32,
    pub confidence: f32,
    pub tone: Tone,
    /// Filled once the transcript has been evaluated.
    pub score: f32,
}

impl QuestionAndAnswer {
    pub fn word_count(&self) -> usize {
        self.answer.split_whitespace().count()
    }
}

/// Per-category scores on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub communication: f32,
    pub technical: f32,
    pub logic: f32,
    pub overall: f32,
}

impl CategoryScores {
    pub fn is_zero(&self) -> bool {
        self.communication == 0.0
            && self.technical == 0.0
            && self.logic == 0.0
            && self.overall == 0.0
    }
}

/// Narrative portion of a report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Feedback attached to a single transcript entry, in transcript order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub score: f32,
    pub tone: Tone,
}

/// Which signal sources contributed to the category scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Heuristic metrics blended with the external rating provider.
    Blended,
    /// The rating provider failed; heuristic metrics carry the full weight.
    HeuristicOnly,
    /// No answer carried measurable content.
    NoResponse,
}

impl ScoringMode {
    pub const fn label(self) -> &'static str {
        match self {
            ScoringMode::Blended => "blended",
            ScoringMode::HeuristicOnly => "heuristic_only",
            ScoringMode::NoResponse => "no_response",
        }
    }
}

/// Final output of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewReport {
    pub id: ReportId,
    pub date: DateTime<Utc>,
    pub job_role: String,
    pub scores: CategoryScores,
    pub summary: ReportSummary,
    pub details: Vec<QuestionFeedback>,
    pub fraud_status: bool,
    pub scoring_mode: ScoringMode,
}

/// Attempts started on a given calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAttempts {
    pub count: u32,
    pub date: NaiveDate,
}

impl DailyAttempts {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            count: 0,
            date: today,
        }
    }
}
