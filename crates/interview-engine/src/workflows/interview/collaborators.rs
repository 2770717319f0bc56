//! Outbound seams: text generation, rating, speech, capture, and time.
//!
//! Providers implement these traits; the engine only relies on the signatures and error types
//! declared here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{QuestionAndAnswer, ReportSummary, Tone};

/// Question generation failed at the provider or network level, or returned unusable output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("question provider unavailable: {0}")]
    Unavailable(String),
    #[error("question provider returned unparsable output: {0}")]
    Unparsable(String),
}

/// Rating failed at the provider or network level, or returned unusable output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("rating provider unavailable: {0}")]
    Unavailable(String),
    #[error("rating provider returned unparsable output: {0}")]
    Unparsable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("speech synthesis failed: {0}")]
pub struct SpeechError(pub String);

/// Capture stream could not be acquired (device missing or permission refused).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("capture permission denied: {0}")]
pub struct PermissionDenied(pub String);

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Produce `count` questions, avoiding near-duplicates of `previously_asked`.
    async fn generate_questions(
        &self,
        job_role: &str,
        resume_content: &str,
        previously_asked: &[String],
        count: usize,
    ) -> Result<Vec<String>, GenerationError>;
}

/// Category ratings supplied by the rating provider, each on a 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalCategoryScores {
    pub communication: f32,
    pub technical: f32,
    pub logic: f32,
}

/// Provider feedback for a single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalQuestionFeedback {
    pub feedback: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvaluation {
    pub category_scores: ExternalCategoryScores,
    pub summary: ReportSummary,
    #[serde(default)]
    pub per_question: Vec<ExternalQuestionFeedback>,
}

#[async_trait]
pub trait EvaluationRater: Send + Sync {
    async fn rate(
        &self,
        job_role: &str,
        resume_content: &str,
        transcript: &[QuestionAndAnswer],
    ) -> Result<ExternalEvaluation, EvaluationError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Resolves once audible playback has finished.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Live media stream held exclusively by one session.
pub trait CaptureStream: Send {
    fn release(&mut self);
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, PermissionDenied>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Owner of the session's capture stream. Releasing twice is a no-op, and dropping releases.
pub struct CaptureHandle {
    stream: Option<Box<dyn CaptureStream>>,
}

impl CaptureHandle {
    pub fn new(stream: Box<dyn CaptureStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("live", &self.is_live())
            .finish()
    }
}
