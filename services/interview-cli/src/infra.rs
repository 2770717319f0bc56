use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use interview_engine::error::AppError;
use interview_engine::workflows::interview::{
    CaptureDevice, CaptureStream, Clock, Collaborators, EvaluationError, EvaluationRater,
    ExternalEvaluation, GenerationError, JsonFileStore, PermissionDenied, QuestionAndAnswer,
    QuestionGenerator, SpeechError, SpeechSynthesizer,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Question provider for runs without network access. Always defers to the template bank.
#[derive(Default, Clone)]
pub(crate) struct OfflineQuestionGenerator;

#[async_trait]
impl QuestionGenerator for OfflineQuestionGenerator {
    async fn generate_questions(
        &self,
        _job_role: &str,
        _resume_content: &str,
        _previously_asked: &[String],
        _count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        Err(GenerationError::Unavailable(
            "offline mode: no question provider configured".to_string(),
        ))
    }
}

/// Rating provider for runs without network access. Scoring falls back to heuristics.
#[derive(Default, Clone)]
pub(crate) struct OfflineRater;

#[async_trait]
impl EvaluationRater for OfflineRater {
    async fn rate(
        &self,
        _job_role: &str,
        _resume_content: &str,
        _transcript: &[QuestionAndAnswer],
    ) -> Result<ExternalEvaluation, EvaluationError> {
        Err(EvaluationError::Unavailable(
            "offline mode: no rating provider configured".to_string(),
        ))
    }
}

/// Prints questions instead of speaking them.
#[derive(Default, Clone)]
pub(crate) struct ConsoleSpeech;

#[async_trait]
impl SpeechSynthesizer for ConsoleSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        println!("\nInterviewer: {text}");
        Ok(())
    }
}

struct SimulatedStream;

impl CaptureStream for SimulatedStream {
    fn release(&mut self) {
        debug!("simulated microphone released");
    }
}

/// Stands in for a microphone; the demo feeds transcripts directly.
#[derive(Default, Clone)]
pub(crate) struct SimulatedMicrophone;

#[async_trait]
impl CaptureDevice for SimulatedMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, PermissionDenied> {
        debug!("simulated microphone acquired");
        Ok(Box::new(SimulatedStream))
    }
}

/// Wall clock that the demo advances by hand to model speaking time.
pub(crate) struct SimulatedClock {
    now: Mutex<DateTime<Utc>>,
}

impl SimulatedClock {
    pub(crate) fn starting_now() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now = *now + by;
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(_) => Utc::now(),
        }
    }
}

pub(crate) fn offline_collaborators(clock: Arc<SimulatedClock>) -> Collaborators {
    Collaborators {
        generator: Arc::new(OfflineQuestionGenerator),
        rater: Arc::new(OfflineRater),
        speech: Arc::new(ConsoleSpeech),
        capture: Arc::new(SimulatedMicrophone),
        clock,
    }
}

pub(crate) fn open_store(path: &Path) -> Result<Arc<JsonFileStore>, AppError> {
    let store = JsonFileStore::open(path)?;
    info!(path = %store.path().display(), "interview store opened");
    Ok(Arc::new(store))
}

pub(crate) fn read_resume(path: &Path) -> Result<String, AppError> {
    Ok(std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_clock_only_moves_when_advanced() {
        let clock = SimulatedClock::starting_now();
        let start = clock.now();

        clock.advance(Duration::seconds(30));

        assert_eq!(clock.now() - start, Duration::seconds(30));
    }

    #[tokio::test]
    async fn offline_providers_always_defer() {
        let questions = OfflineQuestionGenerator
            .generate_questions("Data Analyst", "SQL", &[], 5)
            .await;
        assert!(matches!(questions, Err(GenerationError::Unavailable(_))));

        let rating = OfflineRater.rate("Data Analyst", "SQL", &[]).await;
        assert!(matches!(rating, Err(EvaluationError::Unavailable(_))));
    }
}
