use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::interview::collaborators::{
    CaptureDevice, CaptureStream, Clock, EvaluationError, EvaluationRater, ExternalCategoryScores,
    ExternalEvaluation, ExternalQuestionFeedback, GenerationError, PermissionDenied,
    QuestionGenerator, SpeechError, SpeechSynthesizer,
};
use crate::workflows::interview::controller::{Collaborators, SessionConfig, SessionController};
use crate::workflows::interview::domain::{QuestionAndAnswer, ReportSummary, Tone};
use crate::workflows::interview::evaluation::{EvaluationConfig, EvaluationEngine};
use crate::workflows::interview::storage::MemoryStore;

pub(super) const SEED: u64 = 7;

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub(super) fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

pub(super) fn questions(count: usize) -> Vec<String> {
    (1..=count)
        .map(|index| format!("Scripted question {index}?"))
        .collect()
}

/// Returns the same response on every call and records what the controller passed in.
pub(super) struct ScriptedGenerator {
    response: Result<Vec<String>, GenerationError>,
    pub(super) previously_asked: Mutex<Vec<Vec<String>>>,
}

impl ScriptedGenerator {
    pub(super) fn returning(questions: Vec<String>) -> Self {
        Self {
            response: Ok(questions),
            previously_asked: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            response: Err(GenerationError::Unavailable("offline".to_string())),
            previously_asked: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.previously_asked.lock().expect("generator lock").len()
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate_questions(
        &self,
        _job_role: &str,
        _resume_content: &str,
        previously_asked: &[String],
        _count: usize,
    ) -> Result<Vec<String>, GenerationError> {
        self.previously_asked
            .lock()
            .expect("generator lock")
            .push(previously_asked.to_vec());
        self.response.clone()
    }
}

pub(super) struct ScriptedRater {
    response: Result<ExternalEvaluation, EvaluationError>,
    calls: AtomicUsize,
}

impl ScriptedRater {
    pub(super) fn returning(evaluation: ExternalEvaluation) -> Self {
        Self {
            response: Ok(evaluation),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn failing() -> Self {
        Self {
            response: Err(EvaluationError::Unavailable("timeout".to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EvaluationRater for ScriptedRater {
    async fn rate(
        &self,
        _job_role: &str,
        _resume_content: &str,
        _transcript: &[QuestionAndAnswer],
    ) -> Result<ExternalEvaluation, EvaluationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub(super) fn external_evaluation(answers: usize) -> ExternalEvaluation {
    ExternalEvaluation {
        category_scores: ExternalCategoryScores {
            communication: 8.0,
            technical: 7.0,
            logic: 6.0,
        },
        summary: ReportSummary {
            strengths: vec!["Concrete project examples.".to_string()],
            weaknesses: vec!["Limited discussion of testing.".to_string()],
            suggestions: Vec::new(),
        },
        per_question: (0..answers)
            .map(|index| ExternalQuestionFeedback {
                feedback: format!("Provider feedback {index}"),
                score: Some(7.0),
                tone: Some(Tone::Confident),
            })
            .collect(),
    }
}

#[derive(Default)]
pub(super) struct RecordingSpeech {
    fail: bool,
    pub(super) spoken: Mutex<Vec<String>>,
}

impl RecordingSpeech {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            spoken: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if self.fail {
            return Err(SpeechError("no voices installed".to_string()));
        }
        self.spoken
            .lock()
            .expect("speech lock")
            .push(text.to_string());
        Ok(())
    }
}

struct FakeStream(Arc<AtomicUsize>);

impl CaptureStream for FakeStream {
    fn release(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(super) struct FakeCaptureDevice {
    deny: bool,
    acquired: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl FakeCaptureDevice {
    pub(super) fn denying() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }

    pub(super) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub(super) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for FakeCaptureDevice {
    async fn acquire(&self) -> Result<Box<dyn CaptureStream>, PermissionDenied> {
        if self.deny {
            return Err(PermissionDenied("microphone blocked".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream(Arc::clone(&self.released))))
    }
}

/// Transcript entry with explicit metrics.
pub(super) fn entry(
    question: &str,
    answer: &str,
    response_time: f32,
    hesitation_count: u32,
    clarity_score: f32,
    confidence: f32,
) -> QuestionAndAnswer {
    QuestionAndAnswer {
        question: question.to_string(),
        answer: answer.to_string(),
        response_time,
        hesitation_count,
        clarity_score,
        confidence,
        tone: Tone::Neutral,
        score: 0.0,
    }
}

/// Heuristic score of exactly 7.2: 0.5·10 + 0.3·4 + 0.2·5.
pub(super) fn solid_entry(question: &str) -> QuestionAndAnswer {
    entry(
        question,
        "I split the dashboard into lazy loaded routes and measured the bundle size before and after.",
        60.0,
        0,
        4.0,
        10.0,
    )
}

pub(super) fn seeded_engine() -> EvaluationEngine {
    EvaluationEngine::with_seed(EvaluationConfig::default(), SEED)
}

pub(super) struct Harness {
    pub(super) controller: SessionController<MemoryStore>,
    pub(super) store: Arc<MemoryStore>,
    pub(super) clock: Arc<ManualClock>,
    pub(super) generator: Arc<ScriptedGenerator>,
    pub(super) rater: Arc<ScriptedRater>,
    pub(super) speech: Arc<RecordingSpeech>,
    pub(super) capture: Arc<FakeCaptureDevice>,
}

pub(super) struct HarnessBuilder {
    config: SessionConfig,
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
    generator: ScriptedGenerator,
    rater: ScriptedRater,
    speech: RecordingSpeech,
    capture: FakeCaptureDevice,
}

impl HarnessBuilder {
    pub(super) fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(fixed_now())),
            generator: ScriptedGenerator::returning(questions(5)),
            rater: ScriptedRater::returning(external_evaluation(5)),
            speech: RecordingSpeech::default(),
            capture: FakeCaptureDevice::default(),
        }
    }

    pub(super) fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub(super) fn store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = store;
        self
    }

    pub(super) fn clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = clock;
        self
    }

    pub(super) fn generator(mut self, generator: ScriptedGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub(super) fn rater(mut self, rater: ScriptedRater) -> Self {
        self.rater = rater;
        self
    }

    pub(super) fn speech(mut self, speech: RecordingSpeech) -> Self {
        self.speech = speech;
        self
    }

    pub(super) fn capture(mut self, capture: FakeCaptureDevice) -> Self {
        self.capture = capture;
        self
    }

    pub(super) fn build(self) -> Harness {
        let generator = Arc::new(self.generator);
        let rater = Arc::new(self.rater);
        let speech = Arc::new(self.speech);
        let capture = Arc::new(self.capture);

        let collaborators = Collaborators {
            generator: generator.clone(),
            rater: rater.clone(),
            speech: speech.clone(),
            capture: capture.clone(),
            clock: self.clock.clone(),
        };
        let controller =
            SessionController::new(self.config, Arc::clone(&self.store), collaborators)
                .with_engine(seeded_engine());

        Harness {
            controller,
            store: self.store,
            clock: self.clock,
            generator,
            rater,
            speech,
            capture,
        }
    }
}

pub(super) const ROLE: &str = "Frontend Developer";
pub(super) const RESUME: &str = "5 years React";

/// Drive a session from the welcome screen into the interview phase.
pub(super) async fn start_interview(harness: &mut Harness) {
    harness.controller.begin().expect("begin");
    harness
        .controller
        .submit_setup(ROLE, RESUME)
        .expect("setup accepted");
    harness
        .controller
        .grant_permissions()
        .await
        .expect("permissions granted");
}

/// Answer each question in turn, spending `seconds` on each.
pub(super) fn answer_all(harness: &mut Harness, answers: &[&str], seconds: i64) {
    for answer in answers {
        harness.controller.start_answer().expect("answer window opens");
        harness
            .controller
            .push_transcript(answer)
            .expect("partial accepted");
        harness.clock.advance(Duration::seconds(seconds));
        harness.controller.stop_answer().expect("answer recorded");
    }
}

/// Full session ending in a report.
pub(super) async fn complete_session(harness: &mut Harness, answers: &[&str], warnings: u32) {
    start_interview(harness).await;
    for _ in 0..warnings {
        harness.controller.record_focus_loss();
    }
    answer_all(harness, answers, 45);
    harness.controller.finish_interview().expect("finish");
    harness.controller.evaluate().await.expect("evaluated");
}
