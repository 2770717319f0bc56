use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use super::analysis::{AnswerAnalyzer, AnswerCapture};
use super::attempts::{AttemptPolicy, DailyLimit, DEFAULT_MAX_WARNINGS};
use super::collaborators::{
    CaptureDevice, CaptureHandle, Clock, EvaluationRater, PermissionDenied, QuestionGenerator,
    SpeechSynthesizer,
};
use super::domain::{DailyAttempts, InterviewReport, QuestionAndAnswer, ReportId};
use super::evaluation::{EvaluationEngine, EvaluationOutcome};
use super::history::QuestionHistoryStore;
use super::questions::TemplateQuestionBank;
use super::state::{Action, IllegalTransition, InterviewState, Phase};
use super::storage::{
    load_json, save_json, KeyValueStore, DAILY_ATTEMPTS_KEY, REPORT_HISTORY_KEY,
};

pub const DEFAULT_MAX_QUESTIONS: usize = 5;

/// Session-level dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_questions: usize,
    pub max_warnings: u32,
    pub daily_limit: DailyLimit,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_questions: DEFAULT_MAX_QUESTIONS,
            max_warnings: DEFAULT_MAX_WARNINGS,
            daily_limit: DailyLimit::Unlimited,
        }
    }
}

/// External services the controller drives.
#[derive(Clone)]
pub struct Collaborators {
    pub generator: Arc<dyn QuestionGenerator>,
    pub rater: Arc<dyn EvaluationRater>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub capture: Arc<dyn CaptureDevice>,
    pub clock: Arc<dyn Clock>,
}

/// Setup form input that cannot start a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupValidationError {
    #[error("enter the job role you are interviewing for")]
    MissingJobRole,
    #[error("upload or paste a resume before continuing")]
    MissingResume,
}

/// Invariant violation that ends the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FatalStateError {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPurpose {
    Questions,
    Evaluation,
}

/// Proof of which request a resolution belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    purpose: RequestPurpose,
    generation: u64,
}

impl RequestTicket {
    pub fn purpose(&self) -> RequestPurpose {
        self.purpose
    }
}

#[derive(Debug, Default)]
struct RequestTracker {
    questions: u64,
    evaluation: u64,
}

impl RequestTracker {
    fn slot(&mut self, purpose: RequestPurpose) -> &mut u64 {
        match purpose {
            RequestPurpose::Questions => &mut self.questions,
            RequestPurpose::Evaluation => &mut self.evaluation,
        }
    }

    fn issue(&mut self, purpose: RequestPurpose) -> RequestTicket {
        let slot = self.slot(purpose);
        *slot += 1;
        RequestTicket {
            purpose,
            generation: *slot,
        }
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        let current = match ticket.purpose {
            RequestPurpose::Questions => self.questions,
            RequestPurpose::Evaluation => self.evaluation,
        };
        current == ticket.generation
    }

    fn supersede_all(&mut self) {
        self.questions += 1;
        self.evaluation += 1;
    }
}

/// Error raised by the session controller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    SetupValidation(#[from] SetupValidationError),
    #[error(transparent)]
    PermissionDenied(#[from] PermissionDenied),
    #[error(transparent)]
    Transition(#[from] IllegalTransition),
    #[error(transparent)]
    Fatal(#[from] FatalStateError),
    #[error("a newer {0:?} request superseded this result")]
    StaleResolution(RequestPurpose),
    #[error("no answer is being recorded")]
    NoOpenAnswer,
    #[error("an answer is already being recorded")]
    AnswerInProgress,
    #[error("{notice}")]
    DailyLimitReached { notice: String },
}

/// Outcome of leaving the welcome screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    Setup,
    LimitReached { notice: String },
}

/// Orchestrates one candidate session at a time over injected storage and collaborators.
pub struct SessionController<S: ?Sized> {
    config: SessionConfig,
    state: InterviewState,
    store: Arc<S>,
    question_history: QuestionHistoryStore<S>,
    templates: TemplateQuestionBank,
    analyzer: AnswerAnalyzer,
    engine: EvaluationEngine,
    policy: AttemptPolicy,
    collaborators: Collaborators,
    requests: RequestTracker,
    capture: Option<CaptureHandle>,
    answer: Option<AnswerCapture>,
    last_error: Option<String>,
}

impl<S> SessionController<S>
where
    S: KeyValueStore + ?Sized,
{
    pub fn new(config: SessionConfig, store: Arc<S>, collaborators: Collaborators) -> Self {
        let policy = AttemptPolicy::new(config.daily_limit, config.max_warnings);
        let today = collaborators.clock.now().date_naive();

        let history: Vec<InterviewReport> =
            load_json(store.as_ref(), REPORT_HISTORY_KEY).unwrap_or_default();
        let attempts = load_json::<DailyAttempts, S>(store.as_ref(), DAILY_ATTEMPTS_KEY)
            .map(|stored| policy.refresh(stored, today))
            .unwrap_or_else(|| DailyAttempts::fresh(today));

        debug!(
            reports = history.len(),
            attempts = attempts.count,
            "session controller ready"
        );

        Self {
            config,
            state: InterviewState::new(history, attempts),
            question_history: QuestionHistoryStore::new(Arc::clone(&store)),
            store,
            templates: TemplateQuestionBank,
            analyzer: AnswerAnalyzer::default(),
            engine: EvaluationEngine::default(),
            policy,
            collaborators,
            requests: RequestTracker::default(),
            capture: None,
            answer: None,
            last_error: None,
        }
    }

    pub fn with_engine(mut self, engine: EvaluationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_analyzer(mut self, analyzer: AnswerAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn policy(&self) -> &AttemptPolicy {
        &self.policy
    }

    pub fn question_history(&self) -> &QuestionHistoryStore<S> {
        &self.question_history
    }

    /// Message from the most recent aborted session, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_live_capture(&self) -> bool {
        self.capture.as_ref().is_some_and(CaptureHandle::is_live)
    }

    pub fn is_recording_answer(&self) -> bool {
        self.answer.is_some()
    }

    fn today(&self) -> NaiveDate {
        self.collaborators.clock.now().date_naive()
    }

    fn apply(&mut self, action: Action) -> Result<(), IllegalTransition> {
        let name = action.name();
        let next = self.state.reduce(action)?;
        if next.phase != self.state.phase {
            debug!(
                action = name,
                from = self.state.phase.label(),
                to = next.phase.label(),
                "phase transition"
            );
        }
        self.state = next;
        Ok(())
    }

    fn require_phase(&self, phase: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.state.phase == phase {
            Ok(())
        } else {
            Err(IllegalTransition::WrongPhase {
                phase: self.state.phase,
                action,
            }
            .into())
        }
    }

    /// Apply day rollover to the attempt counter, persisting it when it changed.
    pub fn refresh_attempts(&mut self) -> DailyAttempts {
        let refreshed = self.policy.refresh(self.state.daily_attempts, self.today());
        if refreshed != self.state.daily_attempts {
            info!(date = %refreshed.date, "daily attempt counter rolled over");
            let _ = self.apply(Action::SyncAttempts {
                daily_attempts: refreshed,
            });
            self.persist_attempts();
        }
        refreshed
    }

    /// Welcome → Setup, or Welcome → History once the daily ceiling is reached.
    pub fn begin(&mut self) -> Result<BeginOutcome, SessionError> {
        self.require_phase(Phase::Welcome, "begin")?;
        let attempts = self.refresh_attempts();

        if self.policy.can_start(attempts, self.today()) {
            self.apply(Action::Begin)?;
            Ok(BeginOutcome::Setup)
        } else {
            let notice = self.policy.limit_notice();
            info!(
                attempts = attempts.count,
                limit = %self.policy.daily_limit(),
                "daily limit reached; redirecting to history"
            );
            self.apply(Action::ShowHistory)?;
            Ok(BeginOutcome::LimitReached { notice })
        }
    }

    /// Setup → Permissions.
    pub fn submit_setup(
        &mut self,
        job_role: &str,
        resume_content: &str,
    ) -> Result<(), SessionError> {
        self.require_phase(Phase::Setup, "set_setup")?;
        let job_role = job_role.trim();
        if job_role.is_empty() {
            return Err(SetupValidationError::MissingJobRole.into());
        }
        if resume_content.trim().is_empty() {
            return Err(SetupValidationError::MissingResume.into());
        }

        self.apply(Action::SetSetup {
            job_role: job_role.to_string(),
            resume_content: resume_content.to_string(),
        })?;
        self.last_error = None;
        Ok(())
    }

    /// Permissions → Interview: acquire the capture stream, then fetch and record questions.
    /// A refused stream leaves the session on the permissions screen.
    pub async fn grant_permissions(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Permissions, "set_permissions")?;

        let stream = match self.collaborators.capture.acquire().await {
            Ok(stream) => stream,
            Err(denied) => {
                warn!(error = %denied, "capture stream unavailable");
                return Err(denied.into());
            }
        };
        if let Some(mut previous) = self.capture.replace(CaptureHandle::new(stream)) {
            previous.release();
        }
        self.apply(Action::SetPermissions)?;

        let ticket = self.issue_question_request();
        let questions = self.generate_questions().await;
        self.apply_questions(ticket, questions)
    }

    /// Start a question request; any earlier outstanding request becomes stale.
    pub fn issue_question_request(&mut self) -> RequestTicket {
        self.requests.issue(RequestPurpose::Questions)
    }

    /// Exactly `max_questions` questions for the current role and resume. Provider failures and
    /// short or unusable output fall back to the local template bank.
    pub async fn generate_questions(&self) -> Vec<String> {
        let count = self.config.max_questions;
        let job_role = &self.state.job_role;
        let resume = &self.state.resume_content;
        let previously_asked = self.question_history.previously_asked(job_role, resume);

        match self
            .collaborators
            .generator
            .generate_questions(job_role, resume, &previously_asked, count)
            .await
        {
            Ok(generated) => {
                let mut seen = HashSet::new();
                let usable: Vec<String> = generated
                    .into_iter()
                    .map(|question| question.trim().to_string())
                    .filter(|question| !question.is_empty())
                    .filter(|question| seen.insert(question.clone()))
                    .take(count)
                    .collect();
                if usable.len() == count {
                    return usable;
                }
                warn!(
                    expected = count,
                    received = usable.len(),
                    "question provider returned too few usable questions; using templates"
                );
            }
            Err(err) => {
                warn!(error = %err, "question provider failed; using templates");
            }
        }

        self.templates
            .questions(job_role, resume, &previously_asked, count)
    }

    /// Record resolved questions and enter the interview, unless the ticket was superseded.
    pub fn apply_questions(
        &mut self,
        ticket: RequestTicket,
        questions: Vec<String>,
    ) -> Result<(), SessionError> {
        if ticket.purpose != RequestPurpose::Questions || !self.requests.is_current(ticket) {
            debug!("discarding superseded question resolution");
            return Err(SessionError::StaleResolution(RequestPurpose::Questions));
        }
        self.require_phase(Phase::Permissions, "start_interview")?;

        if let Err(err) = self.question_history.record(
            &self.state.job_role,
            &self.state.resume_content,
            &questions,
            self.collaborators.clock.now(),
        ) {
            error!(error = %err, "failed to persist question history");
        }

        let count = questions.len();
        self.apply(Action::StartInterview { questions })?;
        info!(
            job_role = %self.state.job_role,
            questions = count,
            "interview started"
        );
        Ok(())
    }

    /// Speak the current question. Speech failures are returned as a notice, never as an error.
    pub async fn present_question(&self) -> Option<String> {
        let question = self.state.current_question()?;
        match self.collaborators.speech.speak(question).await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "question playback failed");
                Some("Audio playback failed; the question is shown on screen instead.".to_string())
            }
        }
    }

    /// Open the listening window for the current question.
    pub fn start_answer(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Interview, "start_answer")?;
        if self.answer.is_some() {
            return Err(SessionError::AnswerInProgress);
        }
        let question = self
            .state
            .current_question()
            .ok_or(IllegalTransition::QuestionsExhausted)?
            .to_string();
        self.answer = Some(AnswerCapture::start(
            question,
            self.collaborators.clock.now(),
        ));
        Ok(())
    }

    /// Feed a partial transcript. Returns the live hesitation count.
    pub fn push_transcript(&mut self, partial: &str) -> Result<u32, SessionError> {
        let answer = self.answer.as_mut().ok_or(SessionError::NoOpenAnswer)?;
        Ok(answer.push_partial(self.analyzer.lexicon(), partial))
    }

    /// Close the listening window and append the analyzed answer.
    pub fn stop_answer(&mut self) -> Result<QuestionAndAnswer, SessionError> {
        let answer = self.answer.take().ok_or(SessionError::NoOpenAnswer)?;
        let captured = answer.stop(self.collaborators.clock.now());
        let entry = self.analyzer.analyze(captured);
        self.apply(Action::NextQuestion {
            entry: entry.clone(),
        })?;
        debug!(
            index = self.state.current_question_index,
            hesitations = entry.hesitation_count,
            response_time = entry.response_time,
            "answer recorded"
        );
        Ok(entry)
    }

    /// Visibility or focus loss reported by the UI. Only counted during the interview.
    pub fn record_focus_loss(&mut self) -> Option<String> {
        if self.state.phase != Phase::Interview {
            return None;
        }
        let outcome = self.policy.register_warning(self.state.warnings);
        if self.apply(Action::AddWarning).is_err() {
            return None;
        }
        warn!(
            warnings = outcome.warnings,
            max_warnings = self.policy.max_warnings(),
            "focus lost during interview"
        );
        outcome.notice
    }

    fn close_answer_window(&mut self) {
        if let Some(answer) = self.answer.take() {
            let captured = answer.stop(self.collaborators.clock.now());
            let entry = self.analyzer.analyze(captured);
            if let Err(err) = self.apply(Action::NextQuestion { entry }) {
                warn!(error = %err, "dropping partial answer on forced close");
            }
        }
    }

    fn release_capture(&mut self) {
        if let Some(mut handle) = self.capture.take() {
            handle.release();
            debug!("capture stream released");
        }
    }

    /// Interview → Evaluation. An open answer window is finalized first.
    pub fn finish_interview(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Interview, "finish_interview")?;
        self.close_answer_window();
        self.release_capture();
        self.apply(Action::FinishInterview)?;
        info!(
            answered = self.state.transcript.len(),
            asked = self.state.questions.len(),
            warnings = self.state.warnings,
            "interview finished"
        );
        Ok(())
    }

    pub fn issue_evaluation_request(&mut self) -> RequestTicket {
        self.requests.issue(RequestPurpose::Evaluation)
    }

    /// Score the transcript. Provider failures never surface here.
    pub async fn score_transcript(&self) -> EvaluationOutcome {
        self.engine
            .evaluate(
                self.collaborators.rater.as_ref(),
                &self.state.job_role,
                &self.state.resume_content,
                &self.state.transcript,
                self.collaborators.clock.now(),
            )
            .await
    }

    /// Evaluation → Report.
    pub async fn evaluate(&mut self) -> Result<&InterviewReport, SessionError> {
        self.require_phase(Phase::Evaluation, "set_evaluation")?;
        let ticket = self.issue_evaluation_request();
        let outcome = self.score_transcript().await;
        self.apply_evaluation(ticket, outcome)?;
        self.state.report.as_ref().ok_or_else(|| {
            FatalStateError {
                message: "The report could not be displayed.".to_string(),
            }
            .into()
        })
    }

    /// Accept an evaluation for the current ticket, flag fraud, count the attempt, and persist.
    pub fn apply_evaluation(
        &mut self,
        ticket: RequestTicket,
        outcome: EvaluationOutcome,
    ) -> Result<(), SessionError> {
        if ticket.purpose != RequestPurpose::Evaluation || !self.requests.is_current(ticket) {
            debug!("discarding superseded evaluation resolution");
            return Err(SessionError::StaleResolution(RequestPurpose::Evaluation));
        }
        self.require_phase(Phase::Evaluation, "set_evaluation")?;

        let EvaluationOutcome {
            mut report,
            transcript,
        } = outcome;
        report.fraud_status = self.policy.fraud_status(self.state.warnings);
        let daily_attempts = self
            .policy
            .record_attempt(self.state.daily_attempts, self.today());

        match self.apply(Action::SetEvaluation {
            report,
            transcript,
            daily_attempts,
        }) {
            Ok(()) => {}
            Err(err @ IllegalTransition::TranscriptMismatch { .. }) => {
                error!(error = %err, "evaluation does not match transcript");
                return Err(self.abort(
                    "The interview results were inconsistent and could not be scored. Please start again.",
                ));
            }
            Err(err) => return Err(err.into()),
        }

        self.persist_history();
        self.persist_attempts();

        if let Some(report) = &self.state.report {
            info!(
                report_id = %report.id,
                overall = report.scores.overall,
                fraud = report.fraud_status,
                mode = report.scoring_mode.label(),
                "interview evaluated"
            );
        }
        Ok(())
    }

    /// Abandon the running session and return to setup with the role and resume intact.
    pub fn abort(&mut self, message: &str) -> SessionError {
        self.answer = None;
        self.release_capture();
        self.requests.supersede_all();
        if let Err(err) = self.apply(Action::Abort) {
            warn!(error = %err, "abort outside of a running session");
        }
        self.last_error = Some(message.to_string());
        error!(message, "session aborted");
        FatalStateError {
            message: message.to_string(),
        }
        .into()
    }

    pub fn show_history(&mut self) -> Result<&[InterviewReport], SessionError> {
        self.apply(Action::ShowHistory)?;
        Ok(&self.state.history)
    }

    pub fn view_report(&mut self, id: &ReportId) -> Result<&InterviewReport, SessionError> {
        self.apply(Action::ViewReport { id: id.clone() })?;
        self.state
            .report
            .as_ref()
            .ok_or_else(|| IllegalTransition::UnknownReport(id.clone()).into())
    }

    /// Report/History → Setup. Once the daily ceiling is reached the session stays on History.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state.phase {
            Phase::Report | Phase::History => {}
            phase => {
                return Err(IllegalTransition::WrongPhase {
                    phase,
                    action: "reset",
                }
                .into())
            }
        }
        self.answer = None;
        self.release_capture();
        self.requests.supersede_all();
        if let Err(err) = self.ensure_within_daily_limit() {
            if self.state.phase == Phase::Report {
                self.apply(Action::ShowHistory)?;
            }
            return Err(err);
        }
        self.apply(Action::Reset)?;
        Ok(())
    }

    /// Refresh the attempt counter and refuse a new session once today's ceiling is reached.
    fn ensure_within_daily_limit(&mut self) -> Result<(), SessionError> {
        let attempts = self.refresh_attempts();
        if self.policy.can_start(attempts, self.today()) {
            return Ok(());
        }
        info!(
            attempts = attempts.count,
            limit = %self.policy.daily_limit(),
            "daily limit reached; new session refused"
        );
        Err(SessionError::DailyLimitReached {
            notice: self.policy.limit_notice(),
        })
    }

    fn persist_history(&self) {
        if let Err(err) = save_json(self.store.as_ref(), REPORT_HISTORY_KEY, &self.state.history)
        {
            error!(error = %err, "failed to persist interview history");
        }
    }

    fn persist_attempts(&self) {
        if let Err(err) = save_json(
            self.store.as_ref(),
            DAILY_ATTEMPTS_KEY,
            &self.state.daily_attempts,
        ) {
            error!(error = %err, "failed to persist daily attempts");
        }
    }
}
