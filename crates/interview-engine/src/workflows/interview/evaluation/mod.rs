mod config;
mod policy;
mod rules;

pub use config::{BlendWeights, EvaluationConfig, HeuristicWeights};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::collaborators::{EvaluationError, EvaluationRater, ExternalEvaluation};
use super::domain::{
    CategoryScores, InterviewReport, QuestionAndAnswer, QuestionFeedback, ReportId, ScoringMode,
};
use policy::{blend_categories, blend_question, valid_question_score, validate_external};

static REPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_report_id(now: DateTime<Utc>) -> ReportId {
    let sequence = REPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReportId(format!("rpt-{}-{sequence:04}", now.timestamp_millis()))
}

pub(crate) fn round_to_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Report plus the transcript with per-answer scores and tones filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub report: InterviewReport,
    pub transcript: Vec<QuestionAndAnswer>,
}

/// Blends heuristic answer metrics with provider ratings into a report.
pub struct EvaluationEngine {
    config: EvaluationConfig,
    rng: Mutex<StdRng>,
}

impl EvaluationEngine {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic jitter for reproducible scoring.
    pub fn with_seed(config: EvaluationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Rate the transcript with the provider and score it. Provider failures degrade to
    /// heuristic-only scoring; this never fails.
    pub async fn evaluate<R>(
        &self,
        rater: &R,
        job_role: &str,
        resume_content: &str,
        transcript: &[QuestionAndAnswer],
        now: DateTime<Utc>,
    ) -> EvaluationOutcome
    where
        R: EvaluationRater + ?Sized,
    {
        if rules::all_answers_empty(transcript, self.config.empty_answer_max_chars) {
            info!(
                job_role,
                questions = transcript.len(),
                "no measurable answers; skipping rating provider"
            );
            return self.score(job_role, transcript, None, now);
        }

        let external = rater.rate(job_role, resume_content, transcript).await;
        self.score(job_role, transcript, Some(external), now)
    }

    /// Score a transcript against an already-resolved provider result.
    ///
    /// `None` means the provider was not consulted.
    pub fn score(
        &self,
        job_role: &str,
        transcript: &[QuestionAndAnswer],
        external: Option<Result<ExternalEvaluation, EvaluationError>>,
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let max_chars = self.config.empty_answer_max_chars;

        if rules::all_answers_empty(transcript, max_chars) {
            return self.no_response(job_role, transcript, now);
        }

        let external = match external {
            Some(Ok(evaluation)) => match validate_external(&evaluation) {
                Ok(()) => Some(evaluation),
                Err(err) => {
                    warn!(error = %err, "discarding rating provider output");
                    None
                }
            },
            Some(Err(err)) => {
                warn!(error = %err, "rating provider failed; using heuristic-only scoring");
                None
            }
            None => None,
        };

        let heuristics: Vec<f32> = transcript
            .iter()
            .map(|entry| rules::heuristic_score(entry, &self.config))
            .collect();
        let avg_heuristic = if heuristics.is_empty() {
            0.0
        } else {
            heuristics.iter().sum::<f32>() / heuristics.len() as f32
        };

        let scores = blend_categories(
            avg_heuristic,
            external.as_ref().map(|evaluation| &evaluation.category_scores),
            &self.config,
            |bound| self.jitter(bound),
        );

        let mut scored = Vec::with_capacity(transcript.len());
        let mut details = Vec::with_capacity(transcript.len());
        for (index, (entry, heuristic)) in transcript.iter().zip(heuristics).enumerate() {
            let provided = external
                .as_ref()
                .and_then(|evaluation| evaluation.per_question.get(index));
            let empty = rules::is_empty_answer(&entry.answer, max_chars);

            let score = if empty {
                0.0
            } else {
                blend_question(
                    heuristic,
                    provided.and_then(|feedback| valid_question_score(feedback.score)),
                    &self.config,
                )
            };
            let tone = provided
                .and_then(|feedback| feedback.tone)
                .unwrap_or(entry.tone);
            let feedback = provided
                .map(|feedback| feedback.feedback.trim())
                .filter(|text| !text.is_empty() && !empty)
                .map(str::to_string)
                .unwrap_or_else(|| rules::local_feedback(entry, score, max_chars));

            details.push(QuestionFeedback {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                feedback,
                score,
                tone,
            });
            scored.push(QuestionAndAnswer {
                score,
                tone,
                ..entry.clone()
            });
        }

        let (summary, scoring_mode) = match external {
            Some(evaluation) => {
                let mut summary = evaluation.summary;
                let local = rules::local_summary(transcript, &self.config);
                if summary.strengths.is_empty() {
                    summary.strengths = local.strengths;
                }
                if summary.weaknesses.is_empty() {
                    summary.weaknesses = local.weaknesses;
                }
                if summary.suggestions.is_empty() {
                    summary.suggestions = local.suggestions;
                }
                (summary, ScoringMode::Blended)
            }
            None => (
                rules::local_summary(transcript, &self.config),
                ScoringMode::HeuristicOnly,
            ),
        };

        let report = InterviewReport {
            id: next_report_id(now),
            date: now,
            job_role: job_role.to_string(),
            scores,
            summary,
            details,
            fraud_status: false,
            scoring_mode,
        };

        debug!(
            report_id = %report.id,
            avg_heuristic,
            overall = report.scores.overall,
            mode = scoring_mode.label(),
            "scored transcript"
        );

        EvaluationOutcome {
            report,
            transcript: scored,
        }
    }

    fn no_response(
        &self,
        job_role: &str,
        transcript: &[QuestionAndAnswer],
        now: DateTime<Utc>,
    ) -> EvaluationOutcome {
        let details = transcript
            .iter()
            .map(|entry| QuestionFeedback {
                question: entry.question.clone(),
                answer: entry.answer.clone(),
                feedback: rules::local_feedback(entry, 0.0, self.config.empty_answer_max_chars),
                score: 0.0,
                tone: entry.tone,
            })
            .collect();
        let scored = transcript
            .iter()
            .map(|entry| QuestionAndAnswer {
                score: 0.0,
                ..entry.clone()
            })
            .collect();

        EvaluationOutcome {
            report: InterviewReport {
                id: next_report_id(now),
                date: now,
                job_role: job_role.to_string(),
                scores: CategoryScores::default(),
                summary: rules::no_response_summary(),
                details,
                fraud_status: false,
                scoring_mode: ScoringMode::NoResponse,
            },
            transcript: scored,
        }
    }

    fn jitter(&self, bound: f32) -> f32 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(-bound..=bound),
            Err(_) => 0.0,
        }
    }
}

impl Default for EvaluationEngine {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}
