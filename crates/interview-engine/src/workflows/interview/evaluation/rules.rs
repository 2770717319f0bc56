use super::super::domain::{QuestionAndAnswer, ReportSummary};
use super::config::{EvaluationConfig, HeuristicWeights};
use super::round_to_tenth;

pub(crate) fn is_empty_answer(answer: &str, max_chars: usize) -> bool {
    answer.trim().chars().count() <= max_chars
}

pub(crate) fn all_answers_empty(transcript: &[QuestionAndAnswer], max_chars: usize) -> bool {
    transcript
        .iter()
        .all(|entry| is_empty_answer(&entry.answer, max_chars))
}

fn response_time_component(response_time: f32, weights: &HeuristicWeights) -> f32 {
    if weights.response_time_cap_secs <= 0.0 {
        return 0.0;
    }
    let capped = response_time.clamp(0.0, weights.response_time_cap_secs);
    capped / weights.response_time_cap_secs * 10.0
}

/// Heuristic score for one answer, on a 0-10 scale. Empty answers score 0.
pub(crate) fn heuristic_score(entry: &QuestionAndAnswer, config: &EvaluationConfig) -> f32 {
    if is_empty_answer(&entry.answer, config.empty_answer_max_chars) {
        return 0.0;
    }

    let weights = &config.heuristic;
    let raw = weights.confidence * entry.confidence
        + weights.clarity * entry.clarity_score
        + weights.response_time * response_time_component(entry.response_time, weights)
        - weights.hesitation_penalty * entry.hesitation_count as f32;

    if raw.is_finite() {
        raw.clamp(0.0, 10.0)
    } else {
        0.0
    }
}

pub(crate) fn local_feedback(entry: &QuestionAndAnswer, score: f32, max_chars: usize) -> String {
    if is_empty_answer(&entry.answer, max_chars) {
        return "No answer was captured for this question.".to_string();
    }

    let mut notes = Vec::new();
    if entry.word_count() < 20 {
        notes.push("the answer was brief; add a concrete example");
    } else if entry.clarity_score >= 8.0 {
        notes.push("the answer was detailed");
    }
    if entry.hesitation_count >= 4 {
        notes.push("frequent filler words weakened delivery");
    } else if entry.hesitation_count == 0 {
        notes.push("delivery was free of filler words");
    }
    if entry.response_time < 15.0 {
        notes.push("the response was very short in duration");
    }

    if notes.is_empty() {
        format!("Scored {:.1}/10.", round_to_tenth(score))
    } else {
        format!(
            "Scored {:.1}/10: {}.",
            round_to_tenth(score),
            notes.join("; ")
        )
    }
}

/// Narrative built from local metrics alone.
pub(crate) fn local_summary(
    transcript: &[QuestionAndAnswer],
    config: &EvaluationConfig,
) -> ReportSummary {
    let answered: Vec<&QuestionAndAnswer> = transcript
        .iter()
        .filter(|entry| !is_empty_answer(&entry.answer, config.empty_answer_max_chars))
        .collect();
    let mut summary = ReportSummary::default();

    if answered.is_empty() {
        return no_response_summary();
    }

    let count = answered.len() as f32;
    let mean_confidence = answered.iter().map(|e| e.confidence).sum::<f32>() / count;
    let mean_clarity = answered.iter().map(|e| e.clarity_score).sum::<f32>() / count;
    let hesitations: u32 = answered.iter().map(|e| e.hesitation_count).sum();
    let skipped = transcript.len() - answered.len();

    if mean_confidence >= 8.0 {
        summary
            .strengths
            .push("Steady delivery with few filler words.".to_string());
    } else {
        summary.weaknesses.push(format!(
            "{hesitations} filler words or hesitations across {} answers.",
            answered.len()
        ));
        summary
            .suggestions
            .push("Pause briefly instead of using filler words.".to_string());
    }

    if mean_clarity >= 5.0 {
        summary
            .strengths
            .push("Answers were developed in detail.".to_string());
    } else {
        summary
            .weaknesses
            .push("Answers were short and lacked supporting detail.".to_string());
        summary
            .suggestions
            .push("Structure answers as situation, action, and result.".to_string());
    }

    if skipped > 0 {
        summary
            .weaknesses
            .push(format!("{skipped} question(s) were left unanswered."));
        summary
            .suggestions
            .push("Attempt every question, even with a partial answer.".to_string());
    }

    if summary.strengths.is_empty() {
        summary.strengths.push(format!(
            "Answered {} of {} questions.",
            answered.len(),
            transcript.len()
        ));
    }

    summary
}

pub(crate) fn no_response_summary() -> ReportSummary {
    ReportSummary {
        strengths: Vec::new(),
        weaknesses: vec![
            "No measurable performance: no answers were captured during this session.".to_string(),
        ],
        suggestions: vec![
            "Check that your microphone is working and answer each question aloud.".to_string(),
        ],
    }
}
