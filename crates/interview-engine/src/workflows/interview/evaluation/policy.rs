use super::super::collaborators::{EvaluationError, ExternalCategoryScores, ExternalEvaluation};
use super::super::domain::CategoryScores;
use super::config::{BlendWeights, EvaluationConfig};
use super::round_to_tenth;

fn in_scale(value: f32) -> bool {
    value.is_finite() && (0.0..=10.0).contains(&value)
}

/// Reject provider output that cannot be blended as-is.
pub(crate) fn validate_external(external: &ExternalEvaluation) -> Result<(), EvaluationError> {
    let scores = &external.category_scores;
    for (name, value) in [
        ("communication", scores.communication),
        ("technical", scores.technical),
        ("logic", scores.logic),
    ] {
        if !in_scale(value) {
            return Err(EvaluationError::Unparsable(format!(
                "{name} rating {value} outside 0-10"
            )));
        }
    }
    Ok(())
}

pub(crate) fn valid_question_score(score: Option<f32>) -> Option<f32> {
    score.filter(|value| in_scale(*value))
}

fn blend_one(
    avg_heuristic: f32,
    external: Option<f32>,
    weights: BlendWeights,
    jitter: f32,
) -> f32 {
    let weights = if external.is_some() {
        weights
    } else {
        BlendWeights::HEURISTIC_ONLY
    };
    let raw = weights.heuristic * avg_heuristic + weights.external * external.unwrap_or(0.0);
    round_to_tenth((raw + jitter).clamp(0.0, 10.0))
}

/// Blend the mean heuristic with provider ratings into rounded category scores.
///
/// `jitter` is called once per category with the configured bound. It is never consulted when
/// the heuristic mean is zero.
pub(crate) fn blend_categories(
    avg_heuristic: f32,
    external: Option<&ExternalCategoryScores>,
    config: &EvaluationConfig,
    mut jitter: impl FnMut(f32) -> f32,
) -> CategoryScores {
    let mut draw = |bound: f32| {
        if avg_heuristic <= 0.0 || !bound.is_finite() || bound <= 0.0 {
            0.0
        } else {
            jitter(bound).clamp(-bound, bound)
        }
    };

    let communication = blend_one(
        avg_heuristic,
        external.map(|scores| scores.communication),
        config.communication,
        draw(config.jitter_bound),
    );
    let technical = blend_one(
        avg_heuristic,
        external.map(|scores| scores.technical),
        config.technical,
        draw(config.jitter_bound),
    );
    let logic = blend_one(
        avg_heuristic,
        external.map(|scores| scores.logic),
        config.logic,
        draw(config.jitter_bound),
    );

    CategoryScores {
        communication,
        technical,
        logic,
        overall: round_to_tenth((communication + technical + logic) / 3.0),
    }
}

pub(crate) fn blend_question(
    heuristic: f32,
    external: Option<f32>,
    config: &EvaluationConfig,
) -> f32 {
    let weights = if external.is_some() {
        config.per_question
    } else {
        BlendWeights::HEURISTIC_ONLY
    };
    let raw = weights.heuristic * heuristic + weights.external * external.unwrap_or(0.0);
    round_to_tenth(raw.clamp(0.0, 10.0))
}
