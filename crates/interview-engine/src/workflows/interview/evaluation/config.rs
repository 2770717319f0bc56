use serde::{Deserialize, Serialize};

/// Weights for the per-question heuristic score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeuristicWeights {
    pub confidence: f32,
    pub clarity: f32,
    pub response_time: f32,
    /// Subtracted once per counted filler.
    pub hesitation_penalty: f32,
    /// Response times beyond this window earn no extra credit.
    pub response_time_cap_secs: f32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            clarity: 0.3,
            response_time: 0.2,
            hesitation_penalty: 0.4,
            response_time_cap_secs: 120.0,
        }
    }
}

/// Share of a score taken from local heuristics versus the rating provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub heuristic: f32,
    pub external: f32,
}

impl BlendWeights {
    pub const HEURISTIC_ONLY: BlendWeights = BlendWeights {
        heuristic: 1.0,
        external: 0.0,
    };

    pub const fn new(heuristic: f32, external: f32) -> Self {
        Self {
            heuristic,
            external,
        }
    }
}

/// The canonical scoring table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub heuristic: HeuristicWeights,
    pub communication: BlendWeights,
    pub technical: BlendWeights,
    pub logic: BlendWeights,
    /// Blend applied when the provider also rated an individual answer.
    pub per_question: BlendWeights,
    /// Symmetric bound of the per-category jitter.
    pub jitter_bound: f32,
    /// Answers at or below this many trimmed characters count as empty.
    pub empty_answer_max_chars: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            heuristic: HeuristicWeights::default(),
            communication: BlendWeights::new(0.7, 0.3),
            technical: BlendWeights::new(0.6, 0.4),
            logic: BlendWeights::new(0.65, 0.35),
            per_question: BlendWeights::new(0.65, 0.35),
            jitter_bound: 0.5,
            empty_answer_max_chars: 2,
        }
    }
}
