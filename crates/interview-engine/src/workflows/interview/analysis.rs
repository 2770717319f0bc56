//! Per-answer heuristics: response timing, filler-word hesitation, clarity and confidence.
//!
//! These are deliberately crude approximations computed from locally observable signals. Quality
//! judgments are left to the evaluation engine and the external rating provider.

use chrono::{DateTime, Utc};

use super::domain::{QuestionAndAnswer, Tone};

const DEFAULT_FILLER_WORDS: &[&str] = &["um", "uh", "er", "hmm", "like", "maybe", "basically"];
const DEFAULT_FILLER_PHRASES: &[(&str, &str)] = &[
    ("i", "think"),
    ("you", "know"),
    ("sort", "of"),
    ("kind", "of"),
];

/// Filler lexicon matched against lower-cased, whitespace-separated tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillerLexicon {
    words: Vec<String>,
    phrases: Vec<(String, String)>,
}

impl Default for FillerLexicon {
    fn default() -> Self {
        Self {
            words: DEFAULT_FILLER_WORDS.iter().map(|w| w.to_string()).collect(),
            phrases: DEFAULT_FILLER_PHRASES
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }
}

impl FillerLexicon {
    pub fn new(words: Vec<String>, phrases: Vec<(String, String)>) -> Self {
        Self {
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
            phrases: phrases
                .into_iter()
                .map(|(a, b)| (a.to_lowercase(), b.to_lowercase()))
                .collect(),
        }
    }

    /// Number of filler matches beginning at `position`. A match may span into the next token.
    fn matches_at(&self, tokens: &[String], position: usize) -> u32 {
        let Some(token) = tokens.get(position) else {
            return 0;
        };
        let mut count = 0;
        if self.words.iter().any(|word| word == token) {
            count += 1;
        }
        if let Some(next) = tokens.get(position + 1) {
            if self
                .phrases
                .iter()
                .any(|(first, second)| first == token && second == next)
            {
                count += 1;
            }
        }
        count
    }

    pub fn count(&self, text: &str) -> u32 {
        let tokens = tokenize(text);
        (0..tokens.len())
            .map(|position| self.matches_at(&tokens, position))
            .sum()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Running hesitation count over a stream of partial transcripts.
///
/// Each partial usually extends the previous one. Only the tokens past the shared prefix are
/// rescanned; the last shared token is rescanned too since a phrase may begin there.
#[derive(Debug, Clone, Default)]
pub struct HesitationTracker {
    tokens: Vec<String>,
    /// `cumulative[i]` = matches beginning at positions `< i`.
    cumulative: Vec<u32>,
}

impl HesitationTracker {
    pub fn observe(&mut self, lexicon: &FillerLexicon, partial: &str) -> u32 {
        let tokens = tokenize(partial);
        let shared = self
            .tokens
            .iter()
            .zip(tokens.iter())
            .take_while(|(previous, current)| previous == current)
            .count();
        let stable = shared.saturating_sub(1);

        self.cumulative.truncate(stable + 1);
        if self.cumulative.is_empty() {
            self.cumulative.push(0);
        }
        let mut running = self.cumulative[stable];
        for position in stable..tokens.len() {
            running += lexicon.matches_at(&tokens, position);
            self.cumulative.push(running);
        }

        self.tokens = tokens;
        self.count()
    }

    pub fn count(&self) -> u32 {
        self.cumulative.last().copied().unwrap_or(0)
    }
}

/// Raw output of one closed listening window.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAnswer {
    pub question: String,
    pub transcript: String,
    pub response_time: f32,
    pub live_hesitations: u32,
}

/// A listening window bounded by explicit start and stop signals.
#[derive(Debug, Clone)]
pub struct AnswerCapture {
    question: String,
    started_at: DateTime<Utc>,
    latest: String,
    tracker: HesitationTracker,
}

impl AnswerCapture {
    pub fn start(question: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            question: question.into(),
            started_at,
            latest: String::new(),
            tracker: HesitationTracker::default(),
        }
    }

    /// Feed the speech provider's latest cumulative transcript. Returns the live hesitation count.
    pub fn push_partial(&mut self, lexicon: &FillerLexicon, partial: &str) -> u32 {
        self.latest = partial.to_string();
        self.tracker.observe(lexicon, partial)
    }

    pub fn stop(self, stopped_at: DateTime<Utc>) -> CapturedAnswer {
        let elapsed = stopped_at.signed_duration_since(self.started_at);
        let response_time = (elapsed.num_milliseconds().max(0) as f32) / 1000.0;
        let live_hesitations = self.tracker.count();
        CapturedAnswer {
            question: self.question,
            transcript: self.latest,
            response_time,
            live_hesitations,
        }
    }
}

/// Turns captured answers into transcript entries with heuristic metrics.
#[derive(Debug, Clone, Default)]
pub struct AnswerAnalyzer {
    lexicon: FillerLexicon,
}

impl AnswerAnalyzer {
    pub fn new(lexicon: FillerLexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &FillerLexicon {
        &self.lexicon
    }

    pub fn analyze(&self, captured: CapturedAnswer) -> QuestionAndAnswer {
        let answer = captured.transcript.trim().to_string();
        let hesitation_count = self.lexicon.count(&answer);
        let word_count = answer.split_whitespace().count();

        QuestionAndAnswer {
            question: captured.question,
            answer,
            response_time: captured.response_time.max(0.0),
            hesitation_count,
            clarity_score: clarity_score(word_count),
            confidence: confidence_score(hesitation_count),
            tone: Tone::Neutral,
            score: 0.0,
        }
    }
}

pub fn clarity_score(word_count: usize) -> f32 {
    (word_count as f32 / 10.0).min(10.0)
}

pub fn confidence_score(hesitation_count: u32) -> f32 {
    (10.0 - hesitation_count as f32 * 0.5).clamp(0.0, 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn counts_single_words_and_phrases() {
        let lexicon = FillerLexicon::default();
        assert_eq!(lexicon.count("Um, I think it was like, maybe React?"), 4);
        assert_eq!(lexicon.count("I shipped the checkout flow"), 0);
        assert_eq!(lexicon.count(""), 0);
    }

    #[test]
    fn tracker_matches_full_count_as_partials_grow() {
        let lexicon = FillerLexicon::default();
        let mut tracker = HesitationTracker::default();

        assert_eq!(tracker.observe(&lexicon, "um"), 1);
        assert_eq!(tracker.observe(&lexicon, "um i"), 1);
        assert_eq!(tracker.observe(&lexicon, "um i think"), 2);
        assert_eq!(tracker.observe(&lexicon, "um i think we used like"), 3);
        assert_eq!(
            tracker.count(),
            lexicon.count("um i think we used like"),
            "incremental count matches a full rescan"
        );
    }

    #[test]
    fn tracker_does_not_double_count_repeated_partials() {
        let lexicon = FillerLexicon::default();
        let mut tracker = HesitationTracker::default();

        tracker.observe(&lexicon, "uh so basically");
        tracker.observe(&lexicon, "uh so basically");
        assert_eq!(tracker.observe(&lexicon, "uh so basically"), 2);
    }

    #[test]
    fn tracker_handles_revised_partials() {
        let lexicon = FillerLexicon::default();
        let mut tracker = HesitationTracker::default();

        tracker.observe(&lexicon, "we like to test");
        // the provider revised "like" into "liked"
        assert_eq!(tracker.observe(&lexicon, "we liked to test"), 0);
    }

    #[test]
    fn capture_measures_window_and_analyzer_derives_metrics() {
        let analyzer = AnswerAnalyzer::default();
        let mut capture = AnswerCapture::start("Tell me about React hooks", started());
        capture.push_partial(analyzer.lexicon(), "um hooks let");
        capture.push_partial(
            analyzer.lexicon(),
            "um hooks let function components hold state and effects",
        );

        let captured = capture.stop(started() + Duration::milliseconds(42_500));
        assert_eq!(captured.response_time, 42.5);
        assert_eq!(captured.live_hesitations, 1);

        let entry = analyzer.analyze(captured);
        assert_eq!(entry.question, "Tell me about React hooks");
        assert_eq!(entry.hesitation_count, 1);
        assert_eq!(entry.clarity_score, 0.9);
        assert_eq!(entry.confidence, 9.5);
        assert_eq!(entry.tone, Tone::Neutral);
        assert_eq!(entry.score, 0.0);
    }

    #[test]
    fn clarity_and_confidence_are_bounded() {
        assert_eq!(clarity_score(0), 0.0);
        assert_eq!(clarity_score(250), 10.0);
        assert_eq!(confidence_score(0), 10.0);
        assert_eq!(confidence_score(40), 0.0);
    }

    #[test]
    fn stop_before_start_clamps_to_zero() {
        let capture = AnswerCapture::start("Q", started());
        let captured = capture.stop(started() - Duration::seconds(3));
        assert_eq!(captured.response_time, 0.0);
    }
}
