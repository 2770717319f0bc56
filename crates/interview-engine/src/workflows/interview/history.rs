use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::storage::{load_json, save_json, KeyValueStore, StorageError};

const HISTORY_KEY_PREFIX: &str = "question_history";
const HISTORY_INDEX_KEY: &str = "question_history:index";

/// Usage bookkeeping for one stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionUsage {
    pub first_asked: DateTime<Utc>,
    pub last_asked: DateTime<Utc>,
    pub times_presented: u32,
}

/// Every question generated so far for one (role, resume) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionHistoryEntry {
    pub job_role: String,
    pub resume_hash: String,
    pub questions: BTreeMap<String, QuestionUsage>,
    pub updated_at: DateTime<Utc>,
}

/// Reuse statistics for one (role, resume) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuestionStatistics {
    pub total_asked: u32,
    pub unique_count: u32,
    pub average_reuse: f32,
}

/// Durable question history keyed by normalized role and resume fingerprint.
pub struct QuestionHistoryStore<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for QuestionHistoryStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> QuestionHistoryStore<S>
where
    S: KeyValueStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn previously_asked(&self, job_role: &str, resume_content: &str) -> Vec<String> {
        self.entry(job_role, resume_content)
            .map(|entry| entry.questions.into_keys().collect())
            .unwrap_or_default()
    }

    /// Store `questions` as asked at `now`. Questions already stored keep a single copy.
    pub fn record(
        &self,
        job_role: &str,
        resume_content: &str,
        questions: &[String],
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let key = history_key(job_role, resume_content);
        let mut entry = load_json::<QuestionHistoryEntry, S>(self.store.as_ref(), &key)
            .unwrap_or_else(|| QuestionHistoryEntry {
                job_role: normalize_role(job_role),
                resume_hash: resume_fingerprint(resume_content),
                questions: BTreeMap::new(),
                updated_at: now,
            });

        let batch: BTreeSet<String> = questions
            .iter()
            .filter_map(|q| normalize_question(q))
            .collect();
        let mut added = 0usize;
        for question in batch {
            entry
                .questions
                .entry(question)
                .and_modify(|usage| {
                    usage.last_asked = now;
                    usage.times_presented += 1;
                })
                .or_insert_with(|| {
                    added += 1;
                    QuestionUsage {
                        first_asked: now,
                        last_asked: now,
                        times_presented: 1,
                    }
                });
        }
        entry.updated_at = now;

        save_json(self.store.as_ref(), &key, &entry)?;
        self.track_key(&key)?;

        debug!(
            job_role = %entry.job_role,
            resume_hash = %entry.resume_hash,
            added,
            stored = entry.questions.len(),
            "recorded question history"
        );
        Ok(())
    }

    pub fn statistics(&self, job_role: &str, resume_content: &str) -> QuestionStatistics {
        let Some(entry) = self.entry(job_role, resume_content) else {
            return QuestionStatistics {
                total_asked: 0,
                unique_count: 0,
                average_reuse: 0.0,
            };
        };

        let unique_count = entry.questions.len() as u32;
        let total_asked: u32 = entry
            .questions
            .values()
            .map(|usage| usage.times_presented)
            .sum();
        let average_reuse = if unique_count == 0 {
            0.0
        } else {
            total_asked as f32 / unique_count as f32
        };

        QuestionStatistics {
            total_asked,
            unique_count,
            average_reuse,
        }
    }

    /// Drop entries whose last update is older than `max_age_days`. Returns how many were removed.
    pub fn expire(&self, max_age_days: u32, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let cutoff = now - Duration::days(i64::from(max_age_days));
        let keys = self.index();
        let mut retained = BTreeSet::new();
        let mut removed = 0usize;

        for key in keys {
            match load_json::<QuestionHistoryEntry, S>(self.store.as_ref(), &key) {
                Some(entry) if entry.updated_at >= cutoff => {
                    retained.insert(key);
                }
                _ => {
                    self.store.remove(&key)?;
                    removed += 1;
                }
            }
        }

        save_json(self.store.as_ref(), HISTORY_INDEX_KEY, &retained)?;
        if removed > 0 {
            info!(removed, max_age_days, "expired question history entries");
        }
        Ok(removed)
    }

    fn entry(&self, job_role: &str, resume_content: &str) -> Option<QuestionHistoryEntry> {
        load_json(self.store.as_ref(), &history_key(job_role, resume_content))
    }

    fn index(&self) -> BTreeSet<String> {
        load_json(self.store.as_ref(), HISTORY_INDEX_KEY).unwrap_or_default()
    }

    fn track_key(&self, key: &str) -> Result<(), StorageError> {
        let mut index = self.index();
        if index.insert(key.to_string()) {
            save_json(self.store.as_ref(), HISTORY_INDEX_KEY, &index)?;
        }
        Ok(())
    }
}

fn history_key(job_role: &str, resume_content: &str) -> String {
    format!(
        "{HISTORY_KEY_PREFIX}:{}:{}",
        normalize_role(job_role),
        resume_fingerprint(resume_content)
    )
}

pub(crate) fn normalize_role(job_role: &str) -> String {
    job_role
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_question(question: &str) -> Option<String> {
    let collapsed = question.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Stable fingerprint of resume text that ignores token order, case, and spacing.
pub fn resume_fingerprint(resume_content: &str) -> String {
    let mut tokens: Vec<String> = resume_content
        .split_whitespace()
        .map(|token| token.to_lowercase())
        .collect();
    tokens.sort_unstable();

    let mut hasher = Sha256::new();
    for token in &tokens {
        hasher.update(token.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::storage::MemoryStore;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn questions(items: &[&str]) -> Vec<String> {
        items.iter().map(|q| q.to_string()).collect()
    }

    fn history() -> (Arc<MemoryStore>, QuestionHistoryStore<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), QuestionHistoryStore::new(store))
    }

    #[test]
    fn record_then_previously_asked_round_trips_without_duplicates() {
        let (_, history) = history();
        let asked = questions(&[
            "Explain the virtual DOM.",
            "How do you memoize components?",
            "Explain the virtual DOM.",
        ]);

        history
            .record("Frontend Developer", "5 years React", &asked, at(1))
            .expect("record");

        let mut stored = history.previously_asked("Frontend Developer", "5 years React");
        stored.sort();
        assert_eq!(
            stored,
            questions(&["Explain the virtual DOM.", "How do you memoize components?"])
        );
    }

    #[test]
    fn recording_the_same_question_twice_keeps_unique_count() {
        let (_, history) = history();
        let asked = questions(&["Describe a production incident you owned."]);

        history
            .record("SRE", "pager rotations", &asked, at(1))
            .expect("first record");
        let first = history.statistics("SRE", "pager rotations");
        history
            .record("SRE", "pager rotations", &asked, at(2))
            .expect("second record");
        let second = history.statistics("SRE", "pager rotations");

        assert_eq!(first.unique_count, 1);
        assert_eq!(second.unique_count, 1);
        assert_eq!(second.total_asked, 2);
        assert_eq!(second.average_reuse, 2.0);
    }

    #[test]
    fn duplicates_within_one_batch_count_once() {
        let (_, history) = history();
        let asked = questions(&[
            "How do you review code?",
            "How  do you review code? ",
            "How do you review code?",
        ]);

        history
            .record("Tech Lead", "mentoring", &asked, at(1))
            .expect("record");

        let stats = history.statistics("Tech Lead", "mentoring");
        assert_eq!(stats.unique_count, 1);
        assert_eq!(stats.total_asked, 1);
        assert_eq!(stats.average_reuse, 1.0);
    }

    #[test]
    fn statistics_default_to_zero_for_unknown_pairs() {
        let (_, history) = history();
        let stats = history.statistics("Data Engineer", "spark");
        assert_eq!(stats.total_asked, 0);
        assert_eq!(stats.unique_count, 0);
        assert_eq!(stats.average_reuse, 0.0);
    }

    #[test]
    fn resume_fingerprint_ignores_order_case_and_spacing() {
        assert_eq!(
            resume_fingerprint("5 years React\nTypeScript"),
            resume_fingerprint("typescript   react 5 YEARS")
        );
        assert_ne!(
            resume_fingerprint("5 years React"),
            resume_fingerprint("5 years Vue")
        );
    }

    #[test]
    fn role_and_resume_variants_share_history() {
        let (_, history) = history();
        history
            .record(
                "Frontend Developer",
                "React Redux",
                &questions(&["What is reconciliation?"]),
                at(1),
            )
            .expect("record");

        let stored = history.previously_asked("  frontend   developer ", "redux react");
        assert_eq!(stored, questions(&["What is reconciliation?"]));
    }

    #[test]
    fn expire_removes_stale_entries_only() {
        let (store, history) = history();
        history
            .record("Backend", "Go", &questions(&["Old question"]), at(1))
            .expect("record old");
        history
            .record("Backend", "Rust", &questions(&["Fresh question"]), at(20))
            .expect("record fresh");

        let removed = history.expire(10, at(25)).expect("expire");

        assert_eq!(removed, 1);
        assert!(history.previously_asked("Backend", "Go").is_empty());
        assert_eq!(
            history.previously_asked("Backend", "Rust"),
            questions(&["Fresh question"])
        );
        assert_eq!(
            store
                .keys()
                .iter()
                .filter(|key| key.starts_with("question_history:backend"))
                .count(),
            1
        );
    }

    #[test]
    fn corrupt_entry_is_treated_as_empty_and_overwritten() {
        let (store, history) = history();
        let key = history_key("QA", "selenium");
        store.set(&key, "{{{".to_string()).expect("seed corrupt entry");

        assert!(history.previously_asked("QA", "selenium").is_empty());
        history
            .record("QA", "selenium", &questions(&["How do you test flaky UIs?"]), at(3))
            .expect("record over corruption");
        assert_eq!(history.statistics("QA", "selenium").unique_count, 1);
    }
}
