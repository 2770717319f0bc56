use std::collections::HashSet;

use super::history::normalize_role;

const ROLE_TEMPLATES: &[&str] = &[
    "Walk me through a recent project where you worked as a {role}. What was your specific contribution?",
    "What are the most important skills for a {role}, and how have you demonstrated them?",
    "Describe a difficult technical problem you solved as a {role}. How did you approach it?",
    "How do you keep your {role} skills current with changes in the field?",
    "Tell me about a time you disagreed with a teammate on a {role} decision. How was it resolved?",
    "How would you explain a complex {role} concept to a non-technical stakeholder?",
    "Describe a mistake you made in a {role} position and what you changed afterwards.",
    "How do you prioritize competing deadlines as a {role}?",
    "What does quality mean to you in {role} work, and how do you verify it?",
    "Where do you see your growth as a {role} over the next two years?",
];

const KEYWORD_TEMPLATES: &[&str] = &[
    "Your resume mentions {keyword}. Describe how you used it in a real project.",
    "What trade-offs have you run into when working with {keyword}?",
];

/// Deterministic question source used when the generation provider is unavailable.
#[derive(Debug, Clone, Default)]
pub struct TemplateQuestionBank;

impl TemplateQuestionBank {
    /// Expand templates for `job_role`, skipping already asked questions while enough remain.
    /// Always returns exactly `count` questions.
    pub fn questions(
        &self,
        job_role: &str,
        resume_content: &str,
        previously_asked: &[String],
        count: usize,
    ) -> Vec<String> {
        let role = display_role(job_role);
        let asked: HashSet<&str> = previously_asked.iter().map(String::as_str).collect();

        let mut candidates: Vec<String> = resume_keywords(resume_content)
            .into_iter()
            .flat_map(|keyword| {
                KEYWORD_TEMPLATES
                    .iter()
                    .map(move |template| template.replace("{keyword}", &keyword))
            })
            .take(2)
            .collect();
        candidates.extend(
            ROLE_TEMPLATES
                .iter()
                .map(|template| template.replace("{role}", &role)),
        );

        let (fresh, repeated): (Vec<String>, Vec<String>) = candidates
            .into_iter()
            .partition(|question| !asked.contains(question.as_str()));

        let mut selected: Vec<String> = fresh.into_iter().chain(repeated).take(count).collect();

        let mut round = 2;
        while selected.len() < count {
            let template = ROLE_TEMPLATES[selected.len() % ROLE_TEMPLATES.len()];
            selected.push(format!(
                "{} (follow-up {round})",
                template.replace("{role}", &role)
            ));
            round += 1;
        }

        selected
    }
}

fn display_role(job_role: &str) -> String {
    let normalized = normalize_role(job_role);
    if normalized.is_empty() {
        "candidate".to_string()
    } else {
        normalized
    }
}

/// Proper nouns, acronyms, and dotted names from the resume, in first-seen order.
/// Capitalized words opening a sentence are skipped.
fn resume_keywords(resume_content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();
    let mut sentence_start = true;

    for raw in resume_content.split(|c: char| c.is_whitespace() || c == ',' || c == ';' || c == '/')
    {
        if raw.is_empty() {
            continue;
        }
        let opens_sentence = sentence_start;
        sentence_start = raw.ends_with(|c: char| matches!(c, '.' | '!' | '?'));

        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '+' && c != '#');
        if token.chars().count() < 2 {
            continue;
        }
        let capitalized = token.chars().next().is_some_and(char::is_uppercase);
        let acronym = token.chars().all(|c| !c.is_lowercase());
        let dotted = token.contains('.');

        let notable = dotted || (acronym && capitalized) || (capitalized && !opens_sentence);
        if notable && seen.insert(token.to_lowercase()) {
            keywords.push(token.to_string());
        }
    }

    keywords
}
