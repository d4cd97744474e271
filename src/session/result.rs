use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::policy::Activity;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWordResult {
    pub word: String,
    pub typed: String,
    pub correct: bool,
}

impl SessionWordResult {
    pub fn new(word: impl Into<String>, typed: impl Into<String>, correct: bool) -> Self {
        Self {
            word: word.into(),
            typed: typed.into(),
            correct,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Learn,
    Quiz,
    Practice,
    MissingLetters,
    /// Written by older clients for highlight-assisted runs.
    Highlight,
}

impl SessionMode {
    /// Mode a finished run is logged under. Assisted quizzes are not
    /// counted as quizzes.
    pub fn for_activity(activity: Activity, highlight_on: bool) -> Self {
        match activity {
            Activity::Learn => SessionMode::Learn,
            Activity::Practice => SessionMode::Practice,
            Activity::Quiz if highlight_on => SessionMode::Practice,
            Activity::Quiz => SessionMode::Quiz,
            Activity::MissingLetters => SessionMode::MissingLetters,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Learn => "learn",
            SessionMode::Quiz => "quiz",
            SessionMode::Practice => "practice",
            SessionMode::MissingLetters => "missingLetters",
            SessionMode::Highlight => "highlight",
        }
    }
}

/// Immutable log entry for one completed activity run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub list_id: String,
    pub list_name: String,
    pub mode: SessionMode,
    pub results: Vec<SessionWordResult>,
    /// 0-100.
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_on: Option<bool>,
}

/// Keep the first result per word; a later correct retry never hides a miss.
pub fn dedupe_results(results: &[SessionWordResult]) -> Vec<SessionWordResult> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| seen.insert(r.word.as_str()))
        .cloned()
        .collect()
}

pub fn compute_score(results: &[SessionWordResult]) -> u32 {
    if results.is_empty() {
        return 0;
    }
    let correct = results.iter().filter(|r| r.correct).count();
    (correct as f64 / results.len() as f64 * 100.0).round() as u32
}

/// Fields of a record that are not derived from the results.
#[derive(Clone, Debug)]
pub struct SessionMeta {
    pub id: String,
    pub date: DateTime<Utc>,
    pub list_id: String,
    pub list_name: String,
    pub user_id: Option<String>,
}

impl SessionRecord {
    pub fn from_results(
        meta: SessionMeta,
        activity: Activity,
        highlight_on: bool,
        raw: &[SessionWordResult],
    ) -> Self {
        let results = dedupe_results(raw);
        let score = compute_score(&results);
        Self {
            id: meta.id,
            date: meta.date,
            list_id: meta.list_id,
            list_name: meta.list_name,
            mode: SessionMode::for_activity(activity, highlight_on),
            results,
            score,
            user_id: meta.user_id,
            highlight_on: highlight_on.then_some(true),
        }
    }

    pub fn correct_count(&self) -> usize {
        self.results.iter().filter(|r| r.correct).count()
    }
}

/// Session log query. `user_id` also matches unowned records, which predate
/// per-user history.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub list_id: Option<String>,
    pub user_id: Option<String>,
}

impl SessionFilter {
    pub fn for_user(user_id: Option<&str>) -> Self {
        Self {
            list_id: None,
            user_id: user_id.map(str::to_string),
        }
    }

    pub fn with_list(mut self, list_id: impl Into<String>) -> Self {
        self.list_id = Some(list_id.into());
        self
    }

    pub fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(list_id) = &self.list_id {
            if &record.list_id != list_id {
                return false;
            }
        }
        match (&self.user_id, &record.user_id) {
            (Some(wanted), Some(owner)) => wanted == owner,
            _ => true,
        }
    }
}
