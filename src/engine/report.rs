use chrono::{DateTime, Utc};

use crate::engine::progress::mastery_level;
use crate::engine::progress_map::ProgressMap;
use crate::session::result::SessionRecord;
use crate::words::WordList;

const REPORT_MASTERED_LEVEL: u32 = 80;
const REPORT_STRUGGLE_LEVEL: u32 = 60;
const MAX_STRUGGLE_WORDS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StruggleWord {
    pub word: String,
    pub list_name: String,
    pub incorrect: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListBreakdown {
    pub list_name: String,
    pub practiced: usize,
    pub mastered: usize,
    pub total: usize,
}

/// Parent-facing summary of one learner across every list.
#[derive(Clone, Debug, PartialEq)]
pub struct UserReport {
    pub user_id: String,
    pub user_name: String,
    pub total_words: usize,
    pub practiced: usize,
    pub mastered: usize,
    /// Percentage of lifetime attempts answered correctly.
    pub accuracy: u32,
    pub sessions: usize,
    pub last_active: Option<DateTime<Utc>>,
    pub struggle_words: Vec<StruggleWord>,
    pub lists: Vec<ListBreakdown>,
}

impl UserReport {
    pub fn mastered_percent(&self) -> f64 {
        if self.total_words == 0 {
            0.0
        } else {
            self.mastered as f64 / self.total_words as f64 * 100.0
        }
    }
}

/// Build a report from progress (mastery uses the smoothed percentage, not
/// the repetition streak) and the session log.
pub fn build_user_report(
    user_id: &str,
    user_name: &str,
    lists: &[WordList],
    progress: &ProgressMap,
    sessions: &[SessionRecord],
) -> UserReport {
    let mut report = UserReport {
        user_id: user_id.to_string(),
        user_name: user_name.to_string(),
        total_words: 0,
        practiced: 0,
        mastered: 0,
        accuracy: 0,
        sessions: 0,
        last_active: None,
        struggle_words: Vec::new(),
        lists: Vec::with_capacity(lists.len()),
    };
    let mut total_correct = 0u64;
    let mut total_attempts = 0u64;

    for list in lists {
        let mut breakdown = ListBreakdown {
            list_name: list.name.clone(),
            practiced: 0,
            mastered: 0,
            total: list.words.len(),
        };

        for entry in &list.words {
            let Some(p) = progress.get(Some(user_id), &list.id, &entry.word) else {
                continue;
            };
            if p.is_untested() {
                continue;
            }
            breakdown.practiced += 1;
            total_correct += u64::from(p.correct_count);
            total_attempts += u64::from(p.correct_count) + u64::from(p.incorrect_count);

            let level = mastery_level(p);
            if level >= REPORT_MASTERED_LEVEL {
                breakdown.mastered += 1;
            }
            if p.incorrect_count > 0 && level < REPORT_STRUGGLE_LEVEL {
                report.struggle_words.push(StruggleWord {
                    word: entry.word.clone(),
                    list_name: list.name.clone(),
                    incorrect: p.incorrect_count,
                });
            }
        }

        report.total_words += breakdown.total;
        report.practiced += breakdown.practiced;
        report.mastered += breakdown.mastered;
        report.lists.push(breakdown);
    }

    if total_attempts > 0 {
        report.accuracy = (total_correct as f64 / total_attempts as f64 * 100.0).round() as u32;
    }

    // unowned sessions predate multi-user support and count for everyone
    let owned: Vec<&SessionRecord> = sessions
        .iter()
        .filter(|s| s.user_id.as_deref().is_none_or(|id| id == user_id))
        .collect();
    report.sessions = owned.len();
    report.last_active = owned.iter().map(|s| s.date).max();

    report
        .struggle_words
        .sort_by(|a, b| b.incorrect.cmp(&a.incorrect));
    report.struggle_words.truncate(MAX_STRUGGLE_WORDS);

    report
}
