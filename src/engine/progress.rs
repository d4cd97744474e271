use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::heatmap::HeatmapLevels;

pub const MIN_EASE: f64 = 1.3;
pub const INITIAL_EASE: f64 = 2.5;
const EASE_PENALTY: f64 = 0.2;
const EASE_BONUS: f64 = 0.1;
const EASE_DAMPING: f64 = 0.08;
const MINUTE_MS: i64 = 60_000;
const RETRY_DELAY_MS: i64 = MINUTE_MS;

/// Mastery record for one word of one list, optionally scoped to a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub word: String,
    pub list_id: String,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Epoch millis of the last attempt, 0 when never attempted.
    pub last_reviewed: i64,
    /// Epoch millis after which the word is due again. Informational only.
    pub next_review: i64,
    pub ease_factor: f64,
    /// Minutes until the next nominal review.
    pub interval: u32,
    /// Consecutive correct answers since the last miss.
    pub repetitions: u32,
}

impl WordProgress {
    pub fn new(word: impl Into<String>, list_id: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            list_id: list_id.into(),
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed: 0,
            next_review: 0,
            ease_factor: INITIAL_EASE,
            interval: 0,
            repetitions: 0,
        }
    }

    pub fn is_untested(&self) -> bool {
        self.last_reviewed == 0
    }

    /// Wrong at some point and not answered correctly since.
    pub fn is_currently_missed(&self) -> bool {
        self.incorrect_count > 0 && self.repetitions == 0
    }

    pub fn is_mastered(&self, levels: HeatmapLevels) -> bool {
        self.repetitions >= levels.mastery()
    }
}

pub fn update_progress(progress: &WordProgress, correct: bool) -> WordProgress {
    update_progress_at(progress, correct, Utc::now().timestamp_millis())
}

/// Apply one answer to a progress record, returning the new record.
pub fn update_progress_at(progress: &WordProgress, correct: bool, now_ms: i64) -> WordProgress {
    if !correct {
        return WordProgress {
            incorrect_count: progress.incorrect_count + 1,
            last_reviewed: now_ms,
            next_review: now_ms + RETRY_DELAY_MS,
            repetitions: 0,
            interval: 0,
            ease_factor: (progress.ease_factor - EASE_PENALTY).max(MIN_EASE),
            ..progress.clone()
        };
    }

    let repetitions = progress.repetitions + 1;
    let interval = match repetitions {
        1 => 1,
        2 => 6,
        _ => (f64::from(progress.interval) * progress.ease_factor).round() as u32,
    };
    let ease_factor = (progress.ease_factor + EASE_BONUS - EASE_DAMPING).max(MIN_EASE);

    WordProgress {
        correct_count: progress.correct_count + 1,
        last_reviewed: now_ms,
        next_review: now_ms + i64::from(interval) * MINUTE_MS,
        repetitions,
        interval,
        ease_factor,
        ..progress.clone()
    }
}

/// Smoothed 0-100 percentage for report display. Not the same rule as
/// [`WordProgress::is_mastered`], which only looks at the current streak.
pub fn mastery_level(progress: &WordProgress) -> u32 {
    if progress.last_reviewed == 0 || progress.correct_count == 0 {
        return 0;
    }
    let attempts = progress.correct_count + progress.incorrect_count;
    let ratio = f64::from(progress.correct_count) / f64::from(attempts);
    let rep_bonus = (f64::from(progress.repetitions) / 5.0).min(1.0);
    (((ratio + rep_bonus) / 2.0) * 100.0).round() as u32
}
