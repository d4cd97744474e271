use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::session::result::{SessionMode, SessionRecord};
use crate::words::WordList;

const MIN_LEVELS: u8 = 2;
const MAX_LEVELS: u8 = 5;
const DEFAULT_LEVELS: u8 = 3;

/// Number of heatmap buckets (2..=5). A word is mastered after
/// `levels - 1` consecutive correct answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct HeatmapLevels(u8);

impl HeatmapLevels {
    pub fn new(levels: u8) -> Self {
        Self(levels.clamp(MIN_LEVELS, MAX_LEVELS))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn mastery(self) -> u32 {
        u32::from(self.0) - 1
    }
}

impl Default for HeatmapLevels {
    fn default() -> Self {
        Self(DEFAULT_LEVELS)
    }
}

impl From<u8> for HeatmapLevels {
    fn from(levels: u8) -> Self {
        Self::new(levels)
    }
}

impl From<HeatmapLevels> for u8 {
    fn from(levels: HeatmapLevels) -> Self {
        levels.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordStatus {
    NotTried,
    Missed,
    /// Current consecutive-correct streak, capped at the mastery level.
    Streak(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeatColor {
    Ghost,
    Red,
    Orange,
    Amber,
    Yellow,
    Lime,
    Green,
}

impl HeatColor {
    pub fn name(self) -> &'static str {
        match self {
            HeatColor::Ghost => "ghost",
            HeatColor::Red => "red",
            HeatColor::Orange => "orange",
            HeatColor::Amber => "amber",
            HeatColor::Yellow => "yellow",
            HeatColor::Lime => "lime",
            HeatColor::Green => "green",
        }
    }
}

fn progress_ramp(levels: HeatmapLevels) -> &'static [HeatColor] {
    match levels.get() {
        2 => &[HeatColor::Green],
        3 => &[HeatColor::Amber, HeatColor::Green],
        4 => &[HeatColor::Orange, HeatColor::Yellow, HeatColor::Green],
        _ => &[
            HeatColor::Orange,
            HeatColor::Yellow,
            HeatColor::Lime,
            HeatColor::Green,
        ],
    }
}

pub fn heatmap_color(status: WordStatus, levels: HeatmapLevels) -> HeatColor {
    match status {
        WordStatus::NotTried => HeatColor::Ghost,
        WordStatus::Missed => HeatColor::Red,
        WordStatus::Streak(streak) => {
            let ramp = progress_ramp(levels);
            let idx = streak.min(levels.mastery()).saturating_sub(1) as usize;
            ramp.get(idx).copied().unwrap_or(HeatColor::Green)
        }
    }
}

/// Replay session history oldest-first to derive each word's status.
///
/// Independent of `WordProgress::repetitions`; the two can disagree after
/// sessions are deleted.
pub fn compute_word_statuses(
    words: &[&str],
    sessions: &[SessionRecord],
    levels: HeatmapLevels,
) -> HashMap<String, WordStatus> {
    let mastery = levels.mastery();
    let mut ordered: Vec<&SessionRecord> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.date);

    words
        .iter()
        .map(|&word| {
            let mut attempted = false;
            let mut has_incorrect = false;
            let mut consecutive = 0u32;
            for session in &ordered {
                if let Some(result) = session.results.iter().find(|r| r.word == word) {
                    attempted = true;
                    if result.correct {
                        consecutive += 1;
                    } else {
                        has_incorrect = true;
                        consecutive = 0;
                    }
                }
            }

            let status = if !attempted {
                WordStatus::NotTried
            } else if has_incorrect && consecutive == 0 {
                WordStatus::Missed
            } else {
                WordStatus::Streak(consecutive.min(mastery))
            };
            (word.to_string(), status)
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapMode {
    /// Every session of the list; quiz answers count as practice too.
    #[default]
    Learn,
    /// Quiz sessions only.
    Quiz,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListProgress {
    pub list_id: String,
    pub list_name: String,
    /// Status per word, in list order.
    pub statuses: Vec<(String, WordStatus)>,
    pub mastered: usize,
    pub missed: usize,
    pub practiced: usize,
    pub total: usize,
}

impl ListProgress {
    pub fn mastered_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.mastered as f64 / self.total as f64 * 100.0
    }
}

pub fn summarize_list(
    list: &WordList,
    sessions: &[SessionRecord],
    levels: HeatmapLevels,
    mode: HeatmapMode,
) -> ListProgress {
    let relevant: Vec<SessionRecord> = sessions
        .iter()
        .filter(|s| s.list_id == list.id)
        .filter(|s| mode == HeatmapMode::Learn || s.mode == SessionMode::Quiz)
        .cloned()
        .collect();

    let words = list.word_strings();
    let mut by_word = compute_word_statuses(&words, &relevant, levels);
    let statuses: Vec<(String, WordStatus)> = words
        .iter()
        .map(|w| {
            let status = by_word.remove(*w).unwrap_or(WordStatus::NotTried);
            (w.to_string(), status)
        })
        .collect();

    let mastery = levels.mastery();
    let mastered = statuses
        .iter()
        .filter(|(_, s)| matches!(s, WordStatus::Streak(n) if *n >= mastery))
        .count();
    let missed = statuses
        .iter()
        .filter(|(_, s)| *s == WordStatus::Missed)
        .count();
    let practiced = statuses
        .iter()
        .filter(|(_, s)| *s != WordStatus::NotTried)
        .count();

    ListProgress {
        list_id: list.id.clone(),
        list_name: list.name.clone(),
        total: statuses.len(),
        statuses,
        mastered,
        missed,
        practiced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::result::SessionWordResult;
    use chrono::{Duration, TimeZone, Utc};

    fn session(minutes: i64, list: &str, mode: SessionMode, results: &[(&str, bool)]) -> SessionRecord {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        SessionRecord {
            id: format!("s{minutes}"),
            date: base + Duration::minutes(minutes),
            list_id: list.to_string(),
            list_name: "List".to_string(),
            mode,
            results: results
                .iter()
                .map(|(w, c)| SessionWordResult {
                    word: w.to_string(),
                    typed: w.to_string(),
                    correct: *c,
                })
                .collect(),
            score: 0,
            user_id: None,
            highlight_on: None,
        }
    }

    #[test]
    fn test_levels_clamped_and_mastery() {
        assert_eq!(HeatmapLevels::new(1).get(), 2);
        assert_eq!(HeatmapLevels::new(9).get(), 5);
        assert_eq!(HeatmapLevels::new(3).mastery(), 2);
        assert_eq!(HeatmapLevels::default().get(), 3);
        let parsed: HeatmapLevels = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.get(), 5);
    }

    #[test]
    fn test_wrong_then_two_correct_reaches_mastery() {
        let sessions = vec![
            session(0, "l", SessionMode::Learn, &[("cat", false)]),
            session(1, "l", SessionMode::Learn, &[("cat", true)]),
            session(2, "l", SessionMode::Learn, &[("cat", true)]),
        ];
        let statuses = compute_word_statuses(&["cat"], &sessions, HeatmapLevels::new(3));
        assert_eq!(statuses["cat"], WordStatus::Streak(2));
    }

    #[test]
    fn test_replay_uses_chronological_order() {
        let sessions = vec![
            session(5, "l", SessionMode::Learn, &[("cat", false)]),
            session(0, "l", SessionMode::Learn, &[("cat", true)]),
        ];
        let statuses = compute_word_statuses(&["cat", "dog"], &sessions, HeatmapLevels::new(3));
        assert_eq!(statuses["cat"], WordStatus::Missed);
        assert_eq!(statuses["dog"], WordStatus::NotTried);
    }

    #[test]
    fn test_streak_capped_at_mastery() {
        let sessions: Vec<SessionRecord> = (0..6)
            .map(|i| session(i, "l", SessionMode::Quiz, &[("cat", true)]))
            .collect();
        let statuses = compute_word_statuses(&["cat"], &sessions, HeatmapLevels::new(4));
        assert_eq!(statuses["cat"], WordStatus::Streak(3));
    }

    #[test]
    fn test_heatmap_colors_per_level() {
        let three = HeatmapLevels::new(3);
        assert_eq!(heatmap_color(WordStatus::NotTried, three), HeatColor::Ghost);
        assert_eq!(heatmap_color(WordStatus::Missed, three), HeatColor::Red);
        assert_eq!(heatmap_color(WordStatus::Streak(1), three), HeatColor::Amber);
        assert_eq!(heatmap_color(WordStatus::Streak(2), three), HeatColor::Green);

        let five = HeatmapLevels::new(5);
        assert_eq!(heatmap_color(WordStatus::Streak(1), five), HeatColor::Orange);
        assert_eq!(heatmap_color(WordStatus::Streak(3), five), HeatColor::Lime);
        assert_eq!(heatmap_color(WordStatus::Streak(9), five), HeatColor::Green);

        let two = HeatmapLevels::new(2);
        assert_eq!(heatmap_color(WordStatus::Streak(1), two), HeatColor::Green);
    }

    #[test]
    fn test_summarize_list_counts_by_mode() {
        let list = WordList::new(
            "l",
            "Week 1",
            &["cat".to_string(), "dog".to_string(), "owl".to_string()],
            0,
        );
        let sessions = vec![
            session(0, "l", SessionMode::Learn, &[("cat", true), ("dog", false)]),
            session(1, "l", SessionMode::Quiz, &[("cat", true)]),
            session(2, "other", SessionMode::Quiz, &[("owl", true)]),
        ];
        let learn = summarize_list(&list, &sessions, HeatmapLevels::new(3), HeatmapMode::Learn);
        assert_eq!(learn.mastered, 1);
        assert_eq!(learn.missed, 1);
        assert_eq!(learn.practiced, 2);
        assert_eq!(learn.total, 3);
        assert_eq!(learn.statuses[2], ("owl".to_string(), WordStatus::NotTried));

        let quiz = summarize_list(&list, &sessions, HeatmapLevels::new(3), HeatmapMode::Quiz);
        assert_eq!(quiz.mastered, 0);
        assert_eq!(quiz.missed, 0);
        assert_eq!(quiz.practiced, 1);
        assert_eq!(quiz.statuses[0].1, WordStatus::Streak(1));
    }
}
