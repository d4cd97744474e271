use std::collections::{BTreeSet, HashSet};

use crate::engine::heatmap::HeatmapLevels;
use crate::engine::progress_map::ProgressMap;
use crate::session::result::{SessionMode, SessionRecord};
use crate::words::WordList;

const STREAK_MIN_SCORE: u32 = 80;
const COMEBACK_LOW_SCORE: u32 = 50;
const PERFECT_SCORE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Sessions,
    WordsCorrect,
    Mastery,
    ListsComplete,
    Learning,
    Quizzing,
    Streaks,
    PracticeDays,
    Accuracy,
    Special,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Sessions,
        Category::WordsCorrect,
        Category::Mastery,
        Category::ListsComplete,
        Category::Learning,
        Category::Quizzing,
        Category::Streaks,
        Category::PracticeDays,
        Category::Accuracy,
        Category::Special,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Category::Sessions => "sessions",
            Category::WordsCorrect => "words-correct",
            Category::Mastery => "mastery",
            Category::ListsComplete => "lists-complete",
            Category::Learning => "learning",
            Category::Quizzing => "quizzing",
            Category::Streaks => "streaks",
            Category::PracticeDays => "practice-days",
            Category::Accuracy => "accuracy",
            Category::Special => "special",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Sessions => "Sessions",
            Category::WordsCorrect => "Words Correct",
            Category::Mastery => "Mastery",
            Category::ListsComplete => "Lists Complete",
            Category::Learning => "Learning",
            Category::Quizzing => "Quizzing",
            Category::Streaks => "Streaks",
            Category::PracticeDays => "Practice Days",
            Category::Accuracy => "Accuracy",
            Category::Special => "Special",
        }
    }
}

/// What an achievement measures. Tiered rules compare a count against
/// the achievement's threshold; the specials are plain predicates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rule {
    Sessions(usize),
    WordsCorrect(usize),
    WordsMastered(usize),
    ListsComplete(usize),
    LearnSessions(usize),
    QuizSessions(usize),
    HighScoreStreak(usize),
    PracticeDays(usize),
    PerfectSessions(usize),
    PerfectQuiz,
    Comeback,
    UnassistedSessions(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementDef {
    pub id: &'static str,
    pub emoji: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    rule: Rule,
}

const fn def(
    id: &'static str,
    emoji: &'static str,
    name: &'static str,
    description: &'static str,
    category: Category,
    rule: Rule,
) -> AchievementDef {
    AchievementDef {
        id,
        emoji,
        name,
        description,
        category,
        rule,
    }
}

use Category as C;
use Rule as R;

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    def("first-steps", "🐣", "First Steps", "Complete your first session", C::Sessions, R::Sessions(1)),
    def("high-five", "🖐️", "High Five!", "Complete 5 sessions", C::Sessions, R::Sessions(5)),
    def("double-digits", "🔟", "Double Digits", "Complete 10 sessions", C::Sessions, R::Sessions(10)),
    def("dedicated", "🎒", "Dedicated", "Complete 25 sessions", C::Sessions, R::Sessions(25)),
    def("fifty-fabulous", "🏃", "Fifty & Fabulous", "Complete 50 sessions", C::Sessions, R::Sessions(50)),
    def("century", "💯", "Century", "Complete 100 sessions", C::Sessions, R::Sessions(100)),
    def("legendary", "👑", "Legendary", "Complete 250 sessions", C::Sessions, R::Sessions(250)),
    def("fifty-speller", "🎯", "Fifty Speller", "Spell 50 words correctly", C::WordsCorrect, R::WordsCorrect(50)),
    def("century-speller", "⭐", "Century Speller", "Spell 100 words correctly", C::WordsCorrect, R::WordsCorrect(100)),
    def("word-collector", "💎", "Word Collector", "Spell 250 words correctly", C::WordsCorrect, R::WordsCorrect(250)),
    def("word-flood", "🌊", "Word Flood", "Spell 500 words correctly", C::WordsCorrect, R::WordsCorrect(500)),
    def("word-mountain", "🏔️", "Word Mountain", "Spell 1,000 words correctly", C::WordsCorrect, R::WordsCorrect(1000)),
    def("word-galaxy", "🌌", "Word Galaxy", "Spell 2,500 words correctly", C::WordsCorrect, R::WordsCorrect(2500)),
    def("word-master", "🌟", "Word Master", "Master your first word", C::Mastery, R::WordsMastered(1)),
    def("vocab-builder", "📖", "Vocabulary Builder", "Master 10 words", C::Mastery, R::WordsMastered(10)),
    def("word-wizard", "🧠", "Word Wizard", "Master 25 words", C::Mastery, R::WordsMastered(25)),
    def("vocab-scholar", "🎓", "Vocab Scholar", "Master 50 words", C::Mastery, R::WordsMastered(50)),
    def("word-architect", "🏛️", "Word Architect", "Master 100 words", C::Mastery, R::WordsMastered(100)),
    def("vocab-legend", "🏆", "Vocab Legend", "Master 250 words", C::Mastery, R::WordsMastered(250)),
    def("list-complete", "✅", "List Complete", "Master every word in a list", C::ListsComplete, R::ListsComplete(1)),
    def("list-crusher", "📋", "List Crusher", "Complete 3 lists", C::ListsComplete, R::ListsComplete(3)),
    def("list-legend", "📚", "List Legend", "Complete 5 lists", C::ListsComplete, R::ListsComplete(5)),
    def("collection-master", "🗂️", "Collection Master", "Complete 10 lists", C::ListsComplete, R::ListsComplete(10)),
    def("bookworm", "📚", "Bookworm", "Complete 10 learn sessions", C::Learning, R::LearnSessions(10)),
    def("avid-reader", "📖", "Avid Reader", "Complete 25 learn sessions", C::Learning, R::LearnSessions(25)),
    def("wise-owl", "🦉", "Wise Owl", "Complete 50 learn sessions", C::Learning, R::LearnSessions(50)),
    def("grand-learner", "🧙", "Grand Learner", "Complete 100 learn sessions", C::Learning, R::LearnSessions(100)),
    def("quiz-whiz", "🐝", "Quiz Whiz", "Complete 10 quizzes", C::Quizzing, R::QuizSessions(10)),
    def("quiz-pro", "🧪", "Quiz Pro", "Complete 25 quizzes", C::Quizzing, R::QuizSessions(25)),
    def("quiz-master", "🎮", "Quiz Master", "Complete 50 quizzes", C::Quizzing, R::QuizSessions(50)),
    def("quiz-legend", "🏆", "Quiz Legend", "Complete 100 quizzes", C::Quizzing, R::QuizSessions(100)),
    def("on-fire", "🔥", "On Fire!", "3 sessions in a row with 80%+", C::Streaks, R::HighScoreStreak(3)),
    def("unstoppable", "💥", "Unstoppable", "5 sessions in a row with 80%+", C::Streaks, R::HighScoreStreak(5)),
    def("blazing", "☄️", "Blazing", "10 sessions in a row with 80%+", C::Streaks, R::HighScoreStreak(10)),
    def("inferno", "🌋", "Inferno", "25 sessions in a row with 80%+", C::Streaks, R::HighScoreStreak(25)),
    def("regular", "📅", "Regular", "Practice on 5 different days", C::PracticeDays, R::PracticeDays(5)),
    def("week-warrior", "🗓️", "Week Warrior", "Practice on 7 different days", C::PracticeDays, R::PracticeDays(7)),
    def("monthly", "📆", "Monthly", "Practice on 30 different days", C::PracticeDays, R::PracticeDays(30)),
    def("semester-star", "🎗️", "Semester Star", "Practice on 90 different days", C::PracticeDays, R::PracticeDays(90)),
    def("year-round", "🏅", "Year-Round", "Practice on 180 different days", C::PracticeDays, R::PracticeDays(180)),
    def("perfect-score", "💯", "Perfect Score", "Get 100% on any session", C::Accuracy, R::PerfectSessions(1)),
    def("perfectionist", "✨", "Perfectionist", "Get 100% on 5 sessions", C::Accuracy, R::PerfectSessions(5)),
    def("flawless", "🌠", "Flawless", "Get 100% on 10 sessions", C::Accuracy, R::PerfectSessions(10)),
    def("untouchable", "💫", "Untouchable", "Get 100% on 25 sessions", C::Accuracy, R::PerfectSessions(25)),
    def("quiz-champion", "🏆", "Quiz Champion", "Get 100% on a quiz", C::Special, R::PerfectQuiz),
    def("comeback-kid", "💪", "Comeback Kid", "Get 100% after a session below 50%", C::Special, R::Comeback),
    def("no-training-wheels", "🛞", "No Training Wheels", "Complete 5 sessions without highlight", C::Special, R::UnassistedSessions(5)),
    def("flying-solo", "🦅", "Flying Solo", "Complete 25 sessions without highlight", C::Special, R::UnassistedSessions(25)),
    def("unassisted", "🎖️", "Unassisted", "Complete 50 sessions without highlight", C::Special, R::UnassistedSessions(50)),
    def("true-speller", "👁️", "True Speller", "Complete 100 sessions without highlight", C::Special, R::UnassistedSessions(100)),
];

/// Everything the rules look at, reduced once from the session history.
#[derive(Debug, Default)]
struct Tally {
    sessions: usize,
    words_correct: usize,
    words_mastered: usize,
    lists_complete: usize,
    learn_sessions: usize,
    quiz_sessions: usize,
    best_streak: usize,
    practice_days: usize,
    perfect_sessions: usize,
    perfect_quiz: bool,
    comeback: bool,
    unassisted_sessions: usize,
}

impl Tally {
    fn satisfies(&self, rule: Rule) -> bool {
        match rule {
            Rule::Sessions(n) => self.sessions >= n,
            Rule::WordsCorrect(n) => self.words_correct >= n,
            Rule::WordsMastered(n) => self.words_mastered >= n,
            Rule::ListsComplete(n) => self.lists_complete >= n,
            Rule::LearnSessions(n) => self.learn_sessions >= n,
            Rule::QuizSessions(n) => self.quiz_sessions >= n,
            Rule::HighScoreStreak(n) => self.best_streak >= n,
            Rule::PracticeDays(n) => self.practice_days >= n,
            Rule::PerfectSessions(n) => self.perfect_sessions >= n,
            Rule::PerfectQuiz => self.perfect_quiz,
            Rule::Comeback => self.comeback,
            Rule::UnassistedSessions(n) => self.unassisted_sessions >= n,
        }
    }
}

fn tally(
    sessions: &[SessionRecord],
    lists: &[WordList],
    progress: &ProgressMap,
    levels: HeatmapLevels,
    user_id: Option<&str>,
) -> Tally {
    let mut chronological: Vec<&SessionRecord> = sessions.iter().collect();
    chronological.sort_by_key(|s| s.date);

    let mut t = Tally {
        sessions: sessions.len(),
        ..Tally::default()
    };

    let mut streak = 0usize;
    let mut had_low_score = false;
    let mut days = HashSet::new();
    for s in &chronological {
        t.words_correct += s.results.iter().filter(|r| r.correct).count();
        match s.mode {
            SessionMode::Learn => t.learn_sessions += 1,
            SessionMode::Quiz => t.quiz_sessions += 1,
            _ => {}
        }
        if s.score >= STREAK_MIN_SCORE {
            streak += 1;
            t.best_streak = t.best_streak.max(streak);
        } else {
            streak = 0;
        }
        if s.score < COMEBACK_LOW_SCORE {
            had_low_score = true;
        }
        if s.score == PERFECT_SCORE {
            t.perfect_sessions += 1;
            t.comeback |= had_low_score;
            t.perfect_quiz |= s.mode == SessionMode::Quiz;
        }
        if !s.highlight_on.unwrap_or(false) {
            t.unassisted_sessions += 1;
        }
        days.insert(s.date.date_naive());
    }
    t.practice_days = days.len();

    for list in lists {
        let mastered = list
            .words
            .iter()
            .filter(|w| {
                progress
                    .get(user_id, &list.id, &w.word)
                    .is_some_and(|p| p.is_mastered(levels))
            })
            .count();
        t.words_mastered += mastered;
        if !list.words.is_empty() && mastered == list.words.len() {
            t.lists_complete += 1;
        }
    }

    t
}

/// Ids of every achievement the history earns. Sessions are expected to
/// be pre-filtered to the learner.
pub fn compute_earned_ids(
    sessions: &[SessionRecord],
    lists: &[WordList],
    progress: &ProgressMap,
    levels: HeatmapLevels,
    user_id: Option<&str>,
) -> BTreeSet<&'static str> {
    let t = tally(sessions, lists, progress, levels, user_id);
    ACHIEVEMENTS
        .iter()
        .filter(|a| t.satisfies(a.rule))
        .map(|a| a.id)
        .collect()
}

/// Achievements in `after` but not `before`, in table order.
pub fn newly_earned(
    before: &BTreeSet<&'static str>,
    after: &BTreeSet<&'static str>,
) -> Vec<&'static AchievementDef> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| after.contains(a.id) && !before.contains(a.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::{WordProgress, update_progress_at};
    use crate::session::result::SessionWordResult;
    use chrono::{Duration, TimeZone, Utc};

    fn record(day: i64, mode: SessionMode, score: u32, highlight: Option<bool>) -> SessionRecord {
        let base = Utc.with_ymd_and_hms(2025, 1, 10, 16, 0, 0).unwrap();
        SessionRecord {
            id: format!("s{day}-{score}"),
            date: base + Duration::days(day),
            list_id: "l1".to_string(),
            list_name: "Week 1".to_string(),
            mode,
            results: vec![SessionWordResult {
                word: "cat".to_string(),
                typed: "cat".to_string(),
                correct: score > 0,
            }],
            score,
            user_id: None,
            highlight_on: highlight,
        }
    }

    fn earned(sessions: &[SessionRecord]) -> BTreeSet<&'static str> {
        compute_earned_ids(sessions, &[], &ProgressMap::default(), HeatmapLevels::default(), None)
    }

    #[test]
    fn test_table_ids_unique_and_categories_known() {
        let ids: HashSet<&str> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
        assert_eq!(ACHIEVEMENTS.len(), 50);
        for cat in Category::ALL {
            assert!(ACHIEVEMENTS.iter().any(|a| a.category == cat), "{}", cat.id());
        }
    }

    #[test]
    fn test_single_session_earns_first_steps_only_tier() {
        let ids = earned(&[record(0, SessionMode::Practice, 60, Some(true))]);
        assert!(ids.contains("first-steps"));
        assert!(!ids.contains("high-five"));
        assert!(!ids.contains("perfect-score"));
    }

    #[test]
    fn test_empty_history_earns_nothing() {
        assert!(earned(&[]).is_empty());
    }

    #[test]
    fn test_streak_uses_chronological_order() {
        // out of order on input; sorted it reads 90, 85, 40, 95, 100
        let sessions = vec![
            record(3, SessionMode::Learn, 95, None),
            record(0, SessionMode::Learn, 90, None),
            record(2, SessionMode::Learn, 40, None),
            record(1, SessionMode::Learn, 85, None),
            record(4, SessionMode::Learn, 100, None),
        ];
        let ids = earned(&sessions);
        assert!(!ids.contains("on-fire"));
        assert!(ids.contains("comeback-kid"));
        assert!(ids.contains("high-five"));
        assert!(ids.contains("regular"));
        assert!(ids.contains("no-training-wheels"));
    }

    #[test]
    fn test_perfect_quiz_and_highlight_counts() {
        let mut sessions = vec![record(0, SessionMode::Quiz, 100, None)];
        for day in 1..5 {
            sessions.push(record(day, SessionMode::Practice, 70, Some(true)));
        }
        let ids = earned(&sessions);
        assert!(ids.contains("quiz-champion"));
        assert!(ids.contains("perfect-score"));
        assert!(!ids.contains("comeback-kid"));
        assert!(!ids.contains("no-training-wheels"));
    }

    #[test]
    fn test_same_day_sessions_count_once() {
        let base = record(0, SessionMode::Learn, 50, None);
        let sessions: Vec<SessionRecord> = (0..6)
            .map(|i| SessionRecord {
                date: base.date + Duration::minutes(i),
                ..base.clone()
            })
            .collect();
        let ids = earned(&sessions);
        assert!(ids.contains("high-five"));
        assert!(!ids.contains("regular"));
    }

    #[test]
    fn test_mastery_reads_user_then_legacy_progress() {
        let list = WordList::new("l1", "Week 1", &["cat".to_string(), "dog".to_string()], 0);
        let levels = HeatmapLevels::new(3);
        let mastered = |word: &str| {
            let p = update_progress_at(&WordProgress::new(word, "l1"), true, 1);
            update_progress_at(&p, true, 2)
        };
        let mut progress = ProgressMap::default();
        progress.record(Some("u1"), mastered("cat"));
        progress.record(None, mastered("dog"));

        let ids = compute_earned_ids(&[], std::slice::from_ref(&list), &progress, levels, Some("u1"));
        assert!(ids.contains("word-master"));
        assert!(ids.contains("list-complete"));

        let other = compute_earned_ids(&[], &[list], &progress, levels, Some("u2"));
        assert!(other.contains("word-master"));
        assert!(!other.contains("list-complete"));
    }

    #[test]
    fn test_newly_earned_is_set_difference() {
        let before = earned(&[record(0, SessionMode::Quiz, 60, None)]);
        let sessions: Vec<SessionRecord> =
            (0..5).map(|d| record(d, SessionMode::Quiz, 60, None)).collect();
        let after = earned(&sessions);
        let new: Vec<&str> = newly_earned(&before, &after).iter().map(|a| a.id).collect();
        assert_eq!(new, vec!["high-five", "regular", "no-training-wheels"]);
    }
}
