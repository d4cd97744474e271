use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::engine::progress::WordProgress;
use crate::words::WordEntry;

/// Which words a new session should be built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    /// Untested words first, then previously practiced ones.
    #[default]
    Fresh,
    /// Every currently failing word, topped up to the requested count.
    Missed,
    /// Words with the most lifetime misses.
    MostMissed,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::Fresh => "fresh",
            SelectionMode::Missed => "missed",
            SelectionMode::MostMissed => "most-missed",
        }
    }
}

/// Untested words (shuffled) before practiced words (shuffled), truncated to `count`.
pub fn select_words_for_session<R: Rng + ?Sized>(
    progress: &[WordProgress],
    count: usize,
    rng: &mut R,
) -> Vec<WordProgress> {
    let (mut untested, mut practiced): (Vec<WordProgress>, Vec<WordProgress>) =
        progress.iter().cloned().partition(WordProgress::is_untested);
    untested.shuffle(rng);
    practiced.shuffle(rng);

    untested.extend(practiced);
    untested.truncate(count);
    untested
}

/// All currently missed words, never trimmed; backfilled up to `min_count`.
pub fn select_missed_words<R: Rng + ?Sized>(
    progress: &[WordProgress],
    min_count: usize,
    rng: &mut R,
) -> Vec<WordProgress> {
    let mut selected: Vec<WordProgress> = progress
        .iter()
        .filter(|p| p.is_currently_missed())
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.incorrect_count.cmp(&a.incorrect_count));

    backfill(&mut selected, progress, min_count, rng);
    selected
}

/// Ever-missed words by descending miss count, truncated to `count` and backfilled.
pub fn select_most_missed_words<R: Rng + ?Sized>(
    progress: &[WordProgress],
    count: usize,
    rng: &mut R,
) -> Vec<WordProgress> {
    let mut selected: Vec<WordProgress> = progress
        .iter()
        .filter(|p| p.incorrect_count > 0)
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.incorrect_count.cmp(&a.incorrect_count));
    selected.truncate(count);

    backfill(&mut selected, progress, count, rng);
    selected
}

fn backfill<R: Rng + ?Sized>(
    selected: &mut Vec<WordProgress>,
    progress: &[WordProgress],
    target: usize,
    rng: &mut R,
) {
    if selected.len() >= target {
        return;
    }
    let used: HashSet<&str> = selected.iter().map(|p| p.word.as_str()).collect();
    let remaining: Vec<WordProgress> = progress
        .iter()
        .filter(|p| !used.contains(p.word.as_str()))
        .cloned()
        .collect();
    let needed = target - selected.len();
    selected.extend(select_words_for_session(&remaining, needed, rng));
}

/// Pick the words for a session out of a list and shuffle them for play.
///
/// `lookup` returns the current progress for a word (falling back to a fresh
/// record); selection order is priority based, play order is random.
pub fn select_session_words<R, F>(
    words: &[WordEntry],
    lookup: F,
    mode: SelectionMode,
    count: usize,
    rng: &mut R,
) -> Vec<WordEntry>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> WordProgress,
{
    let progress: Vec<WordProgress> = words.iter().map(|w| lookup(&w.word)).collect();
    let selected = match mode {
        SelectionMode::Fresh => select_words_for_session(&progress, count, rng),
        SelectionMode::Missed => select_missed_words(&progress, count, rng),
        SelectionMode::MostMissed => select_most_missed_words(&progress, count, rng),
    };

    let mut entries: Vec<WordEntry> = selected
        .iter()
        .filter_map(|p| words.iter().find(|w| w.word == p.word).cloned())
        .collect();
    entries.shuffle(rng);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::update_progress_at;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn with_answers(word: &str, answers: &[bool]) -> WordProgress {
        answers
            .iter()
            .fold(WordProgress::new(word, "l"), |p, &c| update_progress_at(&p, c, 1_000))
    }

    fn words_of(selected: &[WordProgress]) -> Vec<&str> {
        selected.iter().map(|p| p.word.as_str()).collect()
    }

    #[test]
    fn test_untested_words_come_before_practiced() {
        let progress = vec![
            with_answers("a", &[true]),
            WordProgress::new("b", "l"),
            with_answers("c", &[false]),
            WordProgress::new("d", "l"),
            with_answers("e", &[true, true]),
            WordProgress::new("f", "l"),
        ];
        for seed in 0..20 {
            let mut r = SmallRng::seed_from_u64(seed);
            let selected = select_words_for_session(&progress, progress.len(), &mut r);
            assert_eq!(selected.len(), 6);
            let first_practiced = selected.iter().position(|p| !p.is_untested()).unwrap();
            assert_eq!(first_practiced, 3);
            assert!(selected[3..].iter().all(|p| !p.is_untested()));
        }
    }

    #[test]
    fn test_count_truncates_and_zero_is_empty() {
        let progress: Vec<WordProgress> =
            ["a", "b", "c"].iter().map(|w| WordProgress::new(*w, "l")).collect();
        assert_eq!(select_words_for_session(&progress, 2, &mut rng()).len(), 2);
        assert!(select_words_for_session(&progress, 0, &mut rng()).is_empty());
        assert!(select_words_for_session(&[], 5, &mut rng()).is_empty());
    }

    #[test]
    fn test_missed_selection_includes_all_missed_beyond_count() {
        let progress = vec![
            with_answers("a", &[false]),
            with_answers("b", &[false, false]),
            with_answers("c", &[true, false]),
            with_answers("d", &[false, true]),
            WordProgress::new("e", "l"),
        ];
        let selected = select_missed_words(&progress, 1, &mut rng());
        let mut words = words_of(&selected);
        words.sort();
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missed_selection_backfills_without_duplicates() {
        let progress = vec![
            with_answers("a", &[false]),
            WordProgress::new("b", "l"),
            with_answers("c", &[true]),
            WordProgress::new("d", "l"),
        ];
        let selected = select_missed_words(&progress, 3, &mut rng());
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].word, "a");
        // backfill prefers untested words
        let mut backfill = words_of(&selected[1..]);
        backfill.sort();
        assert_eq!(backfill, vec!["b", "d"]);
    }

    #[test]
    fn test_most_missed_orders_by_incorrect_count_and_truncates() {
        let progress = vec![
            with_answers("a", &[false]),
            with_answers("b", &[false, false, false, true]),
            with_answers("c", &[false, false]),
            WordProgress::new("d", "l"),
        ];
        let selected = select_most_missed_words(&progress, 2, &mut rng());
        assert_eq!(words_of(&selected), vec!["b", "c"]);
    }

    #[test]
    fn test_most_missed_backfills_when_short() {
        let progress = vec![
            with_answers("a", &[false, true, true]),
            WordProgress::new("b", "l"),
            with_answers("c", &[true]),
        ];
        let selected = select_most_missed_words(&progress, 3, &mut rng());
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].word, "a");
        assert_eq!(selected[1].word, "b");
        assert_eq!(selected[2].word, "c");
    }

    #[test]
    fn test_session_words_map_back_to_entries() {
        let words: Vec<WordEntry> = ["cat", "dog", "owl"].iter().map(|w| WordEntry::new(*w)).collect();
        let lookup = |w: &str| {
            if w == "dog" {
                with_answers(w, &[false])
            } else {
                WordProgress::new(w, "l")
            }
        };
        let selected = select_session_words(&words, lookup, SelectionMode::Missed, 0, &mut rng());
        assert_eq!(selected, vec![WordEntry::new("dog")]);

        let all = select_session_words(&words, lookup, SelectionMode::Fresh, 10, &mut rng());
        assert_eq!(all.len(), 3);
    }
}
