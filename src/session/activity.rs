use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::session::blanks::{compose_with_blanks, generate_blanks};
use crate::session::letters::LetterBuffer;
use crate::session::policy::{Activity, ActivityPolicy, Phase};
use crate::session::result::SessionWordResult;
use crate::words::WordEntry;

/// What a submission did, for the caller to turn into a progress update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub word: String,
    pub typed: String,
    pub correct: bool,
    /// Answer to apply to the word's progress, if any.
    pub record_progress: Option<bool>,
    /// The submission ended the session.
    pub finished: bool,
}

/// One Learn/Practice/Quiz/Missing-Letters run over a fixed word subset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySession {
    pub activity: Activity,
    pub list_id: String,
    pub phase: Phase,
    pub words: Vec<WordEntry>,
    pub current_index: usize,
    pub typed: LetterBuffer,
    pub results: Vec<SessionWordResult>,
    /// Hidden letter positions per word; empty unless the activity uses blanks.
    #[serde(default)]
    pub blank_sets: Vec<Vec<usize>>,
    /// Words answered wrong at least once in this run.
    #[serde(default)]
    pub missed: BTreeSet<String>,
    #[serde(default)]
    pub last_correct: Option<bool>,
}

impl ActivitySession {
    pub fn new<R: Rng + ?Sized>(
        activity: Activity,
        list_id: impl Into<String>,
        words: Vec<WordEntry>,
        rng: &mut R,
    ) -> Self {
        let policy = activity.policy();
        let blank_sets = if policy.uses_blanks {
            words.iter().map(|w| generate_blanks(&w.word, rng)).collect()
        } else {
            Vec::new()
        };
        let phase = if words.is_empty() {
            Phase::Done
        } else {
            policy.opening_phase()
        };
        Self {
            activity,
            list_id: list_id.into(),
            phase,
            words,
            current_index: 0,
            typed: LetterBuffer::new(),
            results: Vec::new(),
            blank_sets,
            missed: BTreeSet::new(),
            last_correct: None,
        }
    }

    /// Start over with a freshly selected word subset.
    pub fn restart<R: Rng + ?Sized>(&mut self, words: Vec<WordEntry>, rng: &mut R) {
        *self = Self::new(self.activity, self.list_id.clone(), words, rng);
    }

    pub fn policy(&self) -> ActivityPolicy {
        self.activity.policy()
    }

    pub fn current_word(&self) -> Option<&WordEntry> {
        if self.is_done() {
            return None;
        }
        self.words.get(self.current_index)
    }

    pub fn current_blanks(&self) -> &[usize] {
        self.blank_sets
            .get(self.current_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Number of letters the learner can type for the current word.
    pub fn capacity(&self) -> usize {
        if self.policy().uses_blanks {
            self.current_blanks().len()
        } else {
            self.current_word().map_or(0, WordEntry::letter_count)
        }
    }

    /// Leave the study/prompt screen and start typing.
    pub fn begin(&mut self) -> bool {
        if !matches!(self.phase, Phase::Study | Phase::Prompt) {
            return false;
        }
        self.phase = Phase::Typing;
        self.typed.clear();
        self.last_correct = None;
        true
    }

    pub fn type_letter(&mut self, ch: char) -> bool {
        if self.phase != Phase::Typing {
            return false;
        }
        let capacity = self.capacity();
        self.typed.type_letter(ch, capacity)
    }

    /// Pop the last slot. False when not typing or nothing is typed.
    pub fn delete_letter(&mut self) -> bool {
        if self.phase != Phase::Typing || self.typed.is_empty() {
            return false;
        }
        self.typed.delete_last();
        true
    }

    pub fn remove_letter(&mut self, index: usize) -> bool {
        if self.phase != Phase::Typing {
            return false;
        }
        self.typed.remove_at(index);
        true
    }

    /// Full attempt as it would be checked, given letters included.
    pub fn typed_word(&self) -> String {
        let Some(word) = self.current_word() else {
            return String::new();
        };
        if self.policy().uses_blanks {
            compose_with_blanks(&word.word, self.current_blanks(), &self.typed)
        } else {
            self.typed.text()
        }
    }

    /// Per typed slot, whether it matches the letter it stands for.
    /// Blank slots are `None`.
    pub fn letter_marks(&self) -> Vec<Option<bool>> {
        let Some(word) = self.current_word() else {
            return Vec::new();
        };
        let letters: Vec<char> = word.word.chars().collect();
        let blanks = self.current_blanks();
        let uses_blanks = self.policy().uses_blanks;
        self.typed
            .slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let position = if uses_blanks { blanks.get(i).copied() } else { Some(i) };
                let expected = position.and_then(|p| letters.get(p).copied());
                slot.map(|ch| Some(ch) == expected)
            })
            .collect()
    }

    /// Check the current attempt. `None` when not typing or nothing typed.
    /// A word with no blanks has nothing to type and checks as given.
    pub fn submit(&mut self) -> Option<SubmitOutcome> {
        if self.phase != Phase::Typing || (self.typed.text().is_empty() && self.capacity() > 0) {
            return None;
        }
        let word = self.current_word()?.word.clone();
        let typed = self.typed_word();
        let correct = typed == word;
        let policy = self.policy();

        let record_progress = match self.activity {
            // retries after a miss already counted against the word
            Activity::Learn if correct => (!self.missed.contains(&word)).then_some(true),
            _ => Some(correct),
        };

        if correct || policy.records_wrong_attempts {
            self.results
                .push(SessionWordResult::new(word.clone(), typed.clone(), correct));
        }
        if !correct {
            self.missed.insert(word.clone());
        }
        self.last_correct = Some(correct);

        if policy.pause_after_submit {
            self.phase = Phase::Feedback;
        } else if correct || policy.advance_on_wrong {
            self.advance();
        }

        log::debug!(
            "{} submit word={word} correct={correct} phase={:?}",
            self.activity.label(),
            self.phase
        );

        Some(SubmitOutcome {
            word,
            typed,
            correct,
            record_progress,
            finished: self.is_done(),
        })
    }

    /// Try the same word again after a wrong answer.
    pub fn retry(&mut self) -> bool {
        if self.phase != Phase::Feedback
            || !self.policy().allow_retry
            || self.last_correct != Some(false)
        {
            return false;
        }
        self.phase = Phase::Typing;
        self.typed.clear();
        self.last_correct = None;
        true
    }

    /// Move on from feedback. Activities with retry only move on after a
    /// correct answer.
    pub fn next(&mut self) -> bool {
        if self.phase != Phase::Feedback {
            return false;
        }
        let policy = self.policy();
        if self.last_correct == Some(false) && !policy.advance_on_wrong {
            return false;
        }
        self.advance();
        true
    }

    fn advance(&mut self) {
        self.current_index += 1;
        self.typed.clear();
        self.last_correct = None;
        self.phase = if self.current_index >= self.words.len() {
            Phase::Done
        } else {
            self.policy().opening_phase()
        };
    }
}
