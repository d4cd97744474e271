use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::progress::WordProgress;
use crate::words::WordList;

/// Storage keys for one word's progress: the key to read first and the
/// pre-multi-user key to fall back to. Without a user both are the same.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressKey {
    pub primary: String,
    pub legacy: String,
}

pub fn resolve_progress_key(user_id: Option<&str>, list_id: &str, word: &str) -> ProgressKey {
    let legacy = format!("{list_id}:{word}");
    let primary = match user_id {
        Some(user) => format!("{user}:{list_id}:{word}"),
        None => legacy.clone(),
    };
    ProgressKey { primary, legacy }
}

/// All persisted word progress, keyed by [`resolve_progress_key`] strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap {
    entries: HashMap<String, WordProgress>,
}

impl ProgressMap {
    pub fn get(&self, user_id: Option<&str>, list_id: &str, word: &str) -> Option<&WordProgress> {
        let key = resolve_progress_key(user_id, list_id, word);
        self.entries
            .get(&key.primary)
            .or_else(|| self.entries.get(&key.legacy))
    }

    /// Current progress for a word, or a fresh record when none exists.
    pub fn lookup(&self, user_id: Option<&str>, list_id: &str, word: &str) -> WordProgress {
        self.get(user_id, list_id, word)
            .cloned()
            .unwrap_or_else(|| WordProgress::new(word, list_id))
    }

    /// Store a record under the user-scoped key, or the legacy key without a user.
    pub fn record(&mut self, user_id: Option<&str>, progress: WordProgress) {
        let key = resolve_progress_key(user_id, &progress.list_id, &progress.word);
        self.entries.insert(key.primary, progress);
    }

    pub fn remove_list(&mut self, list_id: &str) {
        self.entries.retain(|_, p| p.list_id != list_id);
    }

    pub fn remove_user(&mut self, user_id: &str) {
        let prefix = format!("{user_id}:");
        self.entries.retain(|key, _| !key.starts_with(&prefix));
    }

    /// Drop a user's records together with the legacy records of every
    /// listed word, since those were read as the user's before migration.
    pub fn clear_user(&mut self, user_id: &str, lists: &[WordList]) {
        self.remove_user(user_id);
        for list in lists {
            for entry in &list.words {
                let key = resolve_progress_key(None, &list.id, &entry.word);
                self.entries.remove(&key.legacy);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &WordProgress> {
        self.entries.values()
    }
}
