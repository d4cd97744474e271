use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordEntry {
    pub word: String,
    pub definition: String,
    pub part_of_speech: String,
    pub example: String,
    pub audio_url: Option<String>,
    pub phonetic: String,
}

impl WordEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Self::default()
        }
    }

    /// Number of letter slots a learner fills in to spell this word.
    pub fn letter_count(&self) -> usize {
        self.word.chars().count()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub words: Vec<WordEntry>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_practice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// Fields written by other clients that this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WordList {
    pub fn new(id: impl Into<String>, name: impl Into<String>, words: &[String], now_ms: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            words: words.iter().map(WordEntry::new).collect(),
            created_at: now_ms,
            updated_at: now_ms,
            ..Self::default()
        }
    }

    pub fn word_strings(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.word.as_str()).collect()
    }
}
