use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::heatmap::HeatmapLevels;
use crate::engine::progress::WordProgress;
use crate::engine::progress_map::ProgressMap;
use crate::engine::selector::SelectionMode;
use crate::session::activity::ActivitySession;
use crate::session::policy::Activity;
use crate::words::WordList;

const SCHEMA_VERSION: u32 = 1;
const DEFAULT_WORD_COUNT: u32 = 5;

/// How many words a session draws from a list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWordCount", into = "RawWordCount")]
pub enum WordCountOption {
    Count(u32),
    All,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawWordCount {
    Count(u32),
    Keyword(String),
}

impl TryFrom<RawWordCount> for WordCountOption {
    type Error = String;

    fn try_from(raw: RawWordCount) -> Result<Self, Self::Error> {
        match raw {
            RawWordCount::Count(n) => Ok(WordCountOption::Count(n)),
            RawWordCount::Keyword(k) if k == "all" => Ok(WordCountOption::All),
            RawWordCount::Keyword(k) => Err(format!("invalid word count: {k:?}")),
        }
    }
}

impl From<WordCountOption> for RawWordCount {
    fn from(option: WordCountOption) -> Self {
        match option {
            WordCountOption::Count(n) => RawWordCount::Count(n),
            WordCountOption::All => RawWordCount::Keyword("all".to_string()),
        }
    }
}

impl Default for WordCountOption {
    fn default() -> Self {
        WordCountOption::Count(DEFAULT_WORD_COUNT)
    }
}

impl fmt::Display for WordCountOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordCountOption::Count(n) => write!(f, "{n}"),
            WordCountOption::All => f.write_str("all"),
        }
    }
}

impl WordCountOption {
    pub fn resolve(self, list_len: usize) -> usize {
        match self {
            WordCountOption::Count(n) => (n as usize).min(list_len),
            WordCountOption::All => list_len,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub learn_word_count: WordCountOption,
    #[serde(default)]
    pub quiz_word_count: WordCountOption,
    #[serde(default)]
    pub heatmap_levels: HeatmapLevels,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            learn_word_count: WordCountOption::default(),
            quiz_word_count: WordCountOption::default(),
            heatmap_levels: HeatmapLevels::default(),
            extra: Map::new(),
        }
    }
}

/// Per-activity live letter feedback switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightModes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_letters: Option<bool>,
}

impl HighlightModes {
    fn slot(&mut self, activity: Activity) -> &mut Option<bool> {
        match activity {
            Activity::Learn => &mut self.learn,
            Activity::Practice => &mut self.practice,
            Activity::Quiz => &mut self.quiz,
            Activity::MissingLetters => &mut self.missing_letters,
        }
    }

    pub fn is_on(&self, activity: Activity) -> bool {
        let value = match activity {
            Activity::Learn => self.learn,
            Activity::Practice => self.practice,
            Activity::Quiz => self.quiz,
            Activity::MissingLetters => self.missing_letters,
        };
        value.unwrap_or(false)
    }

    pub fn toggle(&mut self, activity: Activity) -> bool {
        let slot = self.slot(activity);
        let next = !slot.unwrap_or(false);
        *slot = Some(next);
        next
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deprioritized_lists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learn_word_count: Option<WordCountOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_word_count: Option<WordCountOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_word_count: Option<WordCountOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_letters_word_count: Option<WordCountOption>,
    #[serde(default)]
    pub highlight_modes: HighlightModes,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// The user's own count for an activity. Practice and Missing Letters
    /// reuse the learn count when unset.
    pub fn word_count_override(&self, activity: Activity) -> Option<WordCountOption> {
        match activity {
            Activity::Learn => self.learn_word_count,
            Activity::Quiz => self.quiz_word_count,
            Activity::Practice => self.practice_word_count.or(self.learn_word_count),
            Activity::MissingLetters => {
                self.missing_letters_word_count.or(self.learn_word_count)
            }
        }
    }
}

/// Household state as stored by the gateway (`data.json` / `/api/state`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub word_lists: Vec<WordList>,
    #[serde(default)]
    pub progress: ProgressMap,
    #[serde(default)]
    pub active_list_id: Option<String>,
    #[serde(default)]
    pub settings: AppSettings,
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub current_user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppState {
    pub fn list(&self, list_id: &str) -> Option<&WordList> {
        self.word_lists.iter().find(|l| l.id == list_id)
    }

    pub fn user(&self, user_id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut UserProfile> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    pub fn add_list(&mut self, list: WordList) {
        self.word_lists.push(list);
    }

    /// Replace the list with the same id. Returns false when none matched.
    pub fn update_list(&mut self, list: WordList) -> bool {
        match self.word_lists.iter_mut().find(|l| l.id == list.id) {
            Some(slot) => {
                *slot = list;
                true
            }
            None => false,
        }
    }

    pub fn delete_list(&mut self, list_id: &str) {
        self.word_lists.retain(|l| l.id != list_id);
        if self.active_list_id.as_deref() == Some(list_id) {
            self.active_list_id = None;
        }
        self.progress.remove_list(list_id);
    }

    pub fn set_active_list(&mut self, list_id: Option<String>) {
        self.active_list_id = list_id;
    }

    pub fn record_progress(&mut self, user_id: Option<&str>, progress: WordProgress) {
        self.progress.record(user_id, progress);
    }

    pub fn add_user(&mut self, user: UserProfile) {
        self.users.push(user);
    }

    pub fn delete_user(&mut self, user_id: &str) {
        self.users.retain(|u| u.id != user_id);
        if self.current_user_id.as_deref() == Some(user_id) {
            self.current_user_id = None;
        }
        self.progress.remove_user(user_id);
    }

    pub fn set_current_user(&mut self, user_id: Option<String>) {
        self.current_user_id = user_id;
    }

    pub fn clear_user_progress(&mut self, user_id: &str) {
        self.progress.clear_user(user_id, &self.word_lists);
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut AppSettings)) {
        update(&mut self.settings);
    }

    /// Word count for an activity: user override, then household settings.
    /// Practice and Missing Letters have no household setting and use
    /// `fallback` instead.
    pub fn word_count(
        &self,
        user_id: Option<&str>,
        activity: Activity,
        fallback: WordCountOption,
    ) -> WordCountOption {
        let user_override = user_id
            .and_then(|id| self.user(id))
            .and_then(|u| u.word_count_override(activity));
        user_override.unwrap_or(match activity {
            Activity::Learn => self.settings.learn_word_count,
            Activity::Quiz => self.settings.quiz_word_count,
            Activity::Practice | Activity::MissingLetters => fallback,
        })
    }

    pub fn highlight_on(&self, user_id: Option<&str>, activity: Activity) -> bool {
        user_id
            .and_then(|id| self.user(id))
            .is_some_and(|u| u.highlight_modes.is_on(activity))
    }
}

/// In-progress activity run, persisted so a run survives a restart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActiveSessionData {
    pub schema_version: u32,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub selection: SelectionMode,
    pub session: Option<ActivitySession>,
}

impl Default for ActiveSessionData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            user_id: None,
            selection: SelectionMode::default(),
            session: None,
        }
    }
}

impl ActiveSessionData {
    pub fn new(user_id: Option<&str>, selection: SelectionMode, session: ActivitySession) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            user_id: user_id.map(str::to_string),
            selection,
            session: Some(session),
        }
    }

    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
