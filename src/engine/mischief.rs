use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Playful misuse counters, kept per learner apart from session history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MischiefStats {
    pub peek_count: u32,
    pub wrong_count: u32,
    pub delete_presses: u32,
    pub highlight_sessions: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MischiefEvent {
    Peek,
    Wrong,
    Delete,
    HighlightSession,
}

impl MischiefStats {
    pub fn apply(&mut self, event: MischiefEvent) {
        let counter = match event {
            MischiefEvent::Peek => &mut self.peek_count,
            MischiefEvent::Wrong => &mut self.wrong_count,
            MischiefEvent::Delete => &mut self.delete_presses,
            MischiefEvent::HighlightSession => &mut self.highlight_sessions,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Per-user storage for [`MischiefStats`]. `None` is the no-user bucket.
pub trait MischiefStore {
    fn mischief(&self, user_id: Option<&str>) -> MischiefStats;
    fn set_mischief(&mut self, user_id: Option<&str>, stats: MischiefStats);
}

#[derive(Debug, Default)]
pub struct InMemoryMischiefStore {
    stats: HashMap<Option<String>, MischiefStats>,
}

impl MischiefStore for InMemoryMischiefStore {
    fn mischief(&self, user_id: Option<&str>) -> MischiefStats {
        self.stats
            .get(&user_id.map(str::to_string))
            .copied()
            .unwrap_or_default()
    }

    fn set_mischief(&mut self, user_id: Option<&str>, stats: MischiefStats) {
        self.stats.insert(user_id.map(str::to_string), stats);
    }
}

/// Read-modify-write one counter; returns the updated stats.
pub fn record_mischief<S: MischiefStore + ?Sized>(
    store: &mut S,
    user_id: Option<&str>,
    event: MischiefEvent,
) -> MischiefStats {
    let mut stats = store.mischief(user_id);
    stats.apply(event);
    store.set_mischief(user_id, stats);
    stats
}

#[derive(Clone, Copy, Debug)]
pub struct MischievementDef {
    pub id: &'static str,
    pub emoji: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    earned: fn(&MischiefStats) -> bool,
}

pub static MISCHIEVEMENTS: &[MischievementDef] = &[
    MischievementDef {
        id: "sneaky-peeker",
        emoji: "🫣",
        name: "Sneaky Peeker",
        description: "Use Peek 10 times",
        earned: |s| s.peek_count >= 10,
    },
    MischievementDef {
        id: "peek-a-boo-pro",
        emoji: "🙈",
        name: "Peek-a-Boo Pro",
        description: "Use Peek 50 times",
        earned: |s| s.peek_count >= 50,
    },
    MischievementDef {
        id: "oops",
        emoji: "😬",
        name: "Oops!",
        description: "Get 25 words wrong",
        earned: |s| s.wrong_count >= 25,
    },
    MischievementDef {
        id: "typo-king",
        emoji: "👑",
        name: "Typo Royalty",
        description: "Get 100 words wrong",
        earned: |s| s.wrong_count >= 100,
    },
    MischievementDef {
        id: "backspace-warrior",
        emoji: "⌫",
        name: "Backspace Warrior",
        description: "Press delete 100 times",
        earned: |s| s.delete_presses >= 100,
    },
    MischievementDef {
        id: "training-wheels",
        emoji: "🔦",
        name: "Training Wheels",
        description: "Complete 10 sessions with highlight on",
        earned: |s| s.highlight_sessions >= 10,
    },
    MischievementDef {
        id: "highlight-addict",
        emoji: "💡",
        name: "Highlight Addict",
        description: "Complete 50 sessions with highlight on",
        earned: |s| s.highlight_sessions >= 50,
    },
    MischievementDef {
        id: "fully-lit",
        emoji: "🌟",
        name: "Fully Lit",
        description: "Complete 100 sessions with highlight on",
        earned: |s| s.highlight_sessions >= 100,
    },
];

pub fn compute_earned_mischief_ids(stats: &MischiefStats) -> BTreeSet<&'static str> {
    MISCHIEVEMENTS
        .iter()
        .filter(|m| (m.earned)(stats))
        .map(|m| m.id)
        .collect()
}

pub fn newly_earned_mischief(
    before: &BTreeSet<&'static str>,
    after: &BTreeSet<&'static str>,
) -> Vec<&'static MischievementDef> {
    MISCHIEVEMENTS
        .iter()
        .filter(|m| after.contains(m.id) && !before.contains(m.id))
        .collect()
}
