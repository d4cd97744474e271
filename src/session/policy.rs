use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Learn,
    Practice,
    Quiz,
    MissingLetters,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::Learn,
        Activity::Practice,
        Activity::Quiz,
        Activity::MissingLetters,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Activity::Learn => "Learn",
            Activity::Practice => "Practice",
            Activity::Quiz => "Quiz",
            Activity::MissingLetters => "Missing Letters",
        }
    }

    pub fn policy(self) -> ActivityPolicy {
        match self {
            Activity::Learn => ActivityPolicy {
                intro: Some(Phase::Study),
                pause_after_submit: true,
                allow_retry: true,
                advance_on_wrong: false,
                records_wrong_attempts: true,
                uses_blanks: false,
            },
            Activity::Practice => ActivityPolicy {
                intro: None,
                pause_after_submit: false,
                allow_retry: false,
                advance_on_wrong: false,
                records_wrong_attempts: false,
                uses_blanks: false,
            },
            Activity::Quiz => ActivityPolicy {
                intro: Some(Phase::Prompt),
                pause_after_submit: true,
                allow_retry: false,
                advance_on_wrong: true,
                records_wrong_attempts: true,
                uses_blanks: false,
            },
            Activity::MissingLetters => ActivityPolicy {
                intro: None,
                pause_after_submit: false,
                allow_retry: false,
                advance_on_wrong: false,
                records_wrong_attempts: false,
                uses_blanks: true,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Word shown with its details before the learner types it.
    Study,
    /// Word read out; the learner starts spelling when ready.
    Prompt,
    #[default]
    Typing,
    /// Answer checked, waiting for retry or next.
    Feedback,
    Done,
}

/// Transition differences between the four activities. Everything else
/// (letter entry, result handling) is shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActivityPolicy {
    /// Phase each word opens in; `None` goes straight to typing.
    pub intro: Option<Phase>,
    /// Stop in `Feedback` after each submission instead of moving on directly.
    pub pause_after_submit: bool,
    /// A wrong answer may be retried from `Feedback`.
    pub allow_retry: bool,
    /// A wrong answer still moves on to the next word.
    pub advance_on_wrong: bool,
    /// Wrong submissions become session results.
    pub records_wrong_attempts: bool,
    /// Only some letter positions are typed; the rest are given.
    pub uses_blanks: bool,
}

impl ActivityPolicy {
    pub fn opening_phase(&self) -> Phase {
        self.intro.unwrap_or(Phase::Typing)
    }
}
