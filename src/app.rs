use std::collections::BTreeSet;

use anyhow::{Result, bail};
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::engine::achievements::{AchievementDef, compute_earned_ids, newly_earned};
use crate::engine::heatmap::{HeatmapMode, ListProgress, summarize_list};
use crate::engine::mischief::{
    MischiefEvent, MischiefStore, MischievementDef, compute_earned_mischief_ids,
    newly_earned_mischief, record_mischief,
};
use crate::engine::progress::update_progress;
use crate::engine::report::{UserReport, build_user_report};
use crate::engine::selector::{SelectionMode, select_session_words};
use crate::ids::new_id;
use crate::session::activity::{ActivitySession, SubmitOutcome};
use crate::session::policy::{Activity, Phase};
use crate::session::result::{SessionFilter, SessionMeta, SessionRecord};
use crate::store::gateway::{AuthGrant, Gateway};
use crate::store::json_store::JsonStore;
use crate::store::schema::{ActiveSessionData, AppState, UserProfile, WordCountOption};
use crate::store::sync::StateSync;
use crate::words::{WordEntry, WordList, parse_word_list, starter::starter_lists};

const RECENT_SESSIONS: usize = 5;

/// A run in progress plus what is needed to finish it.
pub struct ActiveRun {
    pub session: ActivitySession,
    pub list_name: String,
    pub selection: SelectionMode,
    pub highlight_on: bool,
    user_id: Option<String>,
    mischief_before: BTreeSet<&'static str>,
}

/// What finishing a run produced.
#[derive(Debug)]
pub struct CompletionReport {
    pub record: SessionRecord,
    /// False when the gateway refused the record; no badges are reported then.
    pub saved: bool,
    pub achievements: Vec<&'static AchievementDef>,
    pub mischievements: Vec<&'static MischievementDef>,
}

#[derive(Clone, Debug)]
pub struct ListSummary {
    pub progress: ListProgress,
    /// Newest first.
    pub recent: Vec<SessionRecord>,
}

pub struct App {
    pub config: Config,
    pub state: AppState,
    gateway: Box<dyn Gateway>,
    local: JsonStore,
    sync: StateSync,
    rng: SmallRng,
    current_user: Option<String>,
    word_count_override: Option<usize>,
    active: Option<ActiveRun>,
}

impl App {
    /// Build an app over the gateway the config names: the sync server when
    /// a URL is set, otherwise JSON files in the data directory.
    pub fn new(config: Config) -> Result<Self> {
        let local = JsonStore::with_base_dir(config.data_path())?
            .with_admin_pin(config.admin_pin.clone());
        let gateway = Self::gateway_for(&config)?;
        Ok(Self::with_parts(
            config,
            gateway,
            local,
            SmallRng::from_entropy(),
        ))
    }

    #[cfg(feature = "network")]
    fn gateway_for(config: &Config) -> Result<Box<dyn Gateway>> {
        if let Some(url) = &config.server_url {
            log::info!("using sync server at {url}");
            return Ok(Box::new(crate::store::http::HttpGateway::new(url)?));
        }
        Self::file_gateway(config)
    }

    #[cfg(not(feature = "network"))]
    fn gateway_for(config: &Config) -> Result<Box<dyn Gateway>> {
        if config.server_url.is_some() {
            log::warn!("built without the network feature; ignoring server_url");
        }
        Self::file_gateway(config)
    }

    fn file_gateway(config: &Config) -> Result<Box<dyn Gateway>> {
        let store = JsonStore::with_base_dir(config.data_path())?
            .with_admin_pin(config.admin_pin.clone());
        Ok(Box::new(store))
    }

    pub fn with_parts(
        config: Config,
        gateway: Box<dyn Gateway>,
        local: JsonStore,
        rng: SmallRng,
    ) -> Self {
        Self {
            config,
            state: AppState::default(),
            gateway,
            local,
            sync: StateSync::new(),
            rng,
            current_user: None,
            word_count_override: None,
            active: None,
        }
    }

    pub fn set_word_count_override(&mut self, count: Option<usize>) {
        self.word_count_override = count.map(|n| n.max(1));
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn active(&self) -> Option<&ActiveRun> {
        self.active.as_ref()
    }

    pub fn is_hydrated(&self) -> bool {
        self.sync.is_hydrated()
    }

    // --- sync ---

    /// Initial load. Failures are logged and leave the app unhydrated, so
    /// nothing is pushed until a later poll succeeds.
    pub fn hydrate(&mut self) {
        match self.gateway.load_state() {
            Ok(remote) => self.adopt_initial(remote),
            Err(e) => log::warn!("failed to load state: {e}"),
        }
        if self.current_user.is_none() {
            self.current_user = self.state.current_user_id.clone();
        }
    }

    fn adopt_initial(&mut self, remote: Option<AppState>) {
        self.sync.mark_hydrated(remote.as_ref());
        match remote {
            Some(remote) if StateSync::should_adopt_initial(&remote) => {
                log::info!("loaded {} word lists", remote.word_lists.len());
                self.state = remote;
            }
            _ => self.seed_starter_lists(),
        }
    }

    fn seed_starter_lists(&mut self) {
        if !self.state.word_lists.is_empty() {
            return;
        }
        let lists = starter_lists(Utc::now().timestamp_millis());
        log::info!("seeding {} starter lists", lists.len());
        for list in lists {
            self.state.add_list(list);
        }
        let learn = WordCountOption::Count(self.config.learn_word_count as u32);
        let quiz = WordCountOption::Count(self.config.quiz_word_count as u32);
        let levels = self.config.levels();
        self.state.update_settings(|s| {
            s.learn_word_count = learn;
            s.quiz_word_count = quiz;
            s.heatmap_levels = levels;
        });
        self.persist_state();
    }

    /// Re-fetch remote state. Returns true when it replaced local state.
    pub fn poll_remote(&mut self) -> bool {
        let remote = match self.gateway.load_state() {
            Ok(remote) => remote,
            Err(e) => {
                log::debug!("poll failed: {e}");
                return false;
            }
        };
        if !self.sync.is_hydrated() {
            self.adopt_initial(remote);
            return true;
        }
        self.sync.observe_remote(remote.as_ref());
        match remote {
            Some(remote) if StateSync::remote_differs(&self.state, &remote) => {
                log::info!("remote state changed; adopting it");
                self.state = remote;
                true
            }
            _ => false,
        }
    }

    /// Push local state when the sync guard allows it.
    pub fn persist_state(&mut self) {
        if !self.sync.should_push(&self.state) {
            log::debug!("not pushing state (unhydrated or would drop remote lists)");
            return;
        }
        match self.gateway.save_state(&self.state) {
            Ok(()) => self.sync.pushed(&self.state),
            Err(e) => log::warn!("failed to save state: {e}"),
        }
    }

    // --- lists and users ---

    pub fn add_list(&mut self, name: &str, words_text: &str) -> Result<String> {
        let words = parse_word_list(words_text);
        if words.is_empty() {
            bail!("no valid words in {words_text:?}");
        }
        let id = new_id(&mut self.rng);
        let list = WordList::new(id.clone(), name, &words, Utc::now().timestamp_millis());
        self.state.add_list(list);
        self.persist_state();
        Ok(id)
    }

    /// Rename a list and/or replace its words. Words that stay keep their
    /// entry and progress.
    pub fn edit_list(
        &mut self,
        list_ref: &str,
        name: Option<&str>,
        words_text: Option<&str>,
    ) -> Result<()> {
        let mut list = self.resolve_list(Some(list_ref))?;
        if let Some(name) = name {
            list.name = name.to_string();
        }
        if let Some(text) = words_text {
            let words = parse_word_list(text);
            if words.is_empty() {
                bail!("no valid words in {text:?}");
            }
            let old = std::mem::take(&mut list.words);
            list.words = words
                .iter()
                .map(|w| {
                    old.iter()
                        .find(|e| &e.word == w)
                        .cloned()
                        .unwrap_or_else(|| WordEntry::new(w))
                })
                .collect();
        }
        list.updated_at = Utc::now().timestamp_millis();
        self.state.update_list(list);
        self.persist_state();
        Ok(())
    }

    /// Remove a list and its progress. The last list stays: a state without
    /// lists is never pushed over one that has them.
    pub fn delete_list(&mut self, list_ref: &str) -> Result<()> {
        let list = self.resolve_list(Some(list_ref))?;
        if self.state.word_lists.len() == 1 {
            bail!("{} is the only list left; add another before deleting it", list.name);
        }
        self.state.delete_list(&list.id);
        self.persist_state();
        Ok(())
    }

    /// A list by id or case-insensitive name; without one, the active list
    /// and then the first list.
    pub fn resolve_list(&self, list_ref: Option<&str>) -> Result<WordList> {
        let lists = &self.state.word_lists;
        let found = match list_ref {
            Some(r) => lists
                .iter()
                .find(|l| l.id == r)
                .or_else(|| lists.iter().find(|l| l.name.eq_ignore_ascii_case(r))),
            None => self
                .state
                .active_list_id
                .as_deref()
                .and_then(|id| self.state.list(id))
                .or_else(|| lists.first()),
        };
        match (found, list_ref) {
            (Some(list), _) => Ok(list.clone()),
            (None, Some(r)) => bail!("no word list named {r:?}"),
            (None, None) => bail!("no word lists yet; add one with `spellbee add-list`"),
        }
    }

    pub fn add_user(&mut self, name: &str, pin: Option<String>) -> String {
        let mut user = UserProfile::new(new_id(&mut self.rng), name);
        user.pin = pin.filter(|p| !p.is_empty());
        let id = user.id.clone();
        self.state.add_user(user);
        self.persist_state();
        id
    }

    pub fn delete_user(&mut self, user_ref: &str) -> Result<()> {
        let id = self.resolve_user(user_ref)?;
        self.state.delete_user(&id);
        if self.current_user.as_deref() == Some(id.as_str()) {
            self.current_user = None;
        }
        self.persist_state();
        Ok(())
    }

    pub fn resolve_user(&self, user_ref: &str) -> Result<String> {
        self.state
            .users
            .iter()
            .find(|u| u.id == user_ref)
            .or_else(|| {
                self.state
                    .users
                    .iter()
                    .find(|u| u.name.eq_ignore_ascii_case(user_ref))
            })
            .map(|u| u.id.clone())
            .ok_or_else(|| anyhow::anyhow!("no user named {user_ref:?}"))
    }

    /// Switch the learner on this device. `None` practices without a user.
    pub fn select_user(&mut self, user_ref: Option<&str>) -> Result<()> {
        let id = user_ref.map(|r| self.resolve_user(r)).transpose()?;
        self.current_user = id.clone();
        self.state.set_current_user(id);
        Ok(())
    }

    /// Flip the current learner's saved letter feedback for an activity.
    /// Returns the new setting.
    pub fn toggle_highlight(&mut self, activity: Activity) -> Result<bool> {
        let Some(id) = self.current_user.clone() else {
            bail!("choose a learner with --user to save highlight settings");
        };
        let Some(user) = self.state.user_mut(&id) else {
            bail!("no user with id {id:?}");
        };
        let on = user.highlight_modes.toggle(activity);
        self.persist_state();
        Ok(on)
    }

    pub fn clear_user_progress(&mut self, user_ref: &str) -> Result<()> {
        let id = self.resolve_user(user_ref)?;
        self.state.clear_user_progress(&id);
        self.persist_state();
        Ok(())
    }

    pub fn authenticate(&self, pin: &str) -> Result<AuthGrant> {
        Ok(self.gateway.authenticate(pin)?)
    }

    /// Gate for destructive operations. Without a PIN this only passes when
    /// no admin PIN is configured.
    pub fn require_access(&self, pin: Option<&str>, user_id: Option<&str>) -> Result<()> {
        let Some(pin) = pin else {
            if self.config.admin_pin.is_some() {
                bail!("this operation needs a PIN (--pin)");
            }
            return Ok(());
        };
        let grant = self.authenticate(pin)?;
        let allowed = match user_id {
            Some(user) => grant.allows_user(user),
            None => grant.is_admin,
        };
        if !allowed {
            bail!("PIN does not grant access to this operation");
        }
        Ok(())
    }

    pub fn clear_sessions(&mut self, user_ref: Option<&str>) -> Result<()> {
        let user_id = user_ref.map(|r| self.resolve_user(r)).transpose()?;
        self.gateway.clear_sessions(user_id.as_deref())?;
        Ok(())
    }

    // --- running an activity ---

    /// How many words a run of `activity` draws from a list of `list_len`.
    pub fn session_word_count(&self, activity: Activity, list_len: usize) -> usize {
        if let Some(n) = self.word_count_override {
            return n.min(list_len);
        }
        let fallback = match activity {
            Activity::Practice => self.config.practice_word_count,
            Activity::MissingLetters => self.config.missing_letters_word_count,
            Activity::Learn => self.config.learn_word_count,
            Activity::Quiz => self.config.quiz_word_count,
        };
        self.state
            .word_count(
                self.current_user.as_deref(),
                activity,
                WordCountOption::Count(fallback as u32),
            )
            .resolve(list_len)
    }

    fn select_words(&mut self, list: &WordList, selection: SelectionMode, count: usize) -> Vec<WordEntry> {
        let progress = &self.state.progress;
        let user = self.current_user.as_deref();
        select_session_words(
            &list.words,
            |w| progress.lookup(user, &list.id, w),
            selection,
            count,
            &mut self.rng,
        )
    }

    /// Open a run, resuming the saved one when it belongs to the same
    /// activity, list and user.
    pub fn start_activity(
        &mut self,
        activity: Activity,
        list_ref: Option<&str>,
        selection: SelectionMode,
        force_highlight: bool,
    ) -> Result<&ActiveRun> {
        let list = self.resolve_list(list_ref)?;
        let user = self.current_user.clone();

        let resumed = self.local.load_active_session().and_then(|data| {
            let session = data.session?;
            let resumable = session.activity == activity
                && session.list_id == list.id
                && data.user_id == user
                && !session.is_done()
                && !session.words.is_empty();
            resumable.then_some((session, data.selection))
        });

        let (session, selection) = match resumed {
            Some((session, saved_selection)) => {
                log::info!(
                    "resuming {} on {} at word {}",
                    activity.label(),
                    list.name,
                    session.current_index + 1
                );
                (session, saved_selection)
            }
            None => {
                let count = self.session_word_count(activity, list.words.len());
                let words = self.select_words(&list, selection, count);
                log::info!(
                    "starting {} on {} with {} words ({})",
                    activity.label(),
                    list.name,
                    words.len(),
                    selection.as_str()
                );
                (
                    ActivitySession::new(activity, list.id.clone(), words, &mut self.rng),
                    selection,
                )
            }
        };

        if self.state.active_list_id.as_deref() != Some(list.id.as_str()) {
            self.state.set_active_list(Some(list.id.clone()));
            self.persist_state();
        }

        let highlight_on = force_highlight || self.state.highlight_on(user.as_deref(), activity);
        let mischief_before = compute_earned_mischief_ids(&self.local.mischief(user.as_deref()));
        self.active = Some(ActiveRun {
            session,
            list_name: list.name,
            selection,
            highlight_on,
            user_id: user,
            mischief_before,
        });
        self.save_snapshot();
        self.active
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("run was not started"))
    }

    /// Throw the current run away and draw a new word subset.
    pub fn restart_activity(&mut self) -> Result<()> {
        let Some(run) = &self.active else {
            bail!("no activity in progress");
        };
        let (activity, selection) = (run.session.activity, run.selection);
        let list = self.resolve_list(Some(&run.session.list_id))?;
        let count = self.session_word_count(activity, list.words.len());
        let words = self.select_words(&list, selection, count);
        if let Some(run) = self.active.as_mut() {
            run.session.restart(words, &mut self.rng);
        }
        self.save_snapshot();
        Ok(())
    }

    fn save_snapshot(&self) {
        let Some(run) = &self.active else {
            return;
        };
        let result = if run.session.is_done() {
            self.local.clear_active_session()
        } else {
            self.local.save_active_session(&ActiveSessionData::new(
                run.user_id.as_deref(),
                run.selection,
                run.session.clone(),
            ))
        };
        if let Err(e) = result {
            log::warn!("failed to save in-progress session: {e}");
        }
    }

    fn mutate_session(&mut self, f: impl FnOnce(&mut ActivitySession) -> bool) -> bool {
        let Some(run) = self.active.as_mut() else {
            return false;
        };
        let changed = f(&mut run.session);
        if changed {
            self.save_snapshot();
        }
        changed
    }

    fn note_mischief(&mut self, event: MischiefEvent) {
        let user = self.active.as_ref().and_then(|r| r.user_id.clone());
        record_mischief(&mut self.local, user.as_deref(), event);
    }

    pub fn begin(&mut self) -> bool {
        self.mutate_session(ActivitySession::begin)
    }

    pub fn type_letter(&mut self, ch: char) -> bool {
        self.mutate_session(|s| s.type_letter(ch))
    }

    pub fn delete_letter(&mut self) -> bool {
        let typing = self
            .active
            .as_ref()
            .is_some_and(|r| r.session.phase == Phase::Typing);
        if !typing {
            return false;
        }
        self.note_mischief(MischiefEvent::Delete);
        self.mutate_session(ActivitySession::delete_letter)
    }

    pub fn remove_letter(&mut self, index: usize) -> bool {
        self.mutate_session(|s| s.remove_letter(index))
    }

    pub fn retry(&mut self) -> bool {
        self.mutate_session(ActivitySession::retry)
    }

    pub fn next(&mut self) -> bool {
        self.mutate_session(ActivitySession::next)
    }

    /// Reveal the current word.
    pub fn peek(&mut self) -> Option<String> {
        let word = self.active.as_ref()?.session.current_word()?.word.clone();
        self.note_mischief(MischiefEvent::Peek);
        Some(word)
    }

    /// Check the current attempt and record the word's progress.
    pub fn submit(&mut self) -> Option<SubmitOutcome> {
        let run = self.active.as_mut()?;
        let outcome = run.session.submit()?;
        let list_id = run.session.list_id.clone();
        let user = run.user_id.clone();

        if let Some(correct) = outcome.record_progress {
            let current = self.state.progress.lookup(user.as_deref(), &list_id, &outcome.word);
            let updated = update_progress(&current, correct);
            self.state.record_progress(user.as_deref(), updated);
            self.persist_state();
        }
        if !outcome.correct {
            self.note_mischief(MischiefEvent::Wrong);
        }
        self.save_snapshot();
        Some(outcome)
    }

    fn earned_for(
        &self,
        user: Option<&str>,
    ) -> Result<BTreeSet<&'static str>, crate::store::GatewayError> {
        let sessions = self.gateway.query_sessions(&SessionFilter::for_user(user))?;
        Ok(compute_earned_ids(
            &sessions,
            &self.state.word_lists,
            &self.state.progress,
            self.state.settings.heatmap_levels,
            user,
        ))
    }

    /// Log the finished run and work out which badges it unlocked. `None`
    /// when no run is finished or it produced no results.
    pub fn complete_session(&mut self) -> Option<CompletionReport> {
        if !self.active.as_ref()?.session.is_done() {
            return None;
        }
        let run = self.active.take()?;
        if let Err(e) = self.local.clear_active_session() {
            log::warn!("failed to clear in-progress session: {e}");
        }
        if run.session.results.is_empty() {
            log::info!("run finished without results; nothing to log");
            return None;
        }
        let user = run.user_id.as_deref();

        let before = match self.earned_for(user) {
            Ok(ids) => Some(ids),
            Err(e) => {
                log::warn!("failed to load session history: {e}");
                None
            }
        };

        let meta = SessionMeta {
            id: new_id(&mut self.rng),
            date: Utc::now(),
            list_id: run.session.list_id.clone(),
            list_name: run.list_name.clone(),
            user_id: run.user_id.clone(),
        };
        let record = SessionRecord::from_results(
            meta,
            run.session.activity,
            run.highlight_on,
            &run.session.results,
        );

        if run.highlight_on {
            record_mischief(&mut self.local, user, MischiefEvent::HighlightSession);
        }
        let mischief_after = compute_earned_mischief_ids(&self.local.mischief(user));
        let mischievements = newly_earned_mischief(&run.mischief_before, &mischief_after);

        let saved = match self.gateway.save_session(&record) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to save session: {e}");
                false
            }
        };

        let achievements = match (saved, before) {
            (true, Some(before)) => match self.earned_for(user) {
                Ok(after) => newly_earned(&before, &after),
                Err(e) => {
                    log::warn!("failed to reload session history: {e}");
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        log::info!(
            "{} session on {} scored {}",
            record.mode.as_str(),
            record.list_name,
            record.score
        );
        Some(CompletionReport {
            record,
            saved,
            achievements,
            mischievements,
        })
    }

    // --- reporting ---

    pub fn earned_achievements(&self) -> Result<BTreeSet<&'static str>> {
        Ok(self.earned_for(self.current_user.as_deref())?)
    }

    pub fn earned_mischief(&self) -> BTreeSet<&'static str> {
        compute_earned_mischief_ids(&self.local.mischief(self.current_user.as_deref()))
    }

    pub fn progress_summaries(&self, mode: HeatmapMode) -> Result<Vec<ListSummary>> {
        let sessions = self
            .gateway
            .query_sessions(&SessionFilter::for_user(self.current_user.as_deref()))?;
        let levels = self.state.settings.heatmap_levels;
        Ok(self
            .state
            .word_lists
            .iter()
            .map(|list| {
                let mut recent: Vec<SessionRecord> = sessions
                    .iter()
                    .filter(|s| s.list_id == list.id)
                    .cloned()
                    .collect();
                recent.sort_by(|a, b| b.date.cmp(&a.date));
                recent.truncate(RECENT_SESSIONS);
                ListSummary {
                    progress: summarize_list(list, &sessions, levels, mode),
                    recent,
                }
            })
            .collect())
    }

    pub fn user_reports(&self) -> Result<Vec<UserReport>> {
        let sessions = self.gateway.query_sessions(&SessionFilter::default())?;
        Ok(self
            .state
            .users
            .iter()
            .map(|u| {
                build_user_report(
                    &u.id,
                    &u.name,
                    &self.state.word_lists,
                    &self.state.progress,
                    &sessions,
                )
            })
            .collect())
    }
}
