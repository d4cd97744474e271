use crate::store::schema::AppState;

/// Guards pushes of local state to the gateway.
///
/// Nothing is pushed before the first load finished, and a state without
/// word lists never replaces a remote state that had some.
#[derive(Debug, Default)]
pub struct StateSync {
    hydrated: bool,
    remote_has_lists: bool,
}

impl StateSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful load. `None` means the gateway has nothing stored.
    pub fn mark_hydrated(&mut self, remote: Option<&AppState>) {
        self.hydrated = true;
        self.observe_remote(remote);
    }

    pub fn observe_remote(&mut self, remote: Option<&AppState>) {
        if remote.is_some_and(|s| !s.word_lists.is_empty()) {
            self.remote_has_lists = true;
        }
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn should_push(&self, local: &AppState) -> bool {
        self.hydrated && !(local.word_lists.is_empty() && self.remote_has_lists)
    }

    pub fn pushed(&mut self, local: &AppState) {
        self.observe_remote(Some(local));
    }

    /// Initial load only adopts remote state that has word lists.
    pub fn should_adopt_initial(remote: &AppState) -> bool {
        !remote.word_lists.is_empty()
    }

    /// Polls adopt remote state only when lists or users changed elsewhere.
    pub fn remote_differs(local: &AppState, remote: &AppState) -> bool {
        local.word_lists != remote.word_lists || local.users != remote.users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::progress::{WordProgress, update_progress_at};
    use crate::store::schema::UserProfile;
    use crate::words::WordList;

    fn with_list() -> AppState {
        let mut state = AppState::default();
        state.add_list(WordList::new("l1", "Week 1", &["cat".to_string()], 0));
        state
    }

    #[test]
    fn test_no_push_before_hydration() {
        let sync = StateSync::new();
        assert!(!sync.should_push(&with_list()));
    }

    #[test]
    fn test_empty_state_never_overwrites_remote_lists() {
        let mut sync = StateSync::new();
        let remote = with_list();
        sync.mark_hydrated(Some(&remote));
        assert!(!sync.should_push(&AppState::default()));
        assert!(sync.should_push(&remote));
    }

    #[test]
    fn test_empty_remote_allows_pushing_real_state() {
        let mut sync = StateSync::new();
        sync.mark_hydrated(None);
        assert!(sync.should_push(&AppState::default()));
        sync.pushed(&with_list());
        assert!(!sync.should_push(&AppState::default()));
    }

    #[test]
    fn test_initial_adoption_requires_lists() {
        assert!(!StateSync::should_adopt_initial(&AppState::default()));
        assert!(StateSync::should_adopt_initial(&with_list()));
    }

    #[test]
    fn test_remote_differs_ignores_progress() {
        let local = with_list();
        let mut remote = local.clone();
        let p = update_progress_at(&WordProgress::new("cat", "l1"), true, 1);
        remote.record_progress(None, p);
        assert!(!StateSync::remote_differs(&local, &remote));

        remote.add_user(UserProfile::new("u1", "Ada"));
        assert!(StateSync::remote_differs(&local, &remote));
    }
}
