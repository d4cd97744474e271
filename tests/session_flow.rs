use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use spellbee::app::App;
use spellbee::config::Config;
use spellbee::engine::heatmap::{HeatmapMode, WordStatus};
use spellbee::engine::selector::SelectionMode;
use spellbee::session::policy::{Activity, Phase};
use spellbee::session::result::{SessionFilter, SessionMode};
use spellbee::store::gateway::Gateway;
use spellbee::store::json_store::JsonStore;

fn open_app(dir: &TempDir, seed: u64) -> App {
    let config = Config {
        data_dir: dir.path().to_string_lossy().to_string(),
        ..Config::default()
    };
    let gateway = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let local = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let mut app = App::with_parts(config, Box::new(gateway), local, SmallRng::seed_from_u64(seed));
    app.hydrate();
    app
}

fn current_word(app: &App) -> String {
    app.active().unwrap().session.current_word().unwrap().word.clone()
}

fn type_word(app: &mut App, word: &str) {
    for ch in word.chars() {
        app.type_letter(ch);
    }
}

fn misspell(word: &str) -> String {
    format!("{}x", &word[..word.len() - 1])
}

#[test]
fn learn_run_with_a_retry_logs_first_attempt() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 1);
    let list = app.add_list("Animals", "cat, dog").unwrap();
    app.set_word_count_override(Some(2));
    app.start_activity(Activity::Learn, Some(&list), SelectionMode::Fresh, false)
        .unwrap();

    let first = current_word(&app);
    assert!(app.begin());
    type_word(&mut app, &misspell(&first));
    assert!(!app.submit().unwrap().correct);
    // learn never moves on from a miss
    assert!(!app.next());
    assert!(app.retry());
    type_word(&mut app, &first);
    let outcome = app.submit().unwrap();
    assert!(outcome.correct);
    assert_eq!(outcome.record_progress, None);
    assert!(app.next());

    let second = current_word(&app);
    app.begin();
    type_word(&mut app, &second);
    app.submit().unwrap();
    app.next();
    assert_eq!(app.active().unwrap().session.phase, Phase::Done);

    let report = app.complete_session().unwrap();
    assert_eq!(report.record.mode, SessionMode::Learn);
    assert_eq!(report.record.results.len(), 2);
    assert_eq!(report.record.score, 50);

    let p = app.state.progress.lookup(None, &list, &first);
    assert_eq!((p.correct_count, p.incorrect_count), (0, 1));
}

#[test]
fn quiz_with_highlight_is_logged_as_practice() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 2);
    let list = app.add_list("Birds", "owl").unwrap();
    app.start_activity(Activity::Quiz, Some(&list), SelectionMode::Fresh, true)
        .unwrap();
    assert_eq!(app.active().unwrap().session.phase, Phase::Prompt);
    app.begin();
    type_word(&mut app, "oel");
    let outcome = app.submit().unwrap();
    assert!(!outcome.correct);
    assert!(app.next());

    let report = app.complete_session().unwrap();
    assert_eq!(report.record.mode, SessionMode::Practice);
    assert_eq!(report.record.highlight_on, Some(true));
    assert_eq!(report.record.score, 0);

    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let logged = store.query_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(logged.len(), 1);
}

#[test]
fn missing_letters_only_fills_blanks() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 3);
    let list = app.add_list("Fruit", "strawberry").unwrap();
    app.start_activity(Activity::MissingLetters, Some(&list), SelectionMode::Fresh, false)
        .unwrap();

    let session = &app.active().unwrap().session;
    let blanks = session.current_blanks().to_vec();
    assert_eq!(blanks.len(), 5);
    assert_eq!(session.capacity(), 5);
    let hidden: Vec<char> = blanks
        .iter()
        .map(|&i| "strawberry".chars().nth(i).unwrap())
        .collect();

    for &ch in &hidden {
        app.type_letter(ch);
    }
    // buffer full
    assert!(!app.type_letter('z'));
    let outcome = app.submit().unwrap();
    assert!(outcome.correct);
    assert!(outcome.finished);
    assert_eq!(outcome.typed, "strawberry");
}

#[test]
fn progress_is_kept_per_learner() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 4);
    let list = app.add_list("Pets", "cat").unwrap();
    let ada = app.add_user("Ada", None);
    app.add_user("Bo", None);

    app.select_user(Some("ada")).unwrap();
    app.start_activity(Activity::Practice, Some(&list), SelectionMode::Fresh, false)
        .unwrap();
    type_word(&mut app, "cat");
    app.submit().unwrap();
    let report = app.complete_session().unwrap();
    assert_eq!(report.record.user_id.as_deref(), Some(ada.as_str()));

    assert_eq!(app.state.progress.lookup(Some(&ada), &list, "cat").correct_count, 1);
    let bo = app.resolve_user("Bo").unwrap();
    assert!(app.state.progress.lookup(Some(&bo), &list, "cat").is_untested());

    let reports = app.user_reports().unwrap();
    let ada_report = reports.iter().find(|r| r.user_id == ada).unwrap();
    assert_eq!(ada_report.practiced, 1);
    assert_eq!(ada_report.sessions, 1);
    let bo_report = reports.iter().find(|r| r.user_id == bo).unwrap();
    assert_eq!(bo_report.sessions, 0);

    app.clear_user_progress("Ada").unwrap();
    assert!(app.state.progress.lookup(Some(&ada), &list, "cat").is_untested());
}

#[test]
fn heatmap_summary_follows_session_history() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 5);
    let list = app.add_list("Pets", "cat").unwrap();

    for _ in 0..2 {
        app.start_activity(Activity::Quiz, Some(&list), SelectionMode::Fresh, false)
            .unwrap();
        app.begin();
        type_word(&mut app, "cat");
        app.submit().unwrap();
        app.next();
        app.complete_session().unwrap();
    }

    let summaries = app.progress_summaries(HeatmapMode::Quiz).unwrap();
    let pets = summaries
        .iter()
        .find(|s| s.progress.list_id == list)
        .unwrap();
    assert_eq!(pets.progress.statuses, vec![("cat".to_string(), WordStatus::Streak(2))]);
    assert_eq!(pets.progress.mastered, 1);
    assert_eq!(pets.recent.len(), 2);
    assert!(pets.recent[0].date >= pets.recent[1].date);

    let earned = app.earned_achievements().unwrap();
    assert!(earned.contains("first-steps"));
}

#[test]
fn clearing_sessions_for_a_learner_keeps_others() {
    let dir = TempDir::new().unwrap();
    let mut app = open_app(&dir, 6);
    let list = app.add_list("Pets", "cat").unwrap();
    app.add_user("Ada", None);
    app.add_user("Bo", None);

    for user in ["Ada", "Bo"] {
        app.select_user(Some(user)).unwrap();
        app.start_activity(Activity::Practice, Some(&list), SelectionMode::Fresh, false)
            .unwrap();
        type_word(&mut app, "cat");
        app.submit().unwrap();
        app.complete_session().unwrap();
    }

    app.clear_sessions(Some("Ada")).unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    let left = store.query_sessions(&SessionFilter::default()).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].user_id.as_deref(), Some(app.resolve_user("Bo").unwrap().as_str()));
}

#[test]
fn second_device_adopts_new_lists_on_poll() {
    let dir = TempDir::new().unwrap();
    let mut first = open_app(&dir, 7);
    let mut second = open_app(&dir, 8);
    assert!(!second.poll_remote());

    first.add_list("Shared", "sun, moon").unwrap();
    assert!(second.poll_remote());
    assert!(second.resolve_list(Some("Shared")).is_ok());
}

#[test]
fn hydrate_keeps_existing_lists_instead_of_seeding() {
    let dir = TempDir::new().unwrap();
    let mut first = open_app(&dir, 9);
    let seeded = first.state.word_lists.len();
    first.add_list("Mine", "cat").unwrap();

    let again = open_app(&dir, 10);
    assert_eq!(again.state.word_lists.len(), seeded + 1);
}
