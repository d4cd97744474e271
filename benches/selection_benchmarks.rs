use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use spellbee::engine::heatmap::{HeatmapLevels, compute_word_statuses};
use spellbee::engine::progress::{WordProgress, update_progress_at};
use spellbee::engine::progress_map::ProgressMap;
use spellbee::engine::selector::{SelectionMode, select_session_words};
use spellbee::session::policy::Activity;
use spellbee::session::result::{SessionMeta, SessionRecord, SessionWordResult};
use spellbee::words::WordEntry;

fn make_words(count: usize) -> Vec<WordEntry> {
    (0..count).map(|i| WordEntry::new(format!("word{i}"))).collect()
}

fn make_progress(words: &[WordEntry]) -> ProgressMap {
    let mut map = ProgressMap::default();
    for (i, w) in words.iter().enumerate() {
        // leave a third untested
        if i % 3 == 0 {
            continue;
        }
        let p = update_progress_at(&WordProgress::new(&w.word, "bench"), i % 4 != 0, 1_000);
        map.record(Some("u1"), p);
    }
    map
}

fn bench_selection(c: &mut Criterion) {
    let words = make_words(500);
    let progress = make_progress(&words);

    for mode in [SelectionMode::Fresh, SelectionMode::Missed, SelectionMode::MostMissed] {
        c.bench_function(&format!("select_session_words {} (500 words)", mode.as_str()), |b| {
            let mut rng = SmallRng::seed_from_u64(1);
            b.iter(|| {
                select_session_words(
                    black_box(&words),
                    |w| progress.lookup(Some("u1"), "bench", w),
                    mode,
                    20,
                    &mut rng,
                )
            })
        });
    }
}

fn bench_heatmap_replay(c: &mut Criterion) {
    let words = make_words(50);
    let word_refs: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    let sessions: Vec<SessionRecord> = (0..200)
        .map(|i| {
            let results: Vec<SessionWordResult> = words
                .iter()
                .map(|w| SessionWordResult::new(&w.word, &w.word, (i + w.word.len()) % 5 != 0))
                .collect();
            let meta = SessionMeta {
                id: format!("s{i}"),
                date: chrono::DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0)
                    .unwrap_or_default(),
                list_id: "bench".to_string(),
                list_name: "Bench".to_string(),
                user_id: None,
            };
            SessionRecord::from_results(meta, Activity::Quiz, false, &results)
        })
        .collect();

    c.bench_function("compute_word_statuses (50 words x 200 sessions)", |b| {
        b.iter(|| compute_word_statuses(black_box(&word_refs), black_box(&sessions), HeatmapLevels::default()))
    });
}

criterion_group!(benches, bench_selection, bench_heatmap_replay);
criterion_main!(benches);
