use rand::Rng;
use rand::seq::SliceRandom;

use crate::session::letters::LetterBuffer;

const BLANK_RATIO: f64 = 0.45;

/// Letter positions hidden in a Missing-Letters round, ascending.
/// The first letter always stays visible.
pub fn generate_blanks<R: Rng + ?Sized>(word: &str, rng: &mut R) -> Vec<usize> {
    let len = word.chars().count();
    if len <= 1 {
        return Vec::new();
    }

    let mut candidates: Vec<usize> = (1..len).collect();
    let target = ((len as f64 * BLANK_RATIO).round() as usize).max(1);
    let count = target.min(candidates.len());

    candidates.shuffle(rng);
    candidates.truncate(count);
    candidates.sort_unstable();
    candidates
}

/// The word as the learner currently sees it: given letters in place,
/// typed letters in the blanks, untyped blanks dropped.
pub fn compose_with_blanks(word: &str, blanks: &[usize], typed: &LetterBuffer) -> String {
    let mut blank_idx = 0;
    word.chars()
        .enumerate()
        .filter_map(|(i, ch)| {
            if blanks.contains(&i) {
                let letter = typed.get(blank_idx);
                blank_idx += 1;
                letter
            } else {
                Some(ch)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_ten_letter_word_gets_five_sorted_blanks() {
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let blanks = generate_blanks("strawberry", &mut rng);
            assert_eq!(blanks.len(), 5);
            assert!(!blanks.contains(&0));
            assert!(blanks.windows(2).all(|w| w[0] < w[1]));
            assert!(blanks.iter().all(|&i| i < 10));
        }
    }

    #[test]
    fn test_short_words() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(generate_blanks("", &mut rng).is_empty());
        assert!(generate_blanks("a", &mut rng).is_empty());
        assert_eq!(generate_blanks("an", &mut rng), vec![1]);
        // round(3 * 0.45) = 1
        assert_eq!(generate_blanks("cat", &mut rng).len(), 1);
    }

    #[test]
    fn test_compose_fills_blanks_in_order() {
        let mut typed = LetterBuffer::new();
        assert_eq!(compose_with_blanks("house", &[1, 3], &typed), "hue");
        typed.type_letter('o', 2);
        assert_eq!(compose_with_blanks("house", &[1, 3], &typed), "houe");
        typed.type_letter('s', 2);
        assert_eq!(compose_with_blanks("house", &[1, 3], &typed), "house");
    }
}
