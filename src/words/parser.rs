use icu_normalizer::ComposingNormalizerBorrowed;

/// Split free-form parent input into spelling words.
///
/// Words are separated by commas or newlines. A token is kept only when it is
/// made of letters, optionally joined by single apostrophes or hyphens
/// ("don't", "well-known"). Tokens are NFC-normalized so that a composed and a
/// decomposed accent compare equal when the learner types them.
pub fn parse_word_list(input: &str) -> Vec<String> {
    let normalizer = ComposingNormalizerBorrowed::new_nfc();
    input
        .split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| normalizer.normalize(token).into_owned())
        .filter(|token| is_spelling_word(token))
        .collect()
}

fn is_spelling_word(token: &str) -> bool {
    let mut prev_joiner = true;
    for ch in token.chars() {
        if ch.is_alphabetic() {
            prev_joiner = false;
        } else if ch == '\'' || ch == '-' {
            if prev_joiner {
                return false;
            }
            prev_joiner = true;
        } else {
            return false;
        }
    }
    !prev_joiner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_commas_and_newlines() {
        let words = parse_word_list("cat, dog\nbird,,\n  fish  ");
        assert_eq!(words, vec!["cat", "dog", "bird", "fish"]);
    }

    #[test]
    fn test_keeps_apostrophes_and_hyphens_between_letters() {
        let words = parse_word_list("don't, well-known, -bad, bad-, o''clock");
        assert_eq!(words, vec!["don't", "well-known"]);
    }

    #[test]
    fn test_rejects_digits_and_spaces() {
        let words = parse_word_list("abc1, two words, ok");
        assert_eq!(words, vec!["ok"]);
    }

    #[test]
    fn test_normalizes_decomposed_accents() {
        let words = parse_word_list("cafe\u{0301}");
        assert_eq!(words, vec!["caf\u{e9}"]);
    }
}
