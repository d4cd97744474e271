use rust_embed::Embed;

use crate::words::entry::WordList;
use crate::words::parser::parse_word_list;

#[derive(Embed)]
#[folder = "assets/lists/"]
struct StarterAssets;

/// Word lists bundled with the binary, offered to a household that has not
/// created any lists yet.
pub fn starter_lists(now_ms: i64) -> Vec<WordList> {
    let mut names: Vec<String> = StarterAssets::iter()
        .map(|name| name.to_string())
        .filter(|name| name.ends_with(".txt"))
        .collect();
    names.sort();

    names
        .iter()
        .filter_map(|file_name| {
            let file = StarterAssets::get(file_name)?;
            let text = String::from_utf8_lossy(&file.data);
            let words = parse_word_list(&text);
            if words.is_empty() {
                return None;
            }
            let stem = file_name.trim_end_matches(".txt");
            Some(WordList::new(
                format!("starter-{stem}"),
                display_name(stem),
                &words,
                now_ms,
            ))
        })
        .collect()
}

fn display_name(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
