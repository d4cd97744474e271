pub mod entry;
pub mod parser;
pub mod starter;

pub use entry::{WordEntry, WordList};
pub use parser::parse_word_list;
