use std::fs::File;
use std::io::{BufRead, BufReader};

use rand::{seq::SliceRandom, thread_rng};

use crate::room::settings::RoomSettings;

/// Supply of distinct display words for building decks, loaded once at startup.
#[derive(Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub const WORDS_FILE_PATH: &'static str = "words/en.txt";

    pub fn new(words: Vec<String>) -> Self {
        WordList { words }
    }

    pub fn load(file_path: &str) -> Self {
        let file = File::open(file_path).unwrap_or_else(|error| {
            panic!("Could not load words file. File: '{file_path}', Error: '{error}'.")
        });
        let mut words: Vec<String> = BufReader::new(file)
            .lines()
            .map(|line| {
                line.expect("Could not parse one of the word lines.")
                    .trim()
                    .to_lowercase()
            })
            .filter(|word| !word.is_empty())
            .collect();
        words.sort();
        words.dedup();

        // Decks take up to MAX_TOTAL_CARDS distinct words, so a shorter list is
        // a deployment mistake we want to surface immediately.
        let minimum = usize::from(RoomSettings::MAX_TOTAL_CARDS);
        if words.len() < minimum {
            panic!(
                "The words file holds too few distinct words. File: '{file_path}', Words: '{}', Minimum: '{minimum}'.",
                words.len()
            );
        }

        log::info!("Words loaded. File: '{file_path}', Words: '{}'.", words.len());
        WordList::new(words)
    }

    /// Returns `amount` distinct words in random order.
    pub fn sample(&self, amount: usize) -> Vec<String> {
        let mut words = self.words.clone();
        words.shuffle(&mut thread_rng());
        words.truncate(amount);
        words
    }
}
