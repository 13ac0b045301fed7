//! Random selection of the words of a round.
//!
//! No selected word may be a prefix of another one, otherwise a player typing
//! the longer word would claim the shorter one halfway through.

use crate::dictionary::Dictionary;
use log::debug;
use rand::Rng;
use shared::Language;
use std::sync::Arc;

/// Draws allowed per requested word, on top of a fixed allowance
const ATTEMPTS_PER_WORD: usize = 100;
const BASE_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordSelectionError {
    #[error("requested {requested} words but the '{language}' dictionary only has {available}")]
    NotEnoughWords {
        language: Language,
        requested: usize,
        available: usize,
    },

    #[error("could only select {selected} of {requested} '{language}' words after {attempts} draws")]
    Exhausted {
        language: Language,
        requested: usize,
        selected: usize,
        attempts: usize,
    },
}

fn collides(selected: &[String], candidate: &str) -> bool {
    selected
        .iter()
        .any(|word| word.starts_with(candidate) || candidate.starts_with(word.as_str()))
}

/// Picks `count` prefix-free words from `words`, drawing uniformly at random.
///
/// Gives up after a bounded number of draws instead of spinning forever when
/// the list cannot satisfy the constraint.
pub fn select_words<R: Rng + ?Sized>(
    language: Language,
    words: &[String],
    count: usize,
    rng: &mut R,
) -> Result<Vec<String>, WordSelectionError> {
    if count > words.len() {
        return Err(WordSelectionError::NotEnoughWords {
            language,
            requested: count,
            available: words.len(),
        });
    }

    let max_attempts = count * ATTEMPTS_PER_WORD + BASE_ATTEMPTS;
    let mut selected: Vec<String> = Vec::with_capacity(count);
    let mut attempts = 0;

    while selected.len() < count {
        if attempts >= max_attempts {
            return Err(WordSelectionError::Exhausted {
                language,
                requested: count,
                selected: selected.len(),
                attempts,
            });
        }
        attempts += 1;

        let candidate = &words[rng.gen_range(0..words.len())];
        if !collides(&selected, candidate) {
            selected.push(candidate.clone());
        }
    }

    debug!(
        "Selected {} '{}' words in {} draws",
        selected.len(),
        language,
        attempts
    );
    Ok(selected)
}

/// Word selection backed by the loaded dictionaries.
#[derive(Debug, Clone)]
pub struct WordSelector {
    dictionary: Arc<Dictionary>,
}

impl WordSelector {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        Self { dictionary }
    }

    pub fn select(&self, language: Language, count: usize) -> Result<Vec<String>, WordSelectionError> {
        select_words(
            language,
            self.dictionary.words(language),
            count,
            &mut rand::thread_rng(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::MINIMUM_WORD_LENGTH;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn assert_prefix_free(selected: &[String]) {
        for (i, a) in selected.iter().enumerate() {
            for (j, b) in selected.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "'{}' is a prefix of '{}'", a, b);
                }
            }
        }
    }

    #[test]
    fn test_selects_requested_count() {
        let list = words(&[
            "apple", "banana", "cherry", "damson", "elderberry", "feijoa", "guava", "honeydew",
        ]);
        let mut rng = StdRng::seed_from_u64(7);

        let selected = select_words(Language::En, &list, 5, &mut rng).unwrap();
        assert_eq!(selected.len(), 5);
        assert_prefix_free(&selected);
        assert!(selected.iter().all(|w| list.contains(w)));
    }

    #[test]
    fn test_selects_whole_list_when_possible() {
        let list = words(&["apple", "banana", "cherry"]);
        let mut rng = StdRng::seed_from_u64(1);

        let mut selected = select_words(Language::En, &list, 3, &mut rng).unwrap();
        selected.sort();
        assert_eq!(selected, list);
    }

    #[test]
    fn test_prefix_words_are_never_selected_together() {
        let list = words(&["spark", "sparkle", "sparkling", "table", "tablet"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let selected = select_words(Language::En, &list, 2, &mut rng).unwrap();
            assert_eq!(selected.len(), 2);
            assert_prefix_free(&selected);
        }
    }

    #[test]
    fn test_infeasible_request_terminates() {
        // Every word shares the "spark" prefix chain, at most one can be picked
        let list = words(&["spark", "sparkle", "sparkling"]);
        let mut rng = StdRng::seed_from_u64(3);

        let result = select_words(Language::En, &list, 2, &mut rng);
        match result {
            Err(WordSelectionError::Exhausted {
                requested,
                selected,
                ..
            }) => {
                assert_eq!(requested, 2);
                assert_eq!(selected, 1);
            }
            other => panic!("Expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_not_enough_words() {
        let list = words(&["apple"]);
        let mut rng = StdRng::seed_from_u64(3);

        let result = select_words(Language::Fr, &list, 2, &mut rng);
        assert_eq!(
            result,
            Err(WordSelectionError::NotEnoughWords {
                language: Language::Fr,
                requested: 2,
                available: 1,
            })
        );
    }

    #[test]
    fn test_selector_uses_filtered_dictionary() {
        let dictionary = Dictionary::from_words([(
            Language::En,
            vec!["cat", "dog", "horse", "zebra", "monkey", "parrot", "rabbit"],
        )]);
        let selector = WordSelector::new(Arc::new(dictionary));

        let selected = selector.select(Language::En, 5).unwrap();
        assert_eq!(selected.len(), 5);
        assert!(selected.iter().all(|w| w.chars().count() >= MINIMUM_WORD_LENGTH));
        assert_prefix_free(&selected);
    }

    #[test]
    fn test_zero_words() {
        let mut rng = StdRng::seed_from_u64(0);
        let selected = select_words(Language::En, &[], 0, &mut rng).unwrap();
        assert!(selected.is_empty());
    }
}
