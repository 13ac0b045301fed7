//! Word lists per language, loaded once at startup and read-only afterwards.

use log::{debug, info};
use shared::{Language, MINIMUM_WORD_LENGTH};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Lengths above this are counted together in the load summary
const SUMMARY_MAX_LENGTH: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dictionary for '{0}' contains no usable word")]
    Empty(Language),
}

/// Length histogram of a word list, logged when dictionaries are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySummary {
    /// Position i holds the number of words of length i, position 0 the
    /// number of words longer than `SUMMARY_MAX_LENGTH`
    pub words_by_length: [usize; SUMMARY_MAX_LENGTH + 1],
    pub max_length: usize,
    pub words_count: usize,
}

impl DictionarySummary {
    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a String>) -> Self {
        let mut summary = Self {
            words_by_length: [0; SUMMARY_MAX_LENGTH + 1],
            max_length: 0,
            words_count: 0,
        };

        for word in words {
            let length = word.chars().count();
            summary.max_length = summary.max_length.max(length);
            summary.words_count += 1;

            if length > SUMMARY_MAX_LENGTH {
                summary.words_by_length[0] += 1;
            } else {
                summary.words_by_length[length] += 1;
            }
        }

        summary
    }

    fn log(&self, language: Language) {
        for length in 1..=SUMMARY_MAX_LENGTH {
            if self.words_by_length[length] > 0 {
                debug!(
                    "'{}' words of length {}: {}",
                    language, length, self.words_by_length[length]
                );
            }
        }
        debug!("'{}' longer words: {}", language, self.words_by_length[0]);
        info!(
            "Loaded {} words for '{}' language (max length {})",
            self.words_count, language, self.max_length
        );
    }
}

#[derive(Debug, Default)]
pub struct Dictionary {
    words_by_lang: HashMap<Language, Vec<String>>,
}

impl Dictionary {
    /// Loads `words-<code>.txt` for every supported language from `dir`.
    pub fn load(dir: &Path) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::default();

        for language in Language::ALL {
            let path = dir.join(format!("words-{}.txt", language.code()));
            info!("Loading words for '{}' language from {}", language, path.display());

            let content = std::fs::read_to_string(&path).map_err(|source| {
                DictionaryError::Read {
                    path: path.clone(),
                    source,
                }
            })?;

            dictionary.insert(language, content.lines());
            if dictionary.words(language).is_empty() {
                return Err(DictionaryError::Empty(language));
            }
        }

        Ok(dictionary)
    }

    /// Builds a dictionary from in-memory word lists, applying the same
    /// filtering as `load`.
    pub fn from_words<'a, I>(lists: impl IntoIterator<Item = (Language, I)>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut dictionary = Self::default();
        for (language, words) in lists {
            dictionary.insert(language, words);
        }
        dictionary
    }

    fn insert<'a>(&mut self, language: Language, lines: impl IntoIterator<Item = &'a str>) {
        let words: Vec<String> = lines
            .into_iter()
            .map(str::trim)
            .filter(|word| word.chars().count() >= MINIMUM_WORD_LENGTH)
            .map(str::to_string)
            .collect();

        self.words_by_lang.insert(language, words);
        self.summary(language).log(language);
    }

    /// The words of a language, empty if it was never loaded.
    pub fn words(&self, language: Language) -> &[String] {
        self.words_by_lang
            .get(&language)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn summary(&self, language: Language) -> DictionarySummary {
        DictionarySummary::from_words(self.words(language))
    }
}
