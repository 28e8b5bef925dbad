use log::debug;
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// A struct representing a word in the word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// The word exactly as it will appear in the grid.
    pub string: String,

    /// The glyph ids making up `string`, one per `char`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of cells this word occupies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a raw line from a word list file, turn it into the form we'll use in the fill engine.
/// This only happens when loading from a file; words handed to `WordList::from_words` are used
/// verbatim.
#[must_use]
pub fn normalize_word(raw: &str) -> String {
    raw.trim()
        .nfc() // Normalize Unicode combining forms
        .flat_map(char::to_uppercase)
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// The universe of candidate words for a fill. Words are bucketed by length (in `char`s) and
/// characters are interned as glyphs so that crossing checks compare small integers instead of
/// strings. Two words are the same word if and only if their strings are identical.
#[derive(Clone)]
pub struct WordList {
    /// A list of all characters that occur in any word. `GlyphId`s used everywhere else are indices
    /// into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// A list of all loaded words, bucketed by length. An index into `words` is the length of the
    /// words in the bucket, so `words[0]` is always an empty vec.
    pub words: Vec<Vec<Word>>,

    /// A map from a word's string to its id within its length bucket.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The maximum word length provided when configuring the `WordList`, if any.
    pub max_length: Option<usize>,
}

impl WordList {
    /// Build a `WordList` from the given words, keeping them exactly as given. Empty strings and
    /// repeated strings are skipped, and the first occurrence of each word determines its id.
    #[must_use]
    pub fn from_words<I, S>(words: I, max_length: Option<usize>) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![vec![]],
            word_id_by_string: HashMap::new(),
            max_length,
        };

        for word in words {
            instance.add_word(word.as_ref());
        }

        debug!(
            "Loaded {} words ({} distinct glyphs)",
            instance.word_count(),
            instance.glyphs.len()
        );

        instance
    }

    /// Build a `WordList` from the contents of a word list file: one word per line, normalized with
    /// `normalize_word`.
    #[must_use]
    pub fn from_file_contents(contents: &str, max_length: Option<usize>) -> WordList {
        WordList::from_words(contents.lines().map(normalize_word), max_length)
    }

    /// Read a word list file from disk. An unreadable file or one without a single word in it is
    /// an error. A file whose words are all longer than `max_length` is not: it loads as an empty
    /// list, and any grid with slots then simply has no fill.
    pub fn from_file(path: &Path, max_length: Option<usize>) -> Result<WordList> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if contents.lines().all(|line| normalize_word(line).is_empty()) {
            return Err(Error::EmptyWordList);
        }

        let word_list = WordList::from_file_contents(&contents, max_length);
        if word_list.word_count() == 0 {
            debug!("Every word in {} is longer than {max_length:?}", path.display());
        }

        Ok(word_list)
    }

    /// Add a single word unless it's empty, too long, or already present. Returns the word's id
    /// within its length bucket if it's (now) part of the list.
    pub fn add_word(&mut self, string: &str) -> Option<WordId> {
        if string.is_empty() {
            return None;
        }
        if let Some(&word_id) = self.word_id_by_string.get(string) {
            return Some(word_id);
        }

        let word_length = string.chars().count();
        if self.max_length.is_some_and(|max_length| word_length > max_length) {
            return None;
        }

        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> =
            string.chars().map(|c| self.glyph_id_for_char(c)).collect();

        while self.words.len() < word_length + 1 {
            self.words.push(vec![]);
        }

        let word_id = self.words[word_length].len();
        self.words[word_length].push(Word {
            string: string.to_string(),
            glyphs,
        });
        self.word_id_by_string.insert(string.to_string(), word_id);

        Some(word_id)
    }

    /// What's the unique glyph id for the given char? We assign these lazily, since word list
    /// entries may contain any characters at all.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// All words with exactly the given length.
    #[must_use]
    pub fn words_of_length(&self, length: usize) -> &[Word] {
        self.words.get(length).map_or(&[], Vec::as_slice)
    }

    /// Borrow a word by its length and id.
    #[must_use]
    pub fn word(&self, length: usize, word_id: WordId) -> &Word {
        &self.words[length][word_id]
    }

    /// The total number of distinct words across all lengths.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.iter().map(Vec::len).sum()
    }
}

impl fmt::Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs.len())
            .field("words", &format!("({} words)", self.word_count()))
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}
