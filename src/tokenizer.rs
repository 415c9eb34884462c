use std::ops::RangeInclusive;

use jieba_rs::Jieba;
use regex::Regex;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::normalize;

/// CJK Unified Ideographs.
const CJK_IDEOGRAPHS: RangeInclusive<u32> = 0x4E00..=0x9FFF;

pub fn is_cjk_ideograph(c: char) -> bool {
    CJK_IDEOGRAPHS.contains(&(c as u32))
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_ideograph)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Dictionary-based segmentation, used as soon as one ideograph is present.
    Dictionary,
    /// Unicode word boundaries (UAX #29).
    UnicodeWords,
    /// Word runs and single punctuation characters matched by a regex.
    Pattern,
}

/// Picks a segmentation strategy per text and rewrites it one token per line.
pub struct Segmenter {
    //分词正则
    regex: Regex,
    pub jieba: Jieba,
    pub unicode_words: bool,
}

impl Default for Segmenter {
    fn default() -> Self {
        let regex = Regex::new(r"\b\w+\b|[^\w\s]").expect("Unable to compile tokenization regex");

        Segmenter {
            regex,
            jieba: Jieba::new(),
            unicode_words: true,
        }
    }
}

impl<'a> Segmenter {
    /// Adds a word to the segmentation dictionary.
    pub fn with_word(mut self, word: &str) -> Self {
        self.jieba.add_word(word, None, None);
        self
    }

    /// Turning Unicode word segmentation off forces the regex split.
    pub fn with_unicode_words(mut self, value: bool) -> Self {
        self.unicode_words = value;
        self
    }

    pub fn strategy_for(&self, cleaned: &str) -> Strategy {
        if contains_cjk(cleaned) {
            Strategy::Dictionary
        } else if self.unicode_words {
            Strategy::UnicodeWords
        } else {
            Strategy::Pattern
        }
    }

    /// Segments already-cleaned text. Emitted slices may still carry
    /// whitespace; [`Segmenter::split_to_lines`] trims and filters them.
    pub fn segment(&'a self, cleaned: &'a str) -> Vec<&'a str> {
        match self.strategy_for(cleaned) {
            Strategy::Dictionary => self.jieba.cut(cleaned, true),
            Strategy::UnicodeWords => match self.unicode_tokens(cleaned) {
                Some(tokens) => tokens,
                None => {
                    debug!(target: "pipeline", "unicode_segmentation_fallback");
                    self.pattern_tokens(cleaned)
                }
            },
            Strategy::Pattern => self.pattern_tokens(cleaned),
        }
    }

    fn pattern_tokens(&'a self, text: &'a str) -> Vec<&'a str> {
        self.regex.find_iter(text).map(|mat| mat.as_str()).collect()
    }

    /// Walks UAX #29 word bounds and splits each segment into word runs and
    /// single punctuation characters, so `don't` and `3.14` come out the same
    /// as from the regex. `None` when a segment mixes word characters and
    /// whitespace, which hands the whole text over to the regex.
    fn unicode_tokens(&'a self, text: &'a str) -> Option<Vec<&'a str>> {
        let mut tokens = Vec::new();

        for segment in text.split_word_bounds() {
            if segment.chars().all(char::is_whitespace) {
                continue;
            }

            let has_word_chars = segment.chars().any(|c| c.is_alphanumeric() || c == '_');
            let has_space = segment.chars().any(char::is_whitespace);
            if has_word_chars && has_space {
                return None;
            }

            tokens.extend(self.pattern_tokens(segment));
        }

        Some(tokens)
    }

    /// Cleans `raw`, segments it, and joins the non-empty tokens with newlines.
    /// The result is meant to replace the edit buffer wholesale.
    pub fn split_to_lines(&self, raw: &str) -> String {
        let cleaned = normalize::clean_block(raw);
        let tokens = normalize::normalize_tokens(self.segment(&cleaned));

        debug!(
            target: "pipeline",
            strategy = ?self.strategy_for(&cleaned),
            tokens = tokens.len(),
            "split_to_lines"
        );

        tokens.join("\n")
    }
}
