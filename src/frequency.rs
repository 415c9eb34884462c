use std::collections::HashMap;

use crate::normalize;

/// Occurrence count per distinct cleaned token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyMap {
    counts: HashMap<String, usize>,
}

impl FrequencyMap {
    /// Counts every token by its exact string value.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut counts = HashMap::new();

        for token in tokens {
            let entry = counts.entry(token.into()).or_insert(0);
            *entry += 1;
        }

        FrequencyMap { counts }
    }

    /// Normalizes `text` one token per line and counts the result.
    pub fn from_text(text: &str) -> Self {
        Self::from_tokens(normalize::normalize_lines(text))
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.counts.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, i.e. the number of tokens that contributed.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Frequencies scaled into `(0, 1]` by the largest count, most frequent
    /// first, ties ordered by token. `max_words == 0` keeps everything.
    pub fn normalized(&self, max_words: usize) -> Vec<(&str, f32)> {
        let Some(max_freq) = self.counts.values().max().map(|max| *max as f32) else {
            return vec![];
        };

        let mut normalized_freqs: Vec<(&str, f32)> = self
            .iter()
            .map(|(key, val)| (key, val as f32 / max_freq))
            .collect();

        normalized_freqs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        if max_words > 0 {
            normalized_freqs.truncate(max_words);
        }

        normalized_freqs
    }
}

impl<S: Into<String>> FromIterator<S> for FrequencyMap {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::from_tokens(iter)
    }
}
