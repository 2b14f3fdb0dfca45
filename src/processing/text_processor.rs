//! Tokenization and keyword frequency

use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Contraction and possessive endings split off before the alphabetic check
const CLITICS: [&str; 7] = ["n't", "'s", "'m", "'re", "'ve", "'ll", "'d"];

#[derive(Default)]
pub struct TextProcessor;

impl TextProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize text into lower-cased alphabetic words.
    ///
    /// Words come from Unicode word segmentation. A trailing contraction or
    /// possessive ending ("'s", "n't", "'m", ...) is split off and dropped, so
    /// "Google's" counts as "google" and "don't" as "do". The remaining word is
    /// kept only if every character is alphabetic, so "2019", "v2" or
    /// "O'Brien" never count.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(strip_clitic)
            .filter(|word| !word.is_empty() && word.chars().all(char::is_alphabetic))
            .map(str::to_lowercase)
            .collect()
    }

    /// The `max_keywords` most frequent tokens with their counts.
    ///
    /// Sorted by count descending; equal counts keep first-occurrence order.
    pub fn top_keywords(&self, tokens: &[String], max_keywords: usize) -> Vec<(String, usize)> {
        let mut first_seen: Vec<&String> = Vec::new();
        let mut word_freq: HashMap<&String, usize> = HashMap::new();

        for token in tokens {
            let count = word_freq.entry(token).or_insert(0);
            if *count == 0 {
                first_seen.push(token);
            }
            *count += 1;
        }

        let mut keywords: Vec<(String, usize)> = first_seen
            .into_iter()
            .map(|word| (word.clone(), word_freq[word]))
            .collect();
        // sort_by is stable
        keywords.sort_by(|a, b| b.1.cmp(&a.1));
        keywords.truncate(max_keywords);
        keywords
    }
}

fn strip_clitic(word: &str) -> &str {
    let normalized = word.replace('\u{2019}', "'").to_lowercase();
    CLITICS
        .iter()
        .find(|clitic| normalized.len() > clitic.len() && normalized.ends_with(*clitic))
        .map(|clitic| {
            let ending = word.chars().rev().take(clitic.chars().count()).map(char::len_utf8).sum::<usize>();
            &word[..word.len() - ending]
        })
        .unwrap_or(word)
}
