//! Skill vocabulary matching

use log::warn;
use std::collections::BTreeSet;

/// Configured set of skill keywords, matched by exact single-token lookup.
///
/// Entries are lower-cased on construction. Entries containing whitespace
/// ("power bi") are kept but can never match, because tokens never contain
/// whitespace.
#[derive(Debug, Clone, Default)]
pub struct SkillVocabulary {
    entries: BTreeSet<String>,
}

impl SkillVocabulary {
    pub fn new<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: BTreeSet<String> = skills
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        for phrase in entries.iter().filter(|s| s.contains(char::is_whitespace)) {
            warn!("Skill '{}' spans several words and will never match a single token", phrase);
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Skills present among the (already lower-cased) tokens.
    pub fn match_tokens(&self, tokens: &[String]) -> BTreeSet<String> {
        tokens
            .iter()
            .filter(|token| self.entries.contains(token.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_single_token_match() {
        let vocab = SkillVocabulary::new(["Python", "SQL", "java"]);
        let found = vocab.match_tokens(&tokens(&["i", "know", "python", "and", "sql", "python"]));

        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["python", "sql"]);
    }

    #[test]
    fn test_multi_word_skill_never_matches() {
        let vocab = SkillVocabulary::new(["power bi"]);
        let found = vocab.match_tokens(&tokens(&["i", "know", "power", "bi"]));

        assert!(found.is_empty());
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_blank_entries_ignored() {
        let vocab = SkillVocabulary::new(["", "  ", "css"]);
        assert_eq!(vocab.len(), 1);
    }
}
