//! Rule-based entity recognition: configured gazetteer plus date patterns

use crate::config::GazetteerEntry;
use crate::error::{Result, ResumeAnalyzerError};
use crate::ner::{Entity, EntityRecognizer};
use aho_corasick::{AhoCorasick, MatchKind};
use regex::Regex;

const MONTHS: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

pub struct RuleBasedRecognizer {
    gazetteer: Option<AhoCorasick>,
    labels: Vec<String>,
    patterns: Vec<String>,
    date_regex: Regex,
}

struct Span {
    start: usize,
    end: usize,
    label: String,
}

impl RuleBasedRecognizer {
    pub fn new(entries: &[GazetteerEntry]) -> Result<Self> {
        let entries: Vec<&GazetteerEntry> = entries
            .iter()
            .filter(|e| !e.text.trim().is_empty())
            .collect();

        let patterns: Vec<String> = entries.iter().map(|e| e.text.clone()).collect();
        let labels: Vec<String> = entries.iter().map(|e| e.label.clone()).collect();

        let gazetteer = if patterns.is_empty() {
            None
        } else {
            let matcher = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostLongest)
                .build(&patterns)
                .map_err(|e| {
                    ResumeAnalyzerError::EntityRecognition(format!("Failed to build gazetteer: {}", e))
                })?;
            Some(matcher)
        };

        let date_regex = Regex::new(&format!(r"\b(?:{}\.?\s+(?:19|20)\d{{2}}|(?:19|20)\d{{2}})\b", MONTHS))
            .map_err(|e| ResumeAnalyzerError::EntityRecognition(format!("Invalid date pattern: {}", e)))?;

        Ok(Self {
            gazetteer,
            labels,
            patterns,
            date_regex,
        })
    }

    pub fn gazetteer_size(&self) -> usize {
        self.patterns.len()
    }

    fn gazetteer_spans(&self, text: &str) -> Vec<Span> {
        let Some(matcher) = &self.gazetteer else {
            return Vec::new();
        };

        matcher
            .find_iter(text)
            .filter(|m| is_word_boundary(text, m.start(), m.end()))
            .map(|m| Span {
                start: m.start(),
                end: m.end(),
                label: self.labels[m.pattern().as_usize()].clone(),
            })
            .collect()
    }

    fn date_spans(&self, text: &str) -> Vec<Span> {
        self.date_regex
            .find_iter(text)
            .map(|m| Span {
                start: m.start(),
                end: m.end(),
                label: "DATE".to_string(),
            })
            .collect()
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn name(&self) -> &str {
        "rules"
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let mut spans = self.gazetteer_spans(text);
        spans.extend(self.date_spans(text));
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut entities = Vec::new();
        let mut covered_until = 0;
        for span in spans {
            if span.start < covered_until {
                continue;
            }
            covered_until = span.end;
            entities.push(Entity::new(&text[span.start..span.end], span.label));
        }

        Ok(entities)
    }
}

/// The match must not start or end inside a word
fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> RuleBasedRecognizer {
        RuleBasedRecognizer::new(&[
            GazetteerEntry { text: "Google".to_string(), label: "ORG".to_string() },
            GazetteerEntry { text: "Google Cloud".to_string(), label: "PRODUCT".to_string() },
            GazetteerEntry { text: "London".to_string(), label: "GPE".to_string() },
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicates_in_document_order() {
        let entities = recognizer()
            .recognize("Worked at Google in London, then rejoined Google.")
            .unwrap();

        assert_eq!(
            entities,
            vec![
                Entity::new("Google", "ORG"),
                Entity::new("London", "GPE"),
                Entity::new("Google", "ORG"),
            ]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let entities = recognizer().recognize("Certified on Google Cloud").unwrap();
        assert_eq!(entities, vec![Entity::new("Google Cloud", "PRODUCT")]);
    }

    #[test]
    fn test_word_boundaries() {
        let entities = recognizer().recognize("Googleplex and Londoner").unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn test_dates() {
        let entities = recognizer()
            .recognize("Engineer, Jan 2020 - 2023 at Google")
            .unwrap();

        assert_eq!(
            entities,
            vec![
                Entity::new("Jan 2020", "DATE"),
                Entity::new("2023", "DATE"),
                Entity::new("Google", "ORG"),
            ]
        );
    }

    #[test]
    fn test_empty_gazetteer() {
        let recognizer = RuleBasedRecognizer::new(&[]).unwrap();
        assert_eq!(recognizer.gazetteer_size(), 0);
        assert!(recognizer.recognize("Google").unwrap().is_empty());
    }
}
