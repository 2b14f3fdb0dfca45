//! Resume analysis: word statistics, keywords, entities and skills

use crate::error::Result;
use crate::ner::{Entity, EntityRecognizer};
use crate::processing::skills::SkillVocabulary;
use crate::processing::text_processor::TextProcessor;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const DEFAULT_TOP_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Number of alphabetic tokens
    pub total_words: usize,
    /// Most frequent tokens, count descending, first occurrence breaks ties
    pub top_keywords: Vec<KeywordCount>,
    /// Entities in document order, duplicates kept
    pub entities: Vec<Entity>,
    pub skills: BTreeSet<String>,
}

/// Turns extracted resume text into an `AnalysisReport`.
///
/// The entity recognizer is injected so the expensive model is loaded once
/// by the caller and can be swapped for the rule-based backend.
pub struct ResumeAnalyzer {
    recognizer: Arc<dyn EntityRecognizer>,
    skills: SkillVocabulary,
    processor: TextProcessor,
    top_keywords: usize,
}

impl ResumeAnalyzer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, skills: SkillVocabulary) -> Self {
        if skills.is_empty() {
            warn!("Skill vocabulary is empty, no skills will be reported");
        } else {
            debug!("Skill vocabulary has {} entries", skills.len());
        }

        Self {
            recognizer,
            skills,
            processor: TextProcessor::new(),
            top_keywords: DEFAULT_TOP_KEYWORDS,
        }
    }

    pub fn with_top_keywords(mut self, top_keywords: usize) -> Self {
        self.top_keywords = top_keywords;
        self
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Analyze resume text.
    ///
    /// The text itself never causes an error: empty or symbol-only input gives
    /// a zero-word report. Errors only come from the recognizer backend.
    pub fn analyze(&self, text: &str) -> Result<AnalysisReport> {
        let tokens = self.processor.tokenize(text);

        let top_keywords = self
            .processor
            .top_keywords(&tokens, self.top_keywords)
            .into_iter()
            .map(|(word, count)| KeywordCount { word, count })
            .collect();

        let skills = self.skills.match_tokens(&tokens);
        let entities = self.recognizer.recognize(text)?;

        debug!(
            "Analyzed {} tokens: {} entities, {} skills",
            tokens.len(),
            entities.len(),
            skills.len()
        );

        Ok(AnalysisReport {
            total_words: tokens.len(),
            top_keywords,
            entities,
            skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tags every capitalized word as ORG
    struct CapitalizedRecognizer;

    impl EntityRecognizer for CapitalizedRecognizer {
        fn name(&self) -> &str {
            "capitalized"
        }

        fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
            Ok(text
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
                .map(|w| Entity::new(w, "ORG"))
                .collect())
        }
    }

    fn analyzer(skills: &[&str]) -> ResumeAnalyzer {
        ResumeAnalyzer::new(Arc::new(CapitalizedRecognizer), SkillVocabulary::new(skills.iter()))
    }

    #[test]
    fn test_word_count_and_top_keyword() {
        let report = analyzer(&[]).analyze("Hello World. Hello.").unwrap();

        assert_eq!(report.total_words, 3);
        assert_eq!(
            report.top_keywords[0],
            KeywordCount { word: "hello".to_string(), count: 2 }
        );
        assert_eq!(report.top_keywords[1].word, "world");
    }

    #[test]
    fn test_skills_are_case_insensitive_single_tokens() {
        let analyzer = analyzer(&["python", "sql", "power bi"]);

        let report = analyzer.analyze("I know Python and SQL").unwrap();
        assert_eq!(report.skills.iter().collect::<Vec<_>>(), vec!["python", "sql"]);

        let report = analyzer.analyze("I know Power BI").unwrap();
        assert!(report.skills.is_empty());
    }

    #[test]
    fn test_possessive_words_still_count() {
        let report = analyzer(&["python"])
            .analyze("Contributed to Python's stdlib while at Google's lab")
            .unwrap();

        assert_eq!(report.skills.iter().collect::<Vec<_>>(), vec!["python"]);
        assert_eq!(report.total_words, 8);
        assert!(report.top_keywords.iter().any(|k| k.word == "google"));
    }

    #[test]
    fn test_entities_keep_duplicates_in_order() {
        let report = analyzer(&[])
            .analyze("interned at Google, later rejoined Google")
            .unwrap();

        assert_eq!(
            report.entities,
            vec![Entity::new("Google", "ORG"), Entity::new("Google", "ORG")]
        );
    }

    #[test]
    fn test_punctuation_never_counted() {
        let report = analyzer(&[]).analyze("-- !! ... 2024 ?? ::").unwrap();

        assert_eq!(report.total_words, 0);
        assert!(report.top_keywords.is_empty());
        assert!(report.skills.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let analyzer = analyzer(&["java", "excel"]);
        let text = "Java developer. Excel, Java and Oracle at Acme Corp in 2021.";

        assert_eq!(analyzer.analyze(text).unwrap(), analyzer.analyze(text).unwrap());
    }

    #[test]
    fn test_top_keyword_limit() {
        let report = analyzer(&[])
            .with_top_keywords(2)
            .analyze("a b c a b a")
            .unwrap();

        assert_eq!(report.top_keywords.len(), 2);
        assert_eq!(report.top_keywords[0].count, 3);
        assert_eq!(report.top_keywords[1].count, 2);
    }
}
