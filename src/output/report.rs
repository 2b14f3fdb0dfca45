//! Report structures wrapping an analysis with generation metadata

use crate::processing::analyzer::AnalysisReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const NO_ENTITIES_MESSAGE: &str = "No named entities detected.";
pub const NO_SKILLS_MESSAGE: &str = "No relevant skills detected.";

/// Analysis results plus metadata about how they were produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeReport {
    pub metadata: ReportMetadata,
    pub analysis: AnalysisReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub source_file: String,
    pub generated_at: DateTime<Utc>,
    pub recognizer: String,
    pub processing_time_ms: u64,
    pub analyzer_version: String,
}

impl ResumeReport {
    pub fn new(
        analysis: AnalysisReport,
        source: &Path,
        recognizer: &str,
        processing_time_ms: u64,
    ) -> Self {
        let source_file = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.display().to_string());

        Self {
            metadata: ReportMetadata {
                source_file,
                generated_at: Utc::now(),
                recognizer: recognizer.to_string(),
                processing_time_ms,
                analyzer_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            analysis,
        }
    }

    /// Skills joined for display, or the fallback message
    pub fn skills_line(&self) -> String {
        if self.analysis.skills.is_empty() {
            NO_SKILLS_MESSAGE.to_string()
        } else {
            self.analysis
                .skills
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn analysis(skills: &[&str]) -> AnalysisReport {
        AnalysisReport {
            total_words: 0,
            top_keywords: Vec::new(),
            entities: Vec::new(),
            skills: skills.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_skills_line() {
        let report = ResumeReport::new(analysis(&["sql", "python"]), Path::new("/tmp/cv.pdf"), "rules", 3);
        assert_eq!(report.skills_line(), "python, sql");
        assert_eq!(report.metadata.source_file, "cv.pdf");

        let empty = ResumeReport::new(analysis(&[]), Path::new("cv.pdf"), "rules", 3);
        assert_eq!(empty.skills_line(), NO_SKILLS_MESSAGE);
    }
}
