//! Output formatters for the analysis report

use crate::config::OutputFormat;
use crate::error::{Result, ResumeAnalyzerError};
use crate::ner::Entity;
use crate::output::report::*;
use crate::processing::analyzer::KeywordCount;
use askama::Template;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting resume reports
pub trait OutputFormatter {
    fn format_report(&self, report: &ResumeReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
}

/// JSON formatter for scripting and integration
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// HTML formatter with a styled single-page report
pub struct HtmlFormatter {
    include_styles: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    formatters: Vec<Box<dyn OutputFormatter>>,
}

#[derive(Template)]
#[template(source = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Resume Analysis Report</title>
    {% if include_styles %}
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background: #f8f9fa;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }
        .big-title {
            text-align: center;
            font-size: 36px;
            font-weight: bold;
            color: #4A90E2;
        }
        .sub-text {
            text-align: center;
            font-size: 20px;
            color: #777;
        }
        .result-box {
            padding: 15px;
            background-color: #f9f9f9;
            border-radius: 8px;
            margin-top: 10px;
        }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 6px 10px; border-bottom: 1px solid #e9ecef; }
        .metadata {
            background: #e9ecef;
            padding: 15px;
            border-radius: 6px;
            margin-top: 30px;
            font-size: 0.9em;
            color: #6c757d;
        }
    </style>
    {% endif %}
</head>
<body>
    <div class="container">
        <p class="big-title">📄 Resume Analyzer</p>
        <p class="sub-text">{{ source_file }}</p>

        <h2>📊 Analysis Report</h2>
        <div class="result-box">
            <h3>✅ Resume Insights</h3>
            <p><strong>Total Words:</strong> {{ total_words }}</p>
            <p><strong>Top {{ keywords.len() }} Keywords:</strong></p>
            <ol>
            {% for keyword in keywords %}
                <li>{{ keyword.word }} ({{ keyword.count }})</li>
            {% endfor %}
            </ol>

            <h3>🔍 Named Entities</h3>
            {% if entities.is_empty() %}
            <p>{{ no_entities_message }}</p>
            {% else %}
            <table>
                <tr><th>Entity</th><th>Label</th></tr>
                {% for entity in entities %}
                <tr><td>{{ entity.text }}</td><td>{{ entity.label }}</td></tr>
                {% endfor %}
            </table>
            {% endif %}

            <h3>🛠 Extracted Skills</h3>
            <p>{{ skills_line }}</p>
        </div>

        <div class="metadata">
            <p><strong>ℹ️ Generated by Resume Analyzer v{{ version }}</strong> at {{ generated_at }}</p>
            <p><strong>Entity recognizer:</strong> {{ recognizer }} | <strong>Processing time:</strong> {{ processing_time }}ms</p>
        </div>
    </div>
</body>
</html>"#, ext = "html")]
struct HtmlTemplate {
    include_styles: bool,
    source_file: String,
    total_words: usize,
    keywords: Vec<KeywordCount>,
    entities: Vec<Entity>,
    no_entities_message: &'static str,
    skills_line: String,
    version: String,
    generated_at: String,
    recognizer: String,
    processing_time: u64,
}

fn format_timestamp(report: &ResumeReport) -> String {
    report
        .metadata
        .generated_at
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &ResumeReport) -> Result<String> {
        let analysis = &report.analysis;
        let mut output = String::new();

        output.push_str(&self.format_header("📊 RESUME ANALYSIS REPORT", 1));
        output.push_str(&format!(
            "File: {} | Generated: {} | Processing time: {}ms\n",
            report.metadata.source_file,
            format_timestamp(report),
            report.metadata.processing_time_ms
        ));

        output.push_str(&self.format_header("✅ Resume Insights", 2));
        output.push_str(&format!(
            "Total Words: {}\n",
            self.colorize(&analysis.total_words.to_string(), Color::Cyan)
        ));
        output.push_str(&format!("Top {} Keywords:\n", analysis.top_keywords.len()));
        for (i, keyword) in analysis.top_keywords.iter().enumerate() {
            output.push_str(&format!("  {:>2}. {} ({})\n", i + 1, keyword.word, keyword.count));
        }

        output.push_str(&self.format_header("🔍 Named Entities", 2));
        if analysis.entities.is_empty() {
            output.push_str(&format!("{}\n", self.colorize(NO_ENTITIES_MESSAGE, Color::BrightBlack)));
        } else {
            let width = analysis
                .entities
                .iter()
                .map(|e| e.text.chars().count())
                .max()
                .unwrap_or(0)
                .max("Entity".len());

            output.push_str(&format!("  {:<width$}  {}\n", "Entity", "Label", width = width));
            output.push_str(&format!("  {}  {}\n", "-".repeat(width), "-----"));
            for entity in &analysis.entities {
                output.push_str(&format!(
                    "  {:<width$}  {}\n",
                    entity.text,
                    self.colorize(&entity.label, Color::Yellow),
                    width = width
                ));
            }
        }

        output.push_str(&self.format_header("🛠 Extracted Skills", 2));
        let skills_color = if analysis.skills.is_empty() {
            Color::BrightBlack
        } else {
            Color::Green
        };
        output.push_str(&format!("{}\n", self.colorize(&report.skills_line(), skills_color)));

        output.push_str(&format!(
            "\n{} Generated by Resume Analyzer v{} | Entities: {}\n",
            self.colorize("ℹ️", Color::Blue),
            report.metadata.analyzer_version,
            report.metadata.recognizer
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &ResumeReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &ResumeReport) -> Result<String> {
        let analysis = &report.analysis;
        let mut output = String::new();

        output.push_str("# 📊 Resume Analysis Report\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "**Resume:** `{}` | **Generated:** {} | **Processing Time:** {}ms\n\n",
                report.metadata.source_file,
                format_timestamp(report),
                report.metadata.processing_time_ms
            ));
        }

        output.push_str("## ✅ Resume Insights\n\n");
        output.push_str(&format!("**Total Words:** {}\n\n", analysis.total_words));
        output.push_str(&format!("### Top {} Keywords\n\n", analysis.top_keywords.len()));
        if !analysis.top_keywords.is_empty() {
            output.push_str("| # | Keyword | Count |\n");
            output.push_str("|---|---------|-------|\n");
            for (i, keyword) in analysis.top_keywords.iter().enumerate() {
                output.push_str(&format!("| {} | {} | {} |\n", i + 1, keyword.word, keyword.count));
            }
            output.push('\n');
        }

        output.push_str("## 🔍 Named Entities\n\n");
        if analysis.entities.is_empty() {
            output.push_str(&format!("{}\n\n", NO_ENTITIES_MESSAGE));
        } else {
            output.push_str("| Entity | Label |\n");
            output.push_str("|--------|-------|\n");
            for entity in &analysis.entities {
                output.push_str(&format!(
                    "| {} | {} |\n",
                    Self::escape_cell(&entity.text),
                    Self::escape_cell(&entity.label)
                ));
            }
            output.push('\n');
        }

        output.push_str("## 🛠 Extracted Skills\n\n");
        output.push_str(&format!("{}\n", report.skills_line()));

        if self.include_metadata {
            output.push_str("\n---\n\n");
            output.push_str(&format!(
                "*Generated by Resume Analyzer v{} using {}*\n",
                report.metadata.analyzer_version, report.metadata.recognizer
            ));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl HtmlFormatter {
    pub fn new(include_styles: bool) -> Self {
        Self { include_styles }
    }

    fn create_template_data(&self, report: &ResumeReport) -> HtmlTemplate {
        HtmlTemplate {
            include_styles: self.include_styles,
            source_file: report.metadata.source_file.clone(),
            total_words: report.analysis.total_words,
            keywords: report.analysis.top_keywords.clone(),
            entities: report.analysis.entities.clone(),
            no_entities_message: NO_ENTITIES_MESSAGE,
            skills_line: report.skills_line(),
            version: report.metadata.analyzer_version.clone(),
            generated_at: format_timestamp(report),
            recognizer: report.metadata.recognizer.clone(),
            processing_time: report.metadata.processing_time_ms,
        }
    }
}

impl OutputFormatter for HtmlFormatter {
    fn format_report(&self, report: &ResumeReport) -> Result<String> {
        self.create_template_data(report)
            .render()
            .map_err(|e| ResumeAnalyzerError::OutputFormatting(e.to_string()))
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Html
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true)
    }

    pub fn with_options(use_colors: bool) -> Self {
        Self {
            formatters: vec![
                Box::new(ConsoleFormatter::new(use_colors)),
                Box::new(JsonFormatter::new(true)),
                Box::new(MarkdownFormatter::new(true)),
                Box::new(HtmlFormatter::new(true)),
            ],
        }
    }

    pub fn generate_report(&self, report: &ResumeReport, format: &OutputFormat) -> Result<String> {
        self.formatters
            .iter()
            .find(|formatter| formatter.supports_format() == *format)
            .ok_or_else(|| {
                ResumeAnalyzerError::OutputFormatting(format!("No formatter registered for {:?}", format))
            })?
            .format_report(report)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::analyzer::AnalysisReport;
    use std::collections::BTreeSet;

    fn sample_report(with_entities: bool) -> ResumeReport {
        let entities = if with_entities {
            vec![
                Entity::new("Jane Doe", "PER"),
                Entity::new("Google", "ORG"),
                Entity::new("Google", "ORG"),
            ]
        } else {
            Vec::new()
        };

        let analysis = AnalysisReport {
            total_words: 42,
            top_keywords: vec![
                KeywordCount { word: "python".to_string(), count: 3 },
                KeywordCount { word: "data".to_string(), count: 2 },
            ],
            entities,
            skills: if with_entities {
                ["python", "sql"].iter().map(|s| s.to_string()).collect()
            } else {
                BTreeSet::new()
            },
        };

        ResumeReport::new(analysis, Path::new("jane_doe.pdf"), "rules", 12)
    }

    #[test]
    fn test_console_sections() {
        let output = ConsoleFormatter::new(false).format_report(&sample_report(true)).unwrap();

        assert!(output.contains("Total Words: 42"));
        assert!(output.contains(" 1. python (3)"));
        assert!(output.contains("Jane Doe"));
        assert_eq!(output.matches("Google").count(), 2);
        assert!(output.contains("python, sql"));
    }

    #[test]
    fn test_console_fallback_messages() {
        let output = ConsoleFormatter::new(false).format_report(&sample_report(false)).unwrap();

        assert!(output.contains(NO_ENTITIES_MESSAGE));
        assert!(output.contains(NO_SKILLS_MESSAGE));
    }

    #[test]
    fn test_json_contains_analysis() {
        let output = JsonFormatter::new(false).format_report(&sample_report(true)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["analysis"]["total_words"], 42);
        assert_eq!(value["analysis"]["top_keywords"][0]["word"], "python");
        assert_eq!(value["analysis"]["entities"].as_array().unwrap().len(), 3);
        assert_eq!(value["metadata"]["recognizer"], "rules");
    }

    #[test]
    fn test_markdown_entity_table() {
        let output = MarkdownFormatter::new(false).format_report(&sample_report(true)).unwrap();

        assert!(output.contains("| Entity | Label |"));
        assert!(output.contains("| Jane Doe | PER |"));
        assert!(output.contains("| 1 | python | 3 |"));

        let empty = MarkdownFormatter::new(false).format_report(&sample_report(false)).unwrap();
        assert!(empty.contains(NO_ENTITIES_MESSAGE));
        assert!(!empty.contains("| Entity | Label |"));
    }

    #[test]
    fn test_html_escapes_entity_text() {
        let mut report = sample_report(true);
        report.analysis.entities.push(Entity::new("<script>", "MISC"));

        let output = HtmlFormatter::new(false).format_report(&report).unwrap();
        assert!(output.contains("<td>Jane Doe</td>"));
        assert!(!output.contains("<script>"));
        assert!(output.contains("python, sql"));
    }

    #[test]
    fn test_generator_dispatch() {
        let generator = ReportGenerator::with_options(false);
        let report = sample_report(false);

        for format in [OutputFormat::Console, OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Html] {
            assert!(!generator.generate_report(&report, &format).unwrap().is_empty());
        }

        let json = generator.generate_report(&report, &OutputFormat::Json).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
        let markdown = generator.generate_report(&report, &OutputFormat::Markdown).unwrap();
        assert!(markdown.starts_with("# 📊 Resume Analysis Report"));
        let html = generator.generate_report(&report, &OutputFormat::Html).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
