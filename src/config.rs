//! Configuration management for the resume analyzer

use crate::error::{Result, ResumeAnalyzerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub analysis: AnalysisConfig,
    pub entities: EntityConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_ner_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub top_keywords: usize,
    /// Skill vocabulary, matched against single lower-cased tokens.
    pub skills: Vec<String>,
    pub max_sequence_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub backend: EntityBackend,
    pub gazetteer: Vec<GazetteerEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityBackend {
    Bert,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-analyzer")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_ner_model: "bert-base-ner".to_string(),
            },
            analysis: AnalysisConfig {
                top_keywords: 10,
                skills: default_skills(),
                max_sequence_length: 512,
            },
            entities: EntityConfig {
                backend: EntityBackend::Bert,
                gazetteer: default_gazetteer(),
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                color_output: true,
            },
        }
    }
}

fn default_skills() -> Vec<String> {
    [
        "python",
        "java",
        "html",
        "css",
        "javascript",
        "excel",
        "sql",
        "power bi",
        "machine learning",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_gazetteer() -> Vec<GazetteerEntry> {
    let orgs = [
        "Google", "Microsoft", "Amazon", "Apple", "Meta", "Netflix", "IBM", "Oracle",
        "Deloitte", "Accenture", "Infosys", "Tata Consultancy Services",
    ];
    let places = [
        "New York", "San Francisco", "Seattle", "London", "Berlin", "Bangalore",
        "Toronto", "Singapore",
    ];

    orgs.iter()
        .map(|o| GazetteerEntry { text: o.to_string(), label: "ORG".to_string() })
        .chain(places.iter().map(|p| GazetteerEntry {
            text: p.to_string(),
            label: "GPE".to_string(),
        }))
        .collect()
}

impl Config {
    /// Load from the default location, writing defaults on first use
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeAnalyzerError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-analyzer")
            .join("config.toml")
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_skill_vocabulary() {
        let config = Config::default();
        assert_eq!(config.analysis.skills.len(), 9);
        assert!(config.analysis.skills.contains(&"power bi".to_string()));
        assert_eq!(config.analysis.top_keywords, 10);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.entities.backend, EntityBackend::Bert);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.analysis.skills, config.analysis.skills);
        assert_eq!(reloaded.entities.gazetteer, config.entities.gazetteer);
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let result = Config::from_toml("analysis = [not valid");
        assert!(matches!(result, Err(ResumeAnalyzerError::Configuration(_))));
    }

    #[test]
    fn test_custom_skill_vocabulary() {
        let mut config = Config::default();
        config.analysis.skills = vec!["rust".to_string(), "go".to_string()];
        config.entities.backend = EntityBackend::Rules;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.analysis.skills, vec!["rust", "go"]);
        assert_eq!(parsed.entities.backend, EntityBackend::Rules);
    }
}
