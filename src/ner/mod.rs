//! Named entity recognition backends
//!
//! The analyzer receives an `EntityRecognizer` at construction time. Two
//! backends exist: a BERT token-classification model run through Candle, and
//! a rule-based gazetteer used when no model has been downloaded.

pub mod bert;
pub mod model_manager;
pub mod rules;

use crate::config::{Config, EntityBackend};
use crate::error::Result;
use bert::BertRecognizer;
use log::{info, warn};
use model_manager::ModelManager;
use rules::RuleBasedRecognizer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A labelled span of the analyzed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

pub trait EntityRecognizer: Send + Sync {
    /// Backend identifier shown in report metadata
    fn name(&self) -> &str;

    /// Entities in document order, duplicates included.
    fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

/// Build the recognizer for `backend`.
///
/// The BERT backend falls back to the rule-based one when the model has not
/// been downloaded or fails to load.
pub async fn build_recognizer(
    config: &Config,
    backend: EntityBackend,
    model_id: Option<&str>,
) -> Result<Arc<dyn EntityRecognizer>> {
    if backend == EntityBackend::Bert {
        let model_id = model_id.unwrap_or(config.models.default_ner_model.as_str());
        let manager = ModelManager::new(config.models_dir().clone()).await?;

        match manager.get_model_path(model_id) {
            Some(model_path) => {
                match BertRecognizer::load(&model_path, config.analysis.max_sequence_length) {
                    Ok(recognizer) => return Ok(Arc::new(recognizer)),
                    Err(e) => warn!("Could not load NER model '{}': {}", model_id, e),
                }
            }
            None => warn!(
                "NER model '{}' is not downloaded (run `resume-analyzer models download {}`)",
                model_id, model_id
            ),
        }
        info!("Proceeding with rule-based entity recognition");
    }

    let recognizer = RuleBasedRecognizer::new(&config.entities.gazetteer)?;
    info!("Rule-based recognizer ready with {} gazetteer entries", recognizer.gazetteer_size());
    Ok(Arc::new(recognizer))
}
