//! NER model management for downloading and managing Hugging Face models

use crate::error::{Result, ResumeAnalyzerError};
use hf_hub::api::tokio::Api;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Information about an available NER model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub repo_id: String,
    pub size_mb: u64,
    pub description: String,
    pub labels: Vec<String>,
}

/// Manager for NER models - handles download, caching, and selection
pub struct ModelManager {
    models_dir: PathBuf,
    available_models: BTreeMap<String, ModelInfo>,
    downloaded_models: HashSet<String>,
}

impl ModelManager {
    /// Create a new model manager
    pub async fn new(models_dir: PathBuf) -> Result<Self> {
        if !models_dir.exists() {
            fs::create_dir_all(&models_dir).await.map_err(|e| {
                ResumeAnalyzerError::ModelError(format!("Failed to create models directory: {}", e))
            })?;
        }

        let mut manager = Self {
            models_dir,
            available_models: BTreeMap::new(),
            downloaded_models: HashSet::new(),
        };

        manager.init_available_models();
        manager.scan_downloaded_models().await?;

        Ok(manager)
    }

    fn init_available_models(&mut self) {
        let conll_labels: Vec<String> = ["PER", "ORG", "LOC", "MISC"]
            .iter()
            .map(|l| l.to_string())
            .collect();

        self.available_models.insert(
            "bert-base-ner".to_string(),
            ModelInfo {
                name: "bert-base-NER".to_string(),
                repo_id: "dslim/bert-base-NER".to_string(),
                size_mb: 430,
                description: "BERT base fine-tuned on CoNLL-2003; good default".to_string(),
                labels: conll_labels.clone(),
            },
        );

        self.available_models.insert(
            "bert-large-ner".to_string(),
            ModelInfo {
                name: "bert-large-NER".to_string(),
                repo_id: "dslim/bert-large-NER".to_string(),
                size_mb: 1330,
                description: "BERT large fine-tuned on CoNLL-2003; slower, more accurate".to_string(),
                labels: conll_labels,
            },
        );
    }

    async fn scan_downloaded_models(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.models_dir).await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to scan models directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to read directory entry: {}", e))
        })? {
            let model_name = entry.file_name().to_string_lossy().to_string();
            if model_name.starts_with('.') {
                continue;
            }
            if entry.file_type().await?.is_dir() && Self::is_valid_model_directory(&entry.path()).await {
                debug!("Found downloaded model: {}", model_name);
                self.downloaded_models.insert(model_name);
            }
        }

        Ok(())
    }

    /// A model directory needs a config, a tokenizer and weights
    pub async fn is_valid_model_directory(path: &Path) -> bool {
        let exists = |name: &str| {
            let file_path = path.join(name);
            async move { fs::metadata(&file_path).await.is_ok() }
        };

        exists("config.json").await
            && (exists("tokenizer.json").await || exists("vocab.txt").await)
            && (exists("model.safetensors").await || exists("pytorch_model.bin").await)
    }

    /// Download a model from Hugging Face Hub
    ///
    /// Files are fetched into a staging directory first; an existing copy of
    /// the model is only replaced once the new one is complete.
    pub async fn download_model(&mut self, model_id: &str) -> Result<PathBuf> {
        let model_info = self
            .available_models
            .get(model_id)
            .ok_or_else(|| ResumeAnalyzerError::ModelNotFound(model_id.to_string()))?
            .clone();

        info!("Downloading model: {} ({} MB) from {}", model_info.name, model_info.size_mb, model_info.repo_id);

        let staging_dir = self.staging_dir(model_id);
        if staging_dir.exists() {
            fs::remove_dir_all(&staging_dir).await?;
        }
        fs::create_dir_all(&staging_dir).await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to create model directory: {}", e))
        })?;

        if let Err(e) = Self::fetch_files(&model_info.repo_id, &staging_dir).await {
            let _ = fs::remove_dir_all(&staging_dir).await;
            return Err(e);
        }

        self.install_staged(model_id, &staging_dir).await
    }

    fn staging_dir(&self, model_id: &str) -> PathBuf {
        self.models_dir.join(format!(".{}.partial", model_id))
    }

    async fn fetch_files(repo_id: &str, dest: &Path) -> Result<()> {
        let api = Api::new().map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to initialize HF API: {}", e))
        })?;
        let repo = api.model(repo_id.to_string());

        let required_files = ["config.json"];
        let optional_files = ["tokenizer.json", "vocab.txt", "tokenizer_config.json", "special_tokens_map.json"];

        for file in required_files {
            let file_path = repo.get(file).await.map_err(|e| {
                ResumeAnalyzerError::ModelError(format!("Failed to download {}: {}", file, e))
            })?;
            Self::copy_into(&file_path, &dest.join(file)).await?;
        }

        for file in optional_files {
            match repo.get(file).await {
                Ok(file_path) => Self::copy_into(&file_path, &dest.join(file)).await?,
                Err(e) => debug!("Optional file {} not available: {}", file, e),
            }
        }

        let weights = match repo.get("model.safetensors").await {
            Ok(path) => ("model.safetensors", path),
            Err(e) => {
                debug!("No safetensors weights ({}), falling back to pytorch_model.bin", e);
                let path = repo.get("pytorch_model.bin").await.map_err(|e| {
                    ResumeAnalyzerError::ModelError(format!("Failed to download model weights: {}", e))
                })?;
                ("pytorch_model.bin", path)
            }
        };
        Self::copy_into(&weights.1, &dest.join(weights.0)).await
    }

    /// Move a completed staging directory into place, replacing any previous copy.
    ///
    /// An incomplete staging directory is discarded and the installed model,
    /// if any, is left untouched.
    async fn install_staged(&mut self, model_id: &str, staging_dir: &Path) -> Result<PathBuf> {
        if !Self::is_valid_model_directory(staging_dir).await {
            let _ = fs::remove_dir_all(staging_dir).await;
            return Err(ResumeAnalyzerError::ModelError(format!(
                "Model {} is incomplete after download",
                model_id
            )));
        }

        let model_dir = self.models_dir.join(model_id);
        if model_dir.exists() {
            fs::remove_dir_all(&model_dir).await.map_err(|e| {
                ResumeAnalyzerError::ModelError(format!("Failed to replace model: {}", e))
            })?;
        }
        fs::rename(staging_dir, &model_dir).await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to install model: {}", e))
        })?;

        self.downloaded_models.insert(model_id.to_string());
        info!("Model {} downloaded to {}", model_id, model_dir.display());
        Ok(model_dir)
    }

    async fn copy_into(source: &Path, dest: &Path) -> Result<()> {
        fs::copy(source, dest).await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to copy {}: {}", source.display(), e))
        })?;
        debug!("Downloaded: {}", dest.display());
        Ok(())
    }

    /// Delete a downloaded model directory
    pub async fn remove_model(&mut self, model_id: &str) -> Result<PathBuf> {
        if !self.downloaded_models.contains(model_id) {
            return Err(ResumeAnalyzerError::ModelNotFound(model_id.to_string()));
        }

        let model_dir = self.models_dir.join(model_id);
        fs::remove_dir_all(&model_dir).await.map_err(|e| {
            ResumeAnalyzerError::ModelError(format!("Failed to remove model: {}", e))
        })?;
        self.downloaded_models.remove(model_id);
        Ok(model_dir)
    }

    /// Get path to a downloaded model
    pub fn get_model_path(&self, model_id: &str) -> Option<PathBuf> {
        if self.downloaded_models.contains(model_id) {
            Some(self.models_dir.join(model_id))
        } else {
            None
        }
    }

    /// Catalog entries in id order
    pub fn list_available_models(&self) -> Vec<(&String, &ModelInfo)> {
        self.available_models.iter().collect()
    }

    pub fn get_model_info(&self, model_id: &str) -> Option<&ModelInfo> {
        self.available_models.get(model_id)
    }

    pub fn is_model_downloaded(&self, model_id: &str) -> bool {
        self.downloaded_models.contains(model_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_model_manager_creation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        assert_eq!(manager.list_available_models().len(), 2);
        assert!(!manager.is_model_downloaded("bert-base-ner"));
        assert!(manager.get_model_path("bert-base-ner").is_none());
        assert_eq!(
            manager.get_model_info("bert-base-ner").unwrap().repo_id,
            "dslim/bert-base-NER"
        );
    }

    #[tokio::test]
    async fn test_scan_finds_complete_model_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let complete = temp_dir.path().join("bert-base-ner");
        let partial = temp_dir.path().join("bert-large-ner");
        std::fs::create_dir_all(&complete).unwrap();
        std::fs::create_dir_all(&partial).unwrap();
        for file in ["config.json", "vocab.txt", "model.safetensors"] {
            std::fs::write(complete.join(file), b"{}").unwrap();
        }
        std::fs::write(partial.join("config.json"), b"{}").unwrap();

        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        assert!(manager.is_model_downloaded("bert-base-ner"));
        assert!(!manager.is_model_downloaded("bert-large-ner"));

        let removed = manager.remove_model("bert-base-ner").await.unwrap();
        assert!(!removed.exists());
        assert!(!manager.is_model_downloaded("bert-base-ner"));
    }

    #[tokio::test]
    async fn test_remove_unknown_model() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();

        let result = manager.remove_model("bert-large-ner").await;
        assert!(matches!(result, Err(ResumeAnalyzerError::ModelNotFound(_))));
    }

    fn write_model_files(dir: &Path, files: &[&str], contents: &[u8]) {
        std::fs::create_dir_all(dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), contents).unwrap();
        }
    }

    #[tokio::test]
    async fn test_incomplete_download_keeps_installed_model() {
        let temp_dir = TempDir::new().unwrap();
        let installed = temp_dir.path().join("bert-base-ner");
        write_model_files(&installed, &["config.json", "vocab.txt", "model.safetensors"], b"old");

        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        let staging = manager.staging_dir("bert-base-ner");
        write_model_files(&staging, &["config.json"], b"new");

        let result = manager.install_staged("bert-base-ner", &staging).await;

        assert!(matches!(result, Err(ResumeAnalyzerError::ModelError(_))));
        assert!(!staging.exists());
        assert!(manager.is_model_downloaded("bert-base-ner"));
        assert_eq!(std::fs::read(installed.join("config.json")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_complete_download_replaces_installed_model() {
        let temp_dir = TempDir::new().unwrap();
        let installed = temp_dir.path().join("bert-base-ner");
        write_model_files(&installed, &["config.json", "vocab.txt", "pytorch_model.bin"], b"old");

        let mut manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        let staging = manager.staging_dir("bert-base-ner");
        write_model_files(&staging, &["config.json", "tokenizer.json", "model.safetensors"], b"new");

        let model_dir = manager.install_staged("bert-base-ner", &staging).await.unwrap();

        assert_eq!(model_dir, installed);
        assert!(!staging.exists());
        assert_eq!(std::fs::read(installed.join("config.json")).unwrap(), b"new");
        assert!(!installed.join("pytorch_model.bin").exists());
    }

    #[tokio::test]
    async fn test_scan_ignores_staging_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let staging = temp_dir.path().join(".bert-large-ner.partial");
        write_model_files(&staging, &["config.json", "vocab.txt", "model.safetensors"], b"{}");

        let manager = ModelManager::new(temp_dir.path().to_path_buf()).await.unwrap();
        assert!(!manager.is_model_downloaded(".bert-large-ner.partial"));
        assert!(!manager.is_model_downloaded("bert-large-ner"));
    }
}
