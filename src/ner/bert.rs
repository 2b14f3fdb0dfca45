//! BERT token-classification NER running locally through Candle

use crate::error::{Result, ResumeAnalyzerError};
use crate::ner::{Entity, EntityRecognizer};
use candle_core::{Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use log::{debug, info, warn};
use std::path::Path;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::normalizers::BertNormalizer;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::{Encoding, Tokenizer};

/// Get the best available device for inference (GPU if available, CPU fallback)
pub fn get_best_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA GPU for NER inference");
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for NER inference");
                return device;
            }
            Err(e) => warn!("Metal GPU initialization failed: {}", e),
        }
    }

    debug!("Using CPU for NER inference");
    Device::Cpu
}

/// Get device with optional user override from `RESUME_ANALYZER_DEVICE`
pub fn get_device_with_override() -> Result<Device> {
    if let Ok(device_preference) = std::env::var("RESUME_ANALYZER_DEVICE") {
        match device_preference.to_lowercase().as_str() {
            "cuda" => {
                info!("Forcing CUDA usage (from environment)");
                #[cfg(feature = "cuda")]
                {
                    return Device::new_cuda(0).map_err(|e| {
                        ResumeAnalyzerError::ModelError(format!("Failed to initialize CUDA: {}", e))
                    });
                }
                #[cfg(not(feature = "cuda"))]
                {
                    return Err(ResumeAnalyzerError::ModelError(
                        "CUDA support not compiled in".to_string(),
                    ));
                }
            }
            "metal" => {
                info!("Forcing Metal usage (from environment)");
                #[cfg(feature = "metal")]
                {
                    return Device::new_metal(0).map_err(|e| {
                        ResumeAnalyzerError::ModelError(format!("Failed to initialize Metal: {}", e))
                    });
                }
                #[cfg(not(feature = "metal"))]
                {
                    return Err(ResumeAnalyzerError::ModelError(
                        "Metal support not compiled in".to_string(),
                    ));
                }
            }
            "cpu" => {
                info!("Forcing CPU usage (from environment)");
                return Ok(Device::Cpu);
            }
            _ => {
                warn!("Unknown device '{}', falling back to auto-detection", device_preference);
            }
        }
    }

    Ok(get_best_device())
}

/// One wordpiece with its predicted tag and byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
struct TokenPrediction {
    label: String,
    start: usize,
    end: usize,
    word: Option<u32>,
}

pub struct BertRecognizer {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: Vec<String>,
    device: Device,
    max_sequence_length: usize,
    cls_id: u32,
    sep_id: u32,
    name: String,
}

impl BertRecognizer {
    /// Load a token-classification checkpoint from a model directory.
    ///
    /// Expects `config.json` with an `id2label` map, `tokenizer.json` or
    /// `vocab.txt`, and `model.safetensors` or `pytorch_model.bin`.
    pub fn load(model_path: &Path, max_sequence_length: usize) -> Result<Self> {
        info!("Loading NER model from: {}", model_path.display());
        let device = get_device_with_override()?;

        let config_path = model_path.join("config.json");
        let config_content = std::fs::read_to_string(&config_path).map_err(|e| {
            ResumeAnalyzerError::ModelLoading(format!("Failed to read model config: {}", e))
        })?;
        let raw_config: serde_json::Value = serde_json::from_str(&config_content).map_err(|e| {
            ResumeAnalyzerError::ModelLoading(format!("Failed to parse model config: {}", e))
        })?;
        let bert_config: BertConfig = serde_json::from_value(raw_config.clone()).map_err(|e| {
            ResumeAnalyzerError::ModelLoading(format!("Unsupported BERT config: {}", e))
        })?;

        let id2label = parse_id2label(&raw_config)?;
        let hidden_size = raw_config["hidden_size"].as_u64().ok_or_else(|| {
            ResumeAnalyzerError::ModelLoading("config.json has no hidden_size".to_string())
        })? as usize;
        let model_limit = raw_config["max_position_embeddings"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(max_sequence_length);

        let tokenizer = load_tokenizer(model_path)?;
        let cls_id = special_token_id(&tokenizer, "[CLS]")?;
        let sep_id = special_token_id(&tokenizer, "[SEP]")?;

        let vb = load_weights(model_path, &device)?;
        let model = BertModel::load(vb.clone(), &bert_config)?;
        let classifier = candle_nn::linear(hidden_size, id2label.len(), vb.pp("classifier"))?;

        let name = model_path
            .file_name()
            .map(|n| format!("bert:{}", n.to_string_lossy()))
            .unwrap_or_else(|| "bert".to_string());

        info!("NER model loaded with {} labels", id2label.len());

        Ok(Self {
            model,
            classifier,
            tokenizer,
            id2label,
            device,
            max_sequence_length: max_sequence_length.min(model_limit).max(3),
            cls_id,
            sep_id,
            name,
        })
    }

    fn predict_window(&self, ids: &[u32]) -> Result<Vec<u32>> {
        let mut input = Vec::with_capacity(ids.len() + 2);
        input.push(self.cls_id);
        input.extend_from_slice(ids);
        input.push(self.sep_id);

        let input_ids = Tensor::new(input.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden)?;
        let predictions = logits.argmax(D::Minus1)?.squeeze(0)?.to_vec1::<u32>()?;

        // drop [CLS] and [SEP]
        Ok(predictions[1..predictions.len() - 1].to_vec())
    }

    fn label_for(&self, class_id: u32) -> String {
        self.id2label
            .get(class_id as usize)
            .cloned()
            .unwrap_or_else(|| "O".to_string())
    }
}

impl EntityRecognizer for BertRecognizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| ResumeAnalyzerError::EntityRecognition(format!("Tokenization failed: {}", e)))?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let windows = split_windows(&encoding, self.max_sequence_length - 2);
        debug!("Running NER over {} tokens in {} window(s)", ids.len(), windows.len());

        let mut predictions = Vec::with_capacity(ids.len());
        for (start, end) in windows {
            let classes = self.predict_window(&ids[start..end])?;
            for (offset, class_id) in classes.into_iter().enumerate() {
                let idx = start + offset;
                let (span_start, span_end) = encoding.get_offsets()[idx];
                predictions.push(TokenPrediction {
                    label: self.label_for(class_id),
                    start: span_start,
                    end: span_end,
                    word: encoding.get_word_ids()[idx],
                });
            }
        }

        Ok(aggregate_entities(text, &predictions))
    }
}

fn parse_id2label(config: &serde_json::Value) -> Result<Vec<String>> {
    let map = config["id2label"].as_object().ok_or_else(|| {
        ResumeAnalyzerError::ModelLoading(
            "config.json has no id2label map; not a token-classification model".to_string(),
        )
    })?;

    let mut labels = vec![String::new(); map.len()];
    for (id, label) in map {
        let idx: usize = id.parse().map_err(|_| {
            ResumeAnalyzerError::ModelLoading(format!("Invalid label id in id2label: {}", id))
        })?;
        let slot = labels.get_mut(idx).ok_or_else(|| {
            ResumeAnalyzerError::ModelLoading(format!("Label id {} out of range", idx))
        })?;
        *slot = label.as_str().unwrap_or("O").to_string();
    }
    Ok(labels)
}

fn load_tokenizer(model_path: &Path) -> Result<Tokenizer> {
    let tokenizer_path = model_path.join("tokenizer.json");
    let mut tokenizer = if tokenizer_path.exists() {
        Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            ResumeAnalyzerError::ModelLoading(format!("Failed to load tokenizer: {}", e))
        })?
    } else {
        // Older checkpoints ship only the WordPiece vocabulary
        let vocab_path = model_path.join("vocab.txt");
        let vocab = vocab_path.to_string_lossy().to_string();
        let wordpiece = WordPiece::from_file(&vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| {
                ResumeAnalyzerError::ModelLoading(format!("Failed to load vocab.txt: {}", e))
            })?;
        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::new(true, true, None, false)));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));
        tokenizer
    };

    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(None)
        .map_err(|e| ResumeAnalyzerError::ModelLoading(format!("Failed to configure tokenizer: {}", e)))?;
    Ok(tokenizer)
}

fn special_token_id(tokenizer: &Tokenizer, token: &str) -> Result<u32> {
    tokenizer.token_to_id(token).ok_or_else(|| {
        ResumeAnalyzerError::ModelLoading(format!("Tokenizer has no {} token", token))
    })
}

fn load_weights(model_path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors_path = model_path.join("model.safetensors");
    if safetensors_path.exists() {
        debug!("Loading safetensors weights");
        // SAFETY: the weights file is not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors_path], DTYPE, device)? };
        return Ok(vb);
    }

    let pth_path = model_path.join("pytorch_model.bin");
    if pth_path.exists() {
        debug!("Loading PyTorch weights");
        return Ok(VarBuilder::from_pth(&pth_path, DTYPE, device)?);
    }

    Err(ResumeAnalyzerError::ModelLoading(format!(
        "No model weights found in {}",
        model_path.display()
    )))
}

/// Token windows of at most `window` tokens, preferring not to cut a word.
fn split_windows(encoding: &Encoding, window: usize) -> Vec<(usize, usize)> {
    let word_ids = encoding.get_word_ids();
    window_bounds(word_ids, window)
}

fn window_bounds(word_ids: &[Option<u32>], window: usize) -> Vec<(usize, usize)> {
    let total = word_ids.len();
    let window = window.max(1);
    let mut bounds = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + window).min(total);
        if end < total {
            let mut candidate = end;
            while candidate > start
                && word_ids[candidate].is_some()
                && word_ids[candidate] == word_ids[candidate - 1]
            {
                candidate -= 1;
            }
            // a single word longer than the window has to be cut
            if candidate > start {
                end = candidate;
            }
        }
        bounds.push((start, end));
        start = end;
    }

    bounds
}

fn split_label(label: &str) -> (Option<char>, &str) {
    match label.split_once('-') {
        Some((prefix, kind)) if prefix.len() == 1 => (prefix.chars().next(), kind),
        _ => (None, label),
    }
}

/// Merge BIO-tagged wordpieces into entity spans.
///
/// A word's continuation pieces always extend the span its first piece
/// opened. `I-X` continues a running `X` span; `B-X`, or `I-X` after a
/// different type, starts a new one.
fn aggregate_entities(text: &str, tokens: &[TokenPrediction]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut current: Option<(String, usize, usize)> = None;
    let mut prev_word = None;

    let flush = |span: Option<(String, usize, usize)>, entities: &mut Vec<Entity>| {
        if let Some((label, start, end)) = span {
            if let Some(surface) = text.get(start..end) {
                let surface = surface.trim();
                if !surface.is_empty() {
                    entities.push(Entity::new(surface, label));
                }
            }
        }
    };

    for token in tokens {
        let same_word = token.word.is_some() && token.word == prev_word;
        prev_word = token.word;

        if same_word {
            if let Some((_, _, end)) = current.as_mut() {
                *end = token.end;
            }
            continue;
        }

        let (prefix, kind) = split_label(&token.label);
        if kind == "O" {
            flush(current.take(), &mut entities);
            continue;
        }

        match current.as_mut() {
            Some((label, _, end)) if prefix != Some('B') && label.as_str() == kind => {
                *end = token.end;
            }
            _ => {
                flush(current.take(), &mut entities);
                current = Some((kind.to_string(), token.start, token.end));
            }
        }
    }
    flush(current.take(), &mut entities);

    entities
}
