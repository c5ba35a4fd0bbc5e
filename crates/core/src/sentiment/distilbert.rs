//! DistilBERT fine-tuned on SST-2, run on CPU with candle.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder, linear};
use candle_transformers::models::distilbert::{Config, DTYPE, DistilBertModel};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tokio::fs;
use tracing::{debug, info};

use crate::{
    cache::{MODEL_CONFIG_FILE, MODEL_WEIGHTS_FILE, TOKENIZER_FILE, get_model_dir, hub_file_url},
    config::TransformerConfig,
    error::{Result, VidmoodError},
    sentiment::transformer::{SequenceClassifier, TokenEncoder},
};

const MAX_INPUT_LEN: usize = 512;

/// Local paths of everything the classifier needs.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
}

async fn download(url: &str, dest: &Path, force: bool) -> Result<()> {
    if dest.is_file() && !force {
        debug!("using cached {}", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    info!("downloading {url}");
    let failed = |reason: String| VidmoodError::ModelDownloadFailed {
        url: url.to_string(),
        reason,
    };
    let bytes = reqwest::get(url)
        .await?
        .error_for_status()
        .map_err(|e| failed(e.to_string()))?
        .bytes()
        .await?;

    // A partial file never takes the cached name.
    let partial = dest.with_extension("part");
    fs::write(&partial, &bytes).await?;
    fs::rename(&partial, dest).await?;
    Ok(())
}

/// Fetch model config, weights and tokenizer into the cache when missing.
pub async fn ensure_model(config: &TransformerConfig) -> Result<ModelFiles> {
    let model_dir = get_model_dir(&config.cache_dir, &config.model_repo);
    let tokenizer_dir = get_model_dir(&config.cache_dir, &config.tokenizer_repo);
    let files = ModelFiles {
        config: model_dir.join(MODEL_CONFIG_FILE),
        weights: model_dir.join(MODEL_WEIGHTS_FILE),
        tokenizer: tokenizer_dir.join(TOKENIZER_FILE),
    };

    for (repo, file, dest) in [
        (&config.model_repo, MODEL_CONFIG_FILE, &files.config),
        (&config.model_repo, MODEL_WEIGHTS_FILE, &files.weights),
        (&config.tokenizer_repo, TOKENIZER_FILE, &files.tokenizer),
    ] {
        download(&hub_file_url(repo, file), dest, config.force_download).await?;
    }
    Ok(files)
}

/// candle keeps `Config` fields private; the head needs the hidden size.
#[derive(Deserialize)]
struct HiddenSize {
    dim: usize,
}

pub struct DistilBertSst2 {
    tokenizer: Tokenizer,
    cls_id: u32,
    sep_id: u32,
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    device: Device,
}

impl DistilBertSst2 {
    pub fn load(files: &ModelFiles) -> Result<Self> {
        let model_failed = |reason: String| VidmoodError::ModelFailed { reason };

        let mut tokenizer =
            Tokenizer::from_file(&files.tokenizer).map_err(|e| model_failed(e.to_string()))?;
        tokenizer
            .with_truncation(None)
            .map_err(|e| model_failed(e.to_string()))?;
        tokenizer.with_padding(None);
        let special = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| model_failed(format!("tokenizer has no {token} token")))
        };
        let (cls_id, sep_id) = (special("[CLS]")?, special("[SEP]")?);

        let raw_config = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&raw_config)?;
        let HiddenSize { dim } = serde_json::from_str(&raw_config)?;

        let device = Device::Cpu;
        // SAFETY: the weights file is owned by our cache and not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights.as_path()], DTYPE, &device)?
        };
        let model = DistilBertModel::load(vb.clone(), &config)?;
        let pre_classifier = linear(dim, dim, vb.pp("pre_classifier"))?;
        let classifier = linear(dim, 2, vb.pp("classifier"))?;

        info!("loaded DistilBERT classifier (hidden size {dim})");
        Ok(Self {
            tokenizer,
            cls_id,
            sep_id,
            model,
            pre_classifier,
            classifier,
            device,
        })
    }
}

impl TokenEncoder for DistilBertSst2 {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| VidmoodError::ModelFailed {
                reason: e.to_string(),
            })?;
        Ok(encoding.get_ids().to_vec())
    }

    fn cls_id(&self) -> u32 {
        self.cls_id
    }

    fn sep_id(&self) -> u32 {
        self.sep_id
    }

    fn max_input_len(&self) -> usize {
        MAX_INPUT_LEN
    }
}

impl SequenceClassifier for DistilBertSst2 {
    fn logits(&self, input_ids: &[u32]) -> Result<[f32; 2]> {
        let len = input_ids.len();
        let input = Tensor::new(input_ids, &self.device)?.unsqueeze(0)?;
        // Non-zero entries are masked out; a single unpadded sequence needs none.
        let mask = Tensor::zeros((len, len), DType::U8, &self.device)?;

        let hidden = self.model.forward(&input, &mask)?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pre_classifier.forward(&cls)?.relu()?;
        let logits = self
            .classifier
            .forward(&pooled)?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;

        match logits.as_slice() {
            [neg, pos] => Ok([*neg, *pos]),
            other => Err(VidmoodError::ModelFailed {
                reason: format!("expected 2 logits, got {}", other.len()),
            }),
        }
    }
}
