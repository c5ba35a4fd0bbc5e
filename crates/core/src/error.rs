use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum VidmoodError {
    #[error("Could not retrieve uploads for {url}: {reason}")]
    ChannelListingFailed { url: String, reason: String },

    #[error("No videos found on {url}")]
    EmptyChannel { url: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid tier configuration: {reason}")]
    InvalidTiers { reason: String },

    #[error("Expected input file {0}")]
    MissingInput(PathBuf),

    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Transcript has no content after tokenization")]
    NoContent,

    #[error("Model download failed for {url}: {reason}")]
    ModelDownloadFailed { url: String, reason: String },

    #[error("Model failed: {reason}")]
    ModelFailed { reason: String },

    #[error("Could not parse model reply '{reply}': {reason}")]
    ReplyParse { reply: String, reason: String },

    #[error("Completion request failed: {reason}")]
    CompletionFailed { reason: String },

    #[error("Completion request was rate limited: {reason}")]
    CompletionRateLimited { reason: String },

    #[error("Plot rendering failed: {reason}")]
    PlotFailed { reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Tensor error: {0}")]
    TensorError(#[from] candle_core::Error),
}

pub type Result<T> = std::result::Result<T, VidmoodError>;
