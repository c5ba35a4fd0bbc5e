//! Seams to the external video and caption services.
//!
//! Adapters classify provider failures into an [`ErrorKind`] once, so the
//! pipelines branch on the kind instead of on message text.

mod captions;
mod ytdlp;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{CaptionSegment, VideoEntry};

pub use captions::YoutubeCaptions;
pub use ytdlp::{YtDlp, classify_failure, watch_url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    NotFound,
    TranscriptDisabled,
    Empty,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::NotFound => "not found",
            ErrorKind::TranscriptDisabled => "transcript disabled",
            ErrorKind::Empty => "empty",
            ErrorKind::Unknown => "service error",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ErrorKind::RateLimited
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Listing, search and metadata lookups.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// All uploads on a canonical `/videos` listing page, in listing order.
    async fn list_uploads(&self, channel_url: &str) -> ServiceResult<Vec<VideoEntry>>;

    /// Up to `batch_size` search results for `query`.
    async fn search(&self, query: &str, batch_size: usize) -> ServiceResult<Vec<VideoEntry>>;

    async fn video_metadata(&self, video_id: &str) -> ServiceResult<VideoEntry>;
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Caption segments in playback order.
    async fn caption_segments(&self, video_id: &str) -> ServiceResult<Vec<CaptionSegment>>;
}
