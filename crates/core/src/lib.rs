pub mod analysis;
pub mod cache;
pub mod config;
pub mod csv_io;
pub mod error;
pub mod fetch;
pub mod format;
pub mod harvest;
pub mod provider;
pub mod sampler;
pub mod sentiment;
pub mod source;
pub mod types;

pub use analysis::{CORRELATION_COLUMNS, CorrelationMatrix, correlation_matrix, scatter_plot};
pub use cache::get_root_cache_dir;
pub use config::{
    ChannelHarvestConfig, LlmConfig, PauseRange, SamplerConfig, Tier, TierSet, TransformerConfig,
};
pub use csv_io::{Table, VideoCsvWriter};
pub use error::{Result, VidmoodError};
pub use format::{format_correlation_matrix, format_tier_range, format_view_count};
pub use harvest::{HarvestReport, harvest_channel, normalize_channel_url};
pub use provider::{Provider, ProviderConfig};
pub use sampler::{SampleStatus, StratifiedSampler, TierSample};
pub use source::{
    ErrorKind, ServiceError, TranscriptSource, VideoSource, YoutubeCaptions, YtDlp,
};
pub use types::{CaptionSegment, LlmRatings, TransformerScore, VideoEntry, VideoRecord};
