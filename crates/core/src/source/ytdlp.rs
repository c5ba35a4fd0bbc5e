use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use crate::{
    source::{ErrorKind, ServiceError, ServiceResult, VideoSource},
    types::VideoEntry,
};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}

/// Map yt-dlp's stderr onto an [`ErrorKind`].
pub fn classify_failure(stderr: &str) -> ErrorKind {
    let msg = stderr.to_lowercase();
    if msg.contains("rate-limited")
        || msg.contains("rate limited")
        || msg.contains("http error 429")
        || msg.contains("too many requests")
    {
        ErrorKind::RateLimited
    } else if msg.contains("video unavailable")
        || msg.contains("private video")
        || msg.contains("does not exist")
        || msg.contains("http error 404")
    {
        ErrorKind::NotFound
    } else {
        ErrorKind::Unknown
    }
}

#[derive(Deserialize)]
struct Playlist {
    #[serde(default)]
    entries: Vec<Option<VideoEntry>>,
}

/// [`VideoSource`] backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    limit_rate: String,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlp {
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".into(),
            limit_rate: "500K".into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub(crate) async fn dump_json<T: DeserializeOwned>(
        &self,
        target: &str,
        flat: bool,
    ) -> ServiceResult<T> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-check-certificates")
            .arg("--limit-rate")
            .arg(&self.limit_rate);
        if flat {
            cmd.arg("--flat-playlist");
        }
        cmd.arg("--").arg(target);

        debug!(url = target, flat, "running yt-dlp");
        let output = cmd.output().await.map_err(|e| {
            ServiceError::new(
                ErrorKind::Unknown,
                format!("failed to execute {}: {e}", self.program),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ServiceError::new(classify_failure(&stderr), stderr));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            ServiceError::new(
                ErrorKind::Unknown,
                format!("unparsable yt-dlp output for {target}: {e}"),
            )
        })
    }
}

#[async_trait]
impl VideoSource for YtDlp {
    async fn list_uploads(&self, channel_url: &str) -> ServiceResult<Vec<VideoEntry>> {
        let playlist: Playlist = self.dump_json(channel_url, true).await?;
        Ok(playlist.entries.into_iter().flatten().collect())
    }

    async fn search(&self, query: &str, batch_size: usize) -> ServiceResult<Vec<VideoEntry>> {
        let target = format!("ytsearch{batch_size}:{query}");
        let playlist: Playlist = self.dump_json(&target, false).await?;
        Ok(playlist.entries.into_iter().flatten().collect())
    }

    async fn video_metadata(&self, video_id: &str) -> ServiceResult<VideoEntry> {
        self.dump_json(&watch_url(video_id), false).await
    }
}
