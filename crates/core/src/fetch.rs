use std::time::Duration;

use tracing::warn;

use crate::{
    source::{ErrorKind, ServiceError, ServiceResult, TranscriptSource, VideoSource},
    types::VideoEntry,
};

/// Caption segments joined with single spaces.
///
/// Fails with [`ErrorKind::TranscriptDisabled`] when the video has no
/// captions and with [`ErrorKind::Empty`] when the joined text is blank.
pub async fn fetch_transcript<T>(source: &T, video_id: &str) -> ServiceResult<String>
where
    T: TranscriptSource + ?Sized,
{
    let segments = source.caption_segments(video_id).await?;
    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();

    if text.is_empty() {
        return Err(ServiceError::new(
            ErrorKind::Empty,
            format!("empty transcript for {video_id}"),
        ));
    }
    Ok(text)
}

/// Metadata lookup that sits out one `penalty` and retries exactly once when
/// the first attempt is rate limited.
pub async fn fetch_metadata_with_retry<V>(
    source: &V,
    video_id: &str,
    penalty: Duration,
) -> ServiceResult<VideoEntry>
where
    V: VideoSource + ?Sized,
{
    match source.video_metadata(video_id).await {
        Err(e) if e.is_rate_limited() => {
            warn!(
                video_id,
                "rate-limited fetching metadata; sleeping {}s",
                penalty.as_secs()
            );
            tokio::time::sleep(penalty).await;
            source.video_metadata(video_id).await
        }
        other => other,
    }
}
