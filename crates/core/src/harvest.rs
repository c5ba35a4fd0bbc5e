use std::{collections::HashSet, io::Write};

use rand::Rng;
use tracing::{info, warn};

use crate::{
    config::ChannelHarvestConfig,
    csv_io::VideoCsvWriter,
    error::{Result, VidmoodError},
    fetch::{fetch_metadata_with_retry, fetch_transcript},
    source::{ErrorKind, TranscriptSource, VideoSource},
    types::VideoRecord,
};

const UPLOADS_SUFFIX: &str = "/videos";

/// Turn a channel handle, custom-name or channel-ID URL into its uploads
/// listing by appending `/videos` when missing.
pub fn normalize_channel_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with(UPLOADS_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{UPLOADS_SUFFIX}")
    }
}

/// Ordered, de-duplicated upload ids for a channel.
///
/// A failed listing or an empty channel aborts the harvest.
pub async fn list_upload_ids<V>(source: &V, channel_url: &str) -> Result<Vec<String>>
where
    V: VideoSource + ?Sized,
{
    let entries = source.list_uploads(channel_url).await.map_err(|e| {
        VidmoodError::ChannelListingFailed {
            url: channel_url.to_string(),
            reason: e.to_string(),
        }
    })?;

    if entries.is_empty() {
        return Err(VidmoodError::EmptyChannel {
            url: channel_url.to_string(),
        });
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match entry.id.filter(|id| !id.is_empty()) {
            Some(id) if seen.insert(id.clone()) => ids.push(id),
            Some(id) => warn!(video_id = %id, "duplicate entry in uploads listing, skipping"),
            None => warn!("entry #{} has no id, skipping", idx + 1),
        }
    }
    Ok(ids)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub listed: usize,
    pub processed: usize,
    pub skipped_no_transcript: usize,
    pub skipped_metadata: usize,
}

/// Harvest every upload of one channel into `writer`: transcript first,
/// metadata second, one row per video with a usable transcript.
pub async fn harvest_channel<V, T, W, R>(
    videos: &V,
    transcripts: &T,
    config: &ChannelHarvestConfig,
    writer: &mut VideoCsvWriter<W>,
    rng: &mut R,
) -> Result<HarvestReport>
where
    V: VideoSource + ?Sized,
    T: TranscriptSource + ?Sized,
    W: Write,
    R: Rng + ?Sized,
{
    let uploads_url = normalize_channel_url(&config.channel_url);
    info!("Normalized channel URL → {uploads_url}");

    let ids = list_upload_ids(videos, &uploads_url).await?;
    let total = ids.len();
    info!("Found {total} videos on the channel");

    let mut report = HarvestReport {
        listed: total,
        ..Default::default()
    };

    for (idx, video_id) in ids.iter().enumerate() {
        info!("Processing video {}/{}: {}", idx + 1, total, video_id);

        match fetch_transcript(transcripts, video_id).await {
            Ok(transcript) => {
                match fetch_metadata_with_retry(videos, video_id, config.rate_limit_penalty).await
                {
                    Ok(entry) => {
                        writer.write(&VideoRecord::from_entry(video_id, &entry, transcript))?;
                        report.processed += 1;
                    }
                    Err(e) => {
                        warn!(video_id = %video_id, "metadata unavailable ({e}); skipping");
                        report.skipped_metadata += 1;
                    }
                }
            }
            Err(e) if e.kind == ErrorKind::TranscriptDisabled => {
                info!(video_id = %video_id, "no transcript available; skipping");
                report.skipped_no_transcript += 1;
            }
            Err(e) => {
                warn!(video_id = %video_id, "transcript error ({e}); skipping");
                report.skipped_no_transcript += 1;
            }
        }

        if idx + 1 < total {
            tokio::time::sleep(config.pause.sample(rng)).await;
        }
    }

    info!(
        processed = report.processed,
        skipped_no_transcript = report.skipped_no_transcript,
        skipped_metadata = report.skipped_metadata,
        "channel harvest finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_url_gains_videos_suffix() {
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@CosmicSkeptic"),
            "https://www.youtube.com/@CosmicSkeptic/videos"
        );
    }

    #[test]
    fn custom_and_channel_id_urls_are_normalized() {
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/c/CustomName/"),
            "https://www.youtube.com/c/CustomName/videos"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/channel/UCabc123"),
            "https://www.youtube.com/channel/UCabc123/videos"
        );
    }

    #[test]
    fn existing_suffix_is_kept() {
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@x/videos/"),
            "https://www.youtube.com/@x/videos"
        );
        assert_eq!(
            normalize_channel_url("https://www.youtube.com/@x/videos"),
            "https://www.youtube.com/@x/videos"
        );
    }

    #[test]
    fn malformed_input_is_passed_through_best_effort() {
        assert_eq!(normalize_channel_url("not a url"), "not a url/videos");
    }
}
