//! Stratified sampling of videos by view-count tier.
//!
//! Each tier is filled by repeated random keyword searches. Candidates are
//! kept when their view count falls in the tier's half-open range and a
//! non-empty transcript can be fetched. Rate limits cost a fixed penalty;
//! every iteration ends with a random throttle pause.

use std::{collections::HashSet, io::Write};

use rand::{Rng, seq::SliceRandom};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    config::{SamplerConfig, Tier},
    csv_io::VideoCsvWriter,
    error::Result,
    fetch::fetch_transcript,
    format::format_tier_range,
    source::{ErrorKind, TranscriptSource, VideoSource},
    types::VideoRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    Complete,
    /// An attempt or time bound tripped before the tier filled.
    QuotaNotMet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSample {
    pub tier: String,
    pub needed: usize,
    pub records: Vec<VideoRecord>,
    pub attempts: u32,
    pub status: SampleStatus,
}

impl TierSample {
    pub fn is_complete(&self) -> bool {
        self.status == SampleStatus::Complete
    }
}

/// Drives the sampling loop for one tier at a time.
pub struct StratifiedSampler<'a, V: ?Sized, T: ?Sized, R> {
    videos: &'a V,
    transcripts: &'a T,
    config: &'a SamplerConfig,
    rng: R,
    /// Ids accepted by earlier tiers of the same run.
    accepted: HashSet<String>,
}

impl<'a, V, T, R> StratifiedSampler<'a, V, T, R>
where
    V: VideoSource + ?Sized,
    T: TranscriptSource + ?Sized,
    R: Rng,
{
    pub fn new(videos: &'a V, transcripts: &'a T, config: &'a SamplerConfig, rng: R) -> Self {
        Self {
            videos,
            transcripts,
            config,
            rng,
            accepted: HashSet::new(),
        }
    }

    fn out_of_budget(&self, attempts: u32, started: Instant) -> bool {
        self.config.max_attempts.is_some_and(|max| attempts >= max)
            || self
                .config
                .max_duration
                .is_some_and(|max| started.elapsed() >= max)
    }

    /// Fill `needed` videos for `tier`.
    pub async fn sample_tier(&mut self, tier: &Tier, needed: usize) -> TierSample {
        info!(
            "START tier '{}': views ∈ {}, need {}",
            tier.name,
            format_tier_range(tier),
            needed
        );

        let mut records: Vec<VideoRecord> = Vec::new();
        let mut collected: HashSet<String> = HashSet::new();
        let mut attempts = 0u32;
        let started = Instant::now();

        while records.len() < needed {
            if self.out_of_budget(attempts, started) {
                warn!(
                    "tier '{}' stopped after {} searches with {}/{} videos",
                    tier.name,
                    attempts,
                    records.len(),
                    needed
                );
                break;
            }

            attempts += 1;
            let Some(query) = self.config.queries.choose(&mut self.rng).cloned() else {
                warn!("no search keywords configured");
                break;
            };
            info!(
                "Iteration {attempts}: searching 'ytsearch{}:{query}'",
                self.config.batch_size
            );

            let entries = match self.videos.search(&query, self.config.batch_size).await {
                Ok(entries) => entries,
                Err(e) if e.kind == ErrorKind::RateLimited => {
                    warn!(
                        "RATE-LIMITED by YouTube; sleeping {}s before retry",
                        self.config.rate_limit_penalty.as_secs()
                    );
                    tokio::time::sleep(self.config.rate_limit_penalty).await;
                    continue;
                }
                Err(e) => {
                    warn!(
                        "search failed ({e}); sleeping {}s before retry",
                        self.config.error_penalty.as_secs()
                    );
                    tokio::time::sleep(self.config.error_penalty).await;
                    continue;
                }
            };
            debug!("Retrieved {} entries, filtering", entries.len());

            for entry in &entries {
                let Some(video_id) = entry.id.as_deref().filter(|id| !id.is_empty()) else {
                    continue;
                };
                let views = entry.views();
                if collected.contains(video_id)
                    || self.accepted.contains(video_id)
                    || !tier.contains(views)
                {
                    continue;
                }

                let transcript = match fetch_transcript(self.transcripts, video_id).await {
                    Ok(text) => text,
                    Err(e) if e.kind == ErrorKind::TranscriptDisabled => continue,
                    Err(e) => {
                        warn!("Skipping {video_id}: transcript error ({e})");
                        continue;
                    }
                };

                collected.insert(video_id.to_string());
                records.push(VideoRecord::from_entry(video_id, entry, transcript));
                info!(
                    "Accepted {video_id} (views={views}), {}/{needed}",
                    records.len()
                );

                if records.len() >= needed {
                    break;
                }
            }

            let pause = self.config.pause.sample(&mut self.rng);
            debug!("Sleeping {:.1}s before next iteration", pause.as_secs_f64());
            tokio::time::sleep(pause).await;
        }

        self.accepted.extend(collected);
        let status = if records.len() >= needed {
            SampleStatus::Complete
        } else {
            SampleStatus::QuotaNotMet
        };
        info!(
            "COMPLETED tier '{}': collected {} videos",
            tier.name,
            records.len()
        );

        TierSample {
            tier: tier.name.clone(),
            needed,
            records,
            attempts,
            status,
        }
    }

    /// Sample every configured tier in order, appending each tier's rows to
    /// `writer` as soon as it finishes.
    pub async fn sample_all<W: Write>(
        &mut self,
        writer: &mut VideoCsvWriter<W>,
    ) -> Result<Vec<TierSample>> {
        let config = self.config;
        let mut samples = Vec::with_capacity(config.tiers.len());
        for tier in config.tiers.iter() {
            info!("===== Sampling tier '{}' =====", tier.name);
            let sample = self.sample_tier(tier, config.target_per_tier).await;
            for record in &sample.records {
                writer.write(record)?;
            }
            samples.push(sample);
        }
        Ok(samples)
    }
}
