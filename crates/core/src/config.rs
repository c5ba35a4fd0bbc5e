use std::{path::PathBuf, time::Duration};

use rand::Rng;

use crate::{
    error::{Result, VidmoodError},
    provider::Provider,
};

/// Random throttle pause, drawn uniformly from `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseRange {
    pub min: Duration,
    pub max: Duration,
}

impl PauseRange {
    /// Reversed bounds are swapped.
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// Bounds must be finite and non-negative.
    pub fn from_secs(min: f64, max: f64) -> Result<Self> {
        Ok(Self::new(seconds(min)?, seconds(max)?))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

/// Finite, non-negative seconds; anything else is `InvalidConfig`.
pub fn seconds(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| VidmoodError::InvalidConfig {
        reason: format!("{secs} seconds: {e}"),
    })
}

/// A view-count bucket `[min_views, max_views)`; `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub name: String,
    pub min_views: u64,
    pub max_views: Option<u64>,
}

impl Tier {
    pub fn new(name: impl Into<String>, min_views: u64, max_views: Option<u64>) -> Self {
        Self {
            name: name.into(),
            min_views,
            max_views,
        }
    }

    pub fn contains(&self, views: u64) -> bool {
        views >= self.min_views && self.max_views.is_none_or(|max| views < max)
    }
}

/// Tiers that cover `[0, ∞)` without gaps or overlaps, kept in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSet {
    tiers: Vec<Tier>,
}

impl TierSet {
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        let invalid = |reason: String| Err(VidmoodError::InvalidTiers { reason });

        if tiers.is_empty() {
            return invalid("at least one tier is required".into());
        }

        let mut sorted: Vec<&Tier> = tiers.iter().collect();
        sorted.sort_by_key(|t| t.min_views);

        if sorted[0].min_views != 0 {
            return invalid(format!(
                "lowest tier '{}' starts at {}, not 0",
                sorted[0].name, sorted[0].min_views
            ));
        }

        for pair in sorted.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            match lower.max_views {
                Some(max) if max == upper.min_views => {}
                Some(max) => {
                    return invalid(format!(
                        "tier '{}' ends at {} but '{}' starts at {}",
                        lower.name, max, upper.name, upper.min_views
                    ));
                }
                None => {
                    return invalid(format!(
                        "unbounded tier '{}' overlaps '{}'",
                        lower.name, upper.name
                    ));
                }
            }
        }

        for tier in &tiers {
            if tier.max_views.is_some_and(|max| max <= tier.min_views) {
                return invalid(format!("tier '{}' has an empty range", tier.name));
            }
        }

        if let Some(last) = sorted.last()
            && last.max_views.is_some()
        {
            return invalid(format!("highest tier '{}' must be unbounded", last.name));
        }

        Ok(Self { tiers })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tier> {
        self.tiers.iter()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    pub fn tier_for(&self, views: u64) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.contains(views))
    }
}

impl Default for TierSet {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new("viral", 1_000_000, None),
                Tier::new("popular", 100_000, Some(1_000_000)),
                Tier::new("mid", 10_000, Some(100_000)),
                Tier::new("niche", 0, Some(10_000)),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelHarvestConfig {
    pub channel_url: String,
    pub output: PathBuf,
    pub pause: PauseRange,
    pub rate_limit_penalty: Duration,
}

impl Default for ChannelHarvestConfig {
    fn default() -> Self {
        Self {
            channel_url: "https://www.youtube.com/@CosmicSkeptic".into(),
            output: PathBuf::from("channel_videos.csv"),
            pause: PauseRange::new(Duration::from_secs(1), Duration::from_millis(2500)),
            rate_limit_penalty: Duration::from_secs(60),
        }
    }
}

pub const DEFAULT_QUERIES: [&str; 10] = [
    "the", "and", "vlog", "news", "how", "review", "music", "fun", "daily", "life",
];

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub queries: Vec<String>,
    pub batch_size: usize,
    pub target_per_tier: usize,
    pub tiers: TierSet,
    pub pause: PauseRange,
    pub rate_limit_penalty: Duration,
    pub error_penalty: Duration,
    /// Give up on a tier after this many searches.
    pub max_attempts: Option<u32>,
    /// Give up on a tier after this much wall-clock time.
    pub max_duration: Option<Duration>,
    pub output: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            batch_size: 50,
            target_per_tier: 50,
            tiers: TierSet::default(),
            pause: PauseRange::new(Duration::from_secs(1), Duration::from_secs(3)),
            rate_limit_penalty: Duration::from_secs(60),
            error_penalty: Duration::from_secs(10),
            max_attempts: None,
            max_duration: None,
            output: PathBuf::from("youtube_stratified_sample.csv"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Hugging Face repo holding `config.json` and `model.safetensors`.
    pub model_repo: String,
    /// Hugging Face repo holding the matching `tokenizer.json`.
    pub tokenizer_repo: String,
    pub cache_dir: PathBuf,
    pub force_download: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("youtube_stratified_sample.csv"),
            output: PathBuf::from("youtube_with_transformer_sentiment.csv"),
            model_repo: "distilbert/distilbert-base-uncased-finetuned-sst-2-english".into(),
            tokenizer_repo: "distilbert/distilbert-base-uncased".into(),
            cache_dir: crate::cache::get_root_cache_dir(),
            force_download: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub provider: Provider,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    /// Wait before the single retry of a rate-limited request.
    pub rate_limit_penalty: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("youtube_with_sentiment.csv"),
            output: PathBuf::from("youtube_with_llm_scores.csv"),
            provider: Provider::default(),
            model: None,
            rate_limit_penalty: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn tier_upper_bound_belongs_to_next_tier() {
        let tiers = TierSet::default();
        assert_eq!(tiers.tier_for(99_999).unwrap().name, "mid");
        assert_eq!(tiers.tier_for(100_000).unwrap().name, "popular");
        assert_eq!(tiers.tier_for(999_999).unwrap().name, "popular");
        assert_eq!(tiers.tier_for(1_000_000).unwrap().name, "viral");
        assert_eq!(tiers.tier_for(0).unwrap().name, "niche");
        assert_eq!(tiers.tier_for(u64::MAX).unwrap().name, "viral");
    }

    #[test]
    fn default_tiers_pass_validation() {
        let tiers: Vec<Tier> = TierSet::default().iter().cloned().collect();
        assert!(TierSet::new(tiers).is_ok());
    }

    #[test]
    fn tier_gap_is_rejected() {
        let err = TierSet::new(vec![
            Tier::new("low", 0, Some(10)),
            Tier::new("high", 20, None),
        ])
        .unwrap_err();
        assert!(matches!(err, VidmoodError::InvalidTiers { .. }));
    }

    #[test]
    fn tier_overlap_is_rejected() {
        assert!(
            TierSet::new(vec![
                Tier::new("low", 0, Some(30)),
                Tier::new("high", 20, None),
            ])
            .is_err()
        );
        assert!(
            TierSet::new(vec![Tier::new("a", 0, None), Tier::new("b", 0, None)]).is_err()
        );
    }

    #[test]
    fn tiers_must_start_at_zero_and_end_unbounded() {
        assert!(TierSet::new(vec![Tier::new("x", 5, None)]).is_err());
        assert!(TierSet::new(vec![Tier::new("x", 0, Some(5))]).is_err());
        assert!(TierSet::new(vec![]).is_err());
    }

    #[test]
    fn pause_stays_within_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = PauseRange::from_secs(1.0, 3.0).unwrap();
        for _ in 0..100 {
            let pause = range.sample(&mut rng);
            assert!(pause >= Duration::from_secs(1) && pause <= Duration::from_secs(3));
        }
    }

    #[test]
    fn reversed_pause_bounds_are_swapped() {
        let range = PauseRange::from_secs(2.5, 1.0).unwrap();
        assert_eq!(range.min, Duration::from_secs(1));
        assert_eq!(range.max, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn non_finite_or_negative_pause_is_rejected() {
        for (min, max) in [
            (1.0, f64::INFINITY),
            (f64::NAN, 2.0),
            (-1.0, 2.0),
            (1.0, f64::NEG_INFINITY),
        ] {
            assert!(matches!(
                PauseRange::from_secs(min, max),
                Err(VidmoodError::InvalidConfig { .. })
            ));
        }
        assert_eq!(seconds(0.0).unwrap(), Duration::ZERO);
    }
}
