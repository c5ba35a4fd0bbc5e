mod common;

use std::collections::HashSet;

use common::{FakeCaptions, FakeYoutube, entry};
use rand::{SeedableRng, rngs::StdRng};
use vidmood_core::{
    PauseRange, SampleStatus, SamplerConfig, StratifiedSampler, Tier, TierSet, VideoCsvWriter,
    csv_io::read_video_records,
};

fn quick_config() -> SamplerConfig {
    SamplerConfig {
        pause: PauseRange::from_secs(1.0, 3.0).unwrap(),
        max_attempts: Some(20),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn only_in_range_candidates_fill_the_tier() {
    let first = vec![entry("low", 5_000), entry("mid", 50_000), entry("high", 150_000)];
    let youtube = FakeYoutube::with_searches(vec![
        first.clone(),
        first.clone(),
        vec![entry("high2", 100_000), entry("mid2", 80_000)],
    ]);
    let captions = FakeCaptions::default()
        .with("low", &["a"])
        .with("mid", &["b"])
        .with("high", &["c"])
        .with("high2", &["d"])
        .with("mid2", &["e"]);
    let config = quick_config();
    let tier = Tier::new("mid", 10_000, Some(100_000));

    let mut sampler = StratifiedSampler::new(&youtube, &captions, &config, StdRng::seed_from_u64(3));
    let sample = sampler.sample_tier(&tier, 2).await;

    assert_eq!(sample.status, SampleStatus::Complete);
    assert_eq!(sample.attempts, 3);
    let ids: Vec<_> = sample.records.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, ["mid", "mid2"]);
    assert_eq!(captions.requested(), ["mid", "mid2"]);
}

#[tokio::test(start_paused = true)]
async fn quota_not_met_keeps_partial_tier() {
    let youtube = FakeYoutube::with_searches(vec![vec![entry("lonely", 20_000)]]);
    let captions = FakeCaptions::default().with("lonely", &["just me"]);
    let config = SamplerConfig {
        max_attempts: Some(4),
        ..quick_config()
    };
    let tier = Tier::new("mid", 10_000, Some(100_000));

    let mut sampler = StratifiedSampler::new(&youtube, &captions, &config, StdRng::seed_from_u64(9));
    let sample = sampler.sample_tier(&tier, 3).await;

    assert_eq!(sample.status, SampleStatus::QuotaNotMet);
    assert_eq!(*youtube.search_calls.lock().unwrap(), 4);
    assert_eq!(sample.records.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn output_file_has_unique_ids_with_transcripts() {
    let dir = tempfile::tempdir().unwrap();
    let batch = vec![
        entry("n1", 500),
        entry("n2", 9_999),
        entry("m1", 10_000),
        entry("m2", 99_999),
        entry("p1", 100_000),
    ];
    // popular never fills and uses up its 20 searches; mid and niche fill from one each
    let youtube = FakeYoutube::with_searches(vec![batch; 22]);
    let mut captions = FakeCaptions::default();
    for id in ["n1", "n2", "m1", "m2", "p1"] {
        captions = captions.with(id, &["some", "words"]);
    }
    let config = SamplerConfig {
        tiers: TierSet::new(vec![
            Tier::new("popular", 100_000, None),
            Tier::new("mid", 10_000, Some(100_000)),
            Tier::new("niche", 0, Some(10_000)),
        ])
        .unwrap(),
        target_per_tier: 2,
        output: dir.path().join("sample.csv"),
        ..quick_config()
    };

    let mut writer = VideoCsvWriter::create(&config.output).unwrap();
    let mut sampler = StratifiedSampler::new(&youtube, &captions, &config, StdRng::seed_from_u64(5));
    let samples = sampler.sample_all(&mut writer).await.unwrap();
    writer.finish().unwrap();

    let statuses: Vec<_> = samples.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        [SampleStatus::QuotaNotMet, SampleStatus::Complete, SampleStatus::Complete]
    );

    let rows = read_video_records(&config.output).unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, ["p1", "m1", "m2", "n1", "n2"]);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), rows.len());
    assert!(rows.iter().all(|r| r.transcript == "some words"));
}
