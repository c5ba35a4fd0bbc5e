#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use vidmood_core::{
    CaptionSegment, ErrorKind, ServiceError, TranscriptSource, VideoEntry, VideoSource,
    source::ServiceResult,
};

pub fn entry(id: &str, views: u64) -> VideoEntry {
    VideoEntry {
        id: Some(id.to_string()),
        view_count: Some(views),
        like_count: Some(views / 20),
        comment_count: Some(views / 200),
        title: Some(format!("Video {id}")),
        upload_date: Some("20240115".to_string()),
    }
}

/// In-memory stand-in for yt-dlp.
#[derive(Default)]
pub struct FakeYoutube {
    pub uploads: Option<ServiceResult<Vec<VideoEntry>>>,
    pub searches: Mutex<VecDeque<ServiceResult<Vec<VideoEntry>>>>,
    pub metadata: Mutex<HashMap<String, VecDeque<ServiceResult<VideoEntry>>>>,
    pub listed_urls: Mutex<Vec<String>>,
    pub search_calls: Mutex<u32>,
    pub metadata_calls: Mutex<HashMap<String, u32>>,
}

impl FakeYoutube {
    pub fn with_uploads(uploads: ServiceResult<Vec<VideoEntry>>) -> Self {
        Self {
            uploads: Some(uploads),
            ..Default::default()
        }
    }

    pub fn with_searches(batches: Vec<Vec<VideoEntry>>) -> Self {
        Self {
            searches: Mutex::new(batches.into_iter().map(Ok).collect()),
            ..Default::default()
        }
    }

    pub fn script_metadata(&self, id: &str, responses: Vec<ServiceResult<VideoEntry>>) {
        self.metadata
            .lock()
            .unwrap()
            .insert(id.to_string(), responses.into());
    }

    pub fn metadata_calls(&self, id: &str) -> u32 {
        self.metadata_calls
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl VideoSource for FakeYoutube {
    async fn list_uploads(&self, channel_url: &str) -> ServiceResult<Vec<VideoEntry>> {
        self.listed_urls.lock().unwrap().push(channel_url.to_string());
        self.uploads.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search(&self, _: &str, _: usize) -> ServiceResult<Vec<VideoEntry>> {
        *self.search_calls.lock().unwrap() += 1;
        self.searches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn video_metadata(&self, video_id: &str) -> ServiceResult<VideoEntry> {
        *self
            .metadata_calls
            .lock()
            .unwrap()
            .entry(video_id.to_string())
            .or_default() += 1;
        self.metadata
            .lock()
            .unwrap()
            .get_mut(video_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(ServiceError::new(
                    ErrorKind::NotFound,
                    format!("Video unavailable: {video_id}"),
                ))
            })
    }
}

/// Caption responses keyed by video id; unknown ids have captions disabled.
#[derive(Default)]
pub struct FakeCaptions {
    pub tracks: HashMap<String, ServiceResult<Vec<CaptionSegment>>>,
    pub requested: Mutex<Vec<String>>,
}

impl FakeCaptions {
    pub fn with(mut self, id: &str, segments: &[&str]) -> Self {
        self.tracks.insert(
            id.to_string(),
            Ok(segments.iter().map(|s| CaptionSegment::new(*s)).collect()),
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptSource for FakeCaptions {
    async fn caption_segments(&self, video_id: &str) -> ServiceResult<Vec<CaptionSegment>> {
        self.requested.lock().unwrap().push(video_id.to_string());
        self.tracks.get(video_id).cloned().unwrap_or_else(|| {
            Err(ServiceError::new(
                ErrorKind::TranscriptDisabled,
                format!("Subtitles are disabled for {video_id}"),
            ))
        })
    }
}
