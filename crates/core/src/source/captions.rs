use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::{
    source::{ErrorKind, ServiceError, ServiceResult, TranscriptSource, YtDlp, watch_url},
    types::CaptionSegment,
};

#[derive(Debug, Default, Deserialize)]
struct CaptionInfo {
    #[serde(default)]
    subtitles: HashMap<String, Vec<CaptionTrack>>,
    #[serde(default)]
    automatic_captions: HashMap<String, Vec<CaptionTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CaptionTrack {
    #[serde(default)]
    ext: String,
    url: String,
}

#[derive(Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
struct Json3Event {
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Manual subtitles win over automatic captions for the same language;
/// languages are tried in preference order.
fn select_track<'a>(info: &'a CaptionInfo, languages: &[String]) -> Option<&'a CaptionTrack> {
    let json3 = |tracks: Option<&'a Vec<CaptionTrack>>| {
        tracks.and_then(|tracks| tracks.iter().find(|t| t.ext == "json3"))
    };
    languages.iter().find_map(|lang| {
        json3(info.subtitles.get(lang)).or_else(|| json3(info.automatic_captions.get(lang)))
    })
}

/// One segment per caption event; line breaks inside a cue become spaces.
fn parse_json3(body: &str) -> serde_json::Result<Vec<CaptionSegment>> {
    let doc: Json3 = serde_json::from_str(body)?;
    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| event.segs)
        .map(|segs| {
            let text: String = segs.into_iter().map(|s| s.utf8).collect();
            text.replace('\n', " ").trim().to_string()
        })
        .filter(|text| !text.is_empty())
        .map(CaptionSegment::new)
        .collect())
}

fn status_error(status: StatusCode, video_id: &str) -> ServiceError {
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::NOT_FOUND => ErrorKind::NotFound,
        _ => ErrorKind::Unknown,
    };
    ServiceError::new(kind, format!("caption download for {video_id} returned {status}"))
}

/// [`TranscriptSource`] that locates caption tracks with yt-dlp and
/// downloads them in YouTube's `json3` format.
#[derive(Debug, Clone)]
pub struct YoutubeCaptions {
    ytdlp: YtDlp,
    client: reqwest::Client,
    languages: Vec<String>,
}

impl YoutubeCaptions {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self {
            ytdlp,
            client: reqwest::Client::new(),
            languages: ["en", "en-US", "en-GB", "en-orig"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
        }
    }
}

#[async_trait]
impl TranscriptSource for YoutubeCaptions {
    async fn caption_segments(&self, video_id: &str) -> ServiceResult<Vec<CaptionSegment>> {
        let info: CaptionInfo = self.ytdlp.dump_json(&watch_url(video_id), false).await?;

        let track = select_track(&info, &self.languages).ok_or_else(|| {
            ServiceError::new(
                ErrorKind::TranscriptDisabled,
                format!("no caption track for {video_id} in {:?}", self.languages),
            )
        })?;
        debug!(video_id, "downloading caption track");

        let response = self
            .client
            .get(&track.url)
            .send()
            .await
            .map_err(|e| ServiceError::new(ErrorKind::Unknown, e.to_string()))?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), video_id));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::new(ErrorKind::Unknown, e.to_string()))?;
        parse_json3(&body).map_err(|e| {
            ServiceError::new(
                ErrorKind::Unknown,
                format!("unparsable captions for {video_id}: {e}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(ext: &str, url: &str) -> CaptionTrack {
        CaptionTrack {
            ext: ext.into(),
            url: url.into(),
        }
    }

    #[test]
    fn manual_subtitles_beat_automatic_captions() {
        let mut info = CaptionInfo::default();
        info.subtitles
            .insert("en".into(), vec![track("vtt", "manual.vtt"), track("json3", "manual")]);
        info.automatic_captions
            .insert("en".into(), vec![track("json3", "auto")]);
        let langs = vec!["en".to_string()];
        assert_eq!(select_track(&info, &langs).unwrap().url, "manual");
    }

    #[test]
    fn falls_back_through_language_preferences() {
        let mut info = CaptionInfo::default();
        info.automatic_captions
            .insert("en-orig".into(), vec![track("json3", "orig")]);
        info.automatic_captions
            .insert("de".into(), vec![track("json3", "german")]);
        let langs = vec!["en".to_string(), "en-orig".to_string()];
        assert_eq!(select_track(&info, &langs).unwrap().url, "orig");
    }

    #[test]
    fn no_matching_track_yields_none() {
        let mut info = CaptionInfo::default();
        info.subtitles.insert("fr".into(), vec![track("json3", "fr")]);
        assert!(select_track(&info, &["en".to_string()]).is_none());
    }

    #[test]
    fn json3_events_become_segments() {
        let body = r#"{"events":[
            {"tStartMs":0},
            {"tStartMs":10,"segs":[{"utf8":"hello"},{"utf8":" world"}]},
            {"tStartMs":20,"segs":[{"utf8":"\n"}]},
            {"tStartMs":30,"segs":[{"utf8":"second\nline"}]}
        ]}"#;
        let segments = parse_json3(body).unwrap();
        assert_eq!(
            segments,
            vec![CaptionSegment::new("hello world"), CaptionSegment::new("second line")]
        );
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "x").kind,
            ErrorKind::RateLimited
        );
        assert_eq!(status_error(StatusCode::FORBIDDEN, "x").kind, ErrorKind::Unknown);
    }
}
