use serde::{Deserialize, Serialize};

/// One accepted video, persisted as a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub title: String,
    /// Upload date as `YYYYMMDD`.
    pub published_at: String,
    pub transcript: String,
}

impl VideoRecord {
    /// Column order of the harvest CSV files.
    pub const HEADERS: [&'static str; 7] = [
        "video_id",
        "views",
        "likes",
        "comments",
        "title",
        "published_at",
        "transcript",
    ];

    pub fn from_entry(video_id: &str, entry: &VideoEntry, transcript: String) -> Self {
        Self {
            video_id: video_id.to_string(),
            views: entry.view_count.unwrap_or(0),
            likes: entry.like_count.unwrap_or(0),
            comments: entry.comment_count.unwrap_or(0),
            title: entry.title.clone().unwrap_or_default(),
            published_at: entry.upload_date.clone().unwrap_or_default(),
            transcript,
        }
    }
}

/// A video as reported by the listing, search or metadata service.
/// Field names follow yt-dlp's info dict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
}

impl VideoEntry {
    pub fn views(&self) -> u64 {
        self.view_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub text: String,
}

impl CaptionSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// VADER polarity breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LexiconScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// Classifier probabilities averaged over every transcript window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformerScore {
    pub neg_prob: f64,
    pub pos_prob: f64,
    pub score: f64,
}

/// Four 1-10 ratings assigned by a hosted language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmRatings {
    pub negativity: u8,
    pub controversiality: u8,
    pub excitement: u8,
    pub quality: u8,
}

impl LlmRatings {
    pub fn to_array(&self) -> [u8; 4] {
        [
            self.negativity,
            self.controversiality,
            self.excitement,
            self.quality,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_fields_default_to_zero_and_empty() {
        let entry = VideoEntry {
            id: Some("abc".into()),
            ..Default::default()
        };
        let record = VideoRecord::from_entry("abc", &entry, "text".into());
        assert_eq!(record.views, 0);
        assert_eq!(record.likes, 0);
        assert_eq!(record.comments, 0);
        assert_eq!(record.title, "");
        assert_eq!(record.published_at, "");
    }

    #[test]
    fn entry_parses_from_ytdlp_json_with_nulls() {
        let json = r#"{"id":"dQw4w9WgXcQ","view_count":1500,"like_count":null,"title":"t","upload_date":"20240131","extra":1}"#;
        let entry: VideoEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(entry.views(), 1500);
        assert_eq!(entry.like_count, None);
        assert_eq!(entry.comment_count, None);
    }
}
