use serde::{Deserialize, Deserializer, Serialize};

// Cheap precondition only; the server is the authority on what it can fetch.
const HOST_MARKERS: [&str; 2] = ["youtube.com", "youtu.be"];

const ERROR_PREFIX: &str = "error:";

pub fn looks_like_video_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && HOST_MARKERS.iter().any(|marker| url.contains(marker))
}

/// Which of the three stream collections an option belongs to. Serializes to
/// the wire names the server expects in `download_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Progressive,
    VideoOnly,
    AudioOnly,
}

/// One downloadable stream as reported by the server. Read-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamOption {
    #[serde(deserialize_with = "itag_from_wire")]
    pub itag: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub size_mb: f64,
}

impl StreamOption {
    /// "720p (30fps)", or just the quality label when no frame rate is known.
    pub fn label(&self) -> String {
        let quality = self
            .resolution
            .as_deref()
            .or(self.quality.as_deref())
            .unwrap_or("unknown");
        match self.fps {
            Some(fps) => format!("{} ({}fps)", quality, fps),
            None => quality.to_string(),
        }
    }
}

// The server sends itags as numbers, but they are opaque tokens to us.
fn itag_from_wire<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Num(u64),
        Str(String),
    }
    Ok(match Wire::deserialize(deserializer)? {
        Wire::Num(n) => n.to_string(),
        Wire::Str(s) => s,
    })
}

/// Everything the server tells us about a video. Replaced wholesale on each
/// successful fetch; absent stream collections deserialize as empty.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub views: u64,
    /// Duration in seconds.
    #[serde(rename = "length", default)]
    pub length_seconds: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_streams: Vec<StreamOption>,
    #[serde(default)]
    pub video_only_streams: Vec<StreamOption>,
    #[serde(default)]
    pub audio_streams: Vec<StreamOption>,
}

impl VideoMetadata {
    pub fn streams(&self, kind: StreamKind) -> &[StreamOption] {
        match kind {
            StreamKind::Progressive => &self.video_streams,
            StreamKind::VideoOnly => &self.video_only_streams,
            StreamKind::AudioOnly => &self.audio_streams,
        }
    }
}

/// The user's current format choice. At most one exists, held as
/// `Option<SelectedStream>` behind mutually exclusive radio buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStream {
    pub itag: String,
    pub kind: StreamKind,
}

/// Status reported by the progress endpoint, decoded from the wire string
/// into a tagged enum so failures carry a structured payload instead of an
/// `error:`-prefixed status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Starting,
    DownloadingAudio,
    DownloadingVideo,
    Merging,
    Completed,
    /// Server-side failure; payload is the text after the `error:` prefix.
    Failed(String),
    /// A status string this client does not know. Not terminal.
    Other(String),
}

impl DownloadStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "starting" => Self::Starting,
            "downloading_audio" => Self::DownloadingAudio,
            "downloading_video" => Self::DownloadingVideo,
            "merging" => Self::Merging,
            "completed" => Self::Completed,
            other => match other.strip_prefix(ERROR_PREFIX) {
                Some(message) => Self::Failed(message.to_string()),
                None => Self::Other(other.to_string()),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }

    /// Localization key for the user-facing status line.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Starting => "status-starting",
            Self::DownloadingAudio => "status-downloading-audio",
            Self::DownloadingVideo => "status-downloading-video",
            Self::Merging => "status-merging",
            Self::Completed => "status-completed",
            Self::Failed(_) => "status-failed",
            Self::Other(_) => "status-processing",
        }
    }
}

/// One observation from the progress endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    /// 0-100.
    pub progress: f64,
    pub status: DownloadStatus,
}

#[derive(Default)]
pub struct AppState {
    pub url: String,
    pub download_location: String,
    pub metadata: Option<VideoMetadata>,
    pub selected: Option<SelectedStream>,
    pub is_fetching: bool,
    pub is_submitting: bool,
    pub progress: f32,
    pub status: String,
    pub last_error: Option<String>,
    /// Retrieval link, set once the server reports completion.
    pub artifact_url: Option<String>,
}
