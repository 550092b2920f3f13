/// Content type emitted for rewritten playlists.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Content types that identify an HLS playlist.
const PLAYLIST_CONTENT_TYPES: &[&str] = &["application/vnd.apple.mpegurl", "audio/mpegurl"];

/// Returns true if a (lowercased) content type names an HLS playlist.
pub fn is_playlist_content_type(content_type: &str) -> bool {
    PLAYLIST_CONTENT_TYPES
        .iter()
        .any(|mime| content_type.contains(mime))
}

/// Represents the format of a relayed resource, as told by its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Playlist,
    DashManifest,
    MpegTS,
    Mp4,
    Fmp4Segment,
    Aac,
    Mp3,
    Unknown,
}

impl MediaFormat {
    /// Detect format from a URL path extension (case-insensitive).
    pub fn from_path(path: &str) -> Self {
        let Some((_, ext)) = path.rsplit_once('.') else {
            return Self::Unknown;
        };

        match ext.to_ascii_lowercase().as_str() {
            "m3u8" => Self::Playlist,
            "mpd" => Self::DashManifest,
            "ts" => Self::MpegTS,
            "mp4" => Self::Mp4,
            "m4s" => Self::Fmp4Segment,
            "aac" => Self::Aac,
            "mp3" => Self::Mp3,
            _ => Self::Unknown,
        }
    }

    /// Whether responses of this format may be briefly held by shared caches.
    pub fn is_segment(&self) -> bool {
        matches!(
            self,
            Self::MpegTS | Self::Mp4 | Self::Fmp4Segment | Self::Aac | Self::Mp3
        )
    }

    /// Content-Type to report when the upstream declared none.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Playlist => PLAYLIST_CONTENT_TYPE,
            Self::DashManifest => "application/dash+xml",
            Self::MpegTS => "video/mp2t",
            Self::Mp4 => "video/mp4",
            Self::Aac => "audio/aac",
            Self::Mp3 => "audio/mpeg",
            Self::Fmp4Segment | Self::Unknown => "application/octet-stream",
        }
    }
}
