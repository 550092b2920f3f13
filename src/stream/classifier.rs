use crate::hls::is_key_tag;

/// Represents the type of a line in an M3U8 playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Empty,
    /// `#EXT-X-KEY:` tag; may carry a `URI="..."` attribute.
    ExtXKey,
    /// Any other `#` line, tag or comment. Passed through unchanged.
    Tag,
    /// Segment, variant or other media reference.
    Uri,
}

impl LineType {
    pub fn is_uri(&self) -> bool {
        matches!(self, Self::Uri)
    }
}

/// Classifier for M3U8 lines.
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a line from an M3U8 playlist. Surrounding whitespace is ignored.
    pub fn classify(line: &str) -> LineType {
        let line = line.trim();

        if line.is_empty() {
            LineType::Empty
        } else if !line.starts_with('#') {
            LineType::Uri
        } else if is_key_tag(line) {
            LineType::ExtXKey
        } else {
            LineType::Tag
        }
    }
}
