//! Classification of upstream responses: soft-block pages and playlists.

use serde::Serialize;
use url::Url;

use super::body::decode_text;
use crate::hls::{MediaFormat, is_playlist_content_type};

/// Number of leading body bytes inspected for block markers.
pub const SNIFF_LIMIT: usize = 1024;

/// Lowercase substrings that identify an HTML interstitial.
const BLOCK_MARKERS: &[&str] = &["<html", "forbidden", "access denied", "astra"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    HtmlBlocked,
}

/// Decide whether the upstream served a soft-block page.
///
/// `content_type` must already be lowercased. Undecodable bytes count as
/// inconclusive, never as a match on their own.
pub fn detect_block(content_type: &str, peek: &[u8]) -> Option<BlockReason> {
    if content_type.contains("text/html") {
        return Some(BlockReason::HtmlBlocked);
    }

    let text = decode_text(peek).to_lowercase();
    BLOCK_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
        .then_some(BlockReason::HtmlBlocked)
}

/// The response is a playlist if its content type says so, or if the
/// target path ends in `.m3u8` whatever the declared type.
pub fn is_playlist(content_type: &str, target: &Url) -> bool {
    is_playlist_content_type(content_type)
        || MediaFormat::from_path(target.path()) == MediaFormat::Playlist
}

/// JSON report returned in place of a blocked upstream body.
#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub ok: bool,
    pub offline: bool,
    pub status: u16,
    pub reason: BlockReason,
}

impl BlockReport {
    pub fn new(status: u16, reason: BlockReason) -> Self {
        Self {
            ok: false,
            offline: true,
            status,
            reason,
        }
    }
}
