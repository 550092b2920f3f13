pub mod format;
pub mod key;

pub use format::{MediaFormat, PLAYLIST_CONTENT_TYPE, is_playlist_content_type};
pub use key::{find_uri_attribute, is_key_tag};
