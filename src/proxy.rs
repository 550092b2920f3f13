pub mod body;
pub mod classify;
pub mod client;
pub mod headers;

pub use body::UpstreamBody;
pub use classify::{BlockReason, BlockReport, SNIFF_LIMIT, detect_block, is_playlist};
pub use client::{UpstreamClient, UpstreamResponse};
pub use headers::{CachePolicy, UpstreamProfile, apply_cors};
