use url::Url;

use super::resolve::resolve_reference;

/// Context for rewriting one playlist.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// URL the playlist was fetched from; references resolve against it.
    pub base_url: Url,

    /// Relay origin + path, without trailing slashes.
    pub relay_base: String,

    /// Referer override propagated into every relay URL.
    pub referer: Option<String>,
}

impl RewriteContext {
    pub fn new(base_url: Url, relay_base: &str, referer: Option<String>) -> Self {
        Self {
            base_url,
            relay_base: relay_base.trim_end_matches('/').to_string(),
            referer: referer.filter(|r| !r.is_empty()),
        }
    }

    /// Resolve a playlist reference against the playlist URL.
    pub fn resolve_url(&self, reference: &str) -> String {
        resolve_reference(&self.base_url, reference)
    }

    /// Build `<relay_base>?url=<target>[&ref=<referer>]`.
    pub fn build_relay_url(&self, target: &str) -> String {
        let mut url = format!("{}?url={}", self.relay_base, urlencoding::encode(target));
        if let Some(referer) = &self.referer {
            url.push_str("&ref=");
            url.push_str(&urlencoding::encode(referer));
        }
        url
    }

    /// Resolve a reference and wrap it in a relay URL.
    pub fn relay_reference(&self, reference: &str) -> String {
        self.build_relay_url(&self.resolve_url(reference))
    }
}
