use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use url::Url;

use crate::{Error, Result, hls::MediaFormat};

/// Mobile browser identity presented to upstream servers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 12; SM-G991B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Mobile Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

pub const X_ORIGINAL_URL: HeaderName = HeaderName::from_static("x-original-url");

/// Constant header template for upstream requests.
#[derive(Debug, Clone)]
pub struct UpstreamProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for UpstreamProfile {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: "*/*".to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl UpstreamProfile {
    /// Build the headers for fetching `target`.
    ///
    /// Referer and Origin come from the explicit override when given,
    /// otherwise from the target's own origin. A `Range` value is
    /// forwarded verbatim.
    pub fn request_headers(
        &self,
        target: &Url,
        referer: Option<&str>,
        range: Option<&HeaderValue>,
    ) -> Result<HeaderMap> {
        let (referer, origin) = match referer {
            Some(referer) => {
                let parsed = Url::parse(referer)
                    .map_err(|e| Error::InvalidReferer(format!("{}: {}", referer, e)))?;
                (referer.to_string(), parsed.origin().ascii_serialization())
            }
            None => {
                let origin = target.origin().ascii_serialization();
                (format!("{}/", origin), origin)
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, template_value(&self.user_agent)?);
        headers.insert(header::ACCEPT, template_value(&self.accept)?);
        headers.insert(header::ACCEPT_LANGUAGE, template_value(&self.accept_language)?);
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&referer).map_err(|e| Error::InvalidReferer(e.to_string()))?,
        );
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_str(&origin).map_err(|e| Error::InvalidReferer(e.to_string()))?,
        );

        if let Some(range) = range {
            headers.insert(header::RANGE, range.clone());
        }

        Ok(headers)
    }
}

fn template_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Internal(format!("bad header template: {}", e)))
}

/// Insert permissive CORS headers.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,HEAD,OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
}

/// Cache-Control policy for relayed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Manifests, JSON and errors.
    NoStore,
    /// Media segments: shareable for a few seconds to absorb re-fetch bursts.
    SegmentWindow,
}

impl CachePolicy {
    /// Pick the policy for a passthrough response.
    pub fn for_response(target: &Url, content_type: &str) -> Self {
        if MediaFormat::from_path(target.path()).is_segment()
            || content_type.starts_with("video/")
            || content_type.starts_with("audio/")
        {
            Self::SegmentWindow
        } else {
            Self::NoStore
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        match self {
            Self::NoStore => HeaderValue::from_static("no-store, no-cache, must-revalidate"),
            Self::SegmentWindow => HeaderValue::from_static(
                "public, max-age=0, s-maxage=8, stale-while-revalidate=8",
            ),
        }
    }
}

/// Build the client-facing headers for a passthrough response.
///
/// `upstream` supplies content-type, content-range and accept-ranges;
/// a missing content-type is inferred from the target path.
pub fn passthrough_headers(target: &Url, upstream: &HeaderMap) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    let declared = upstream
        .get(header::CONTENT_TYPE)
        .filter(|value| !value.is_empty());
    let content_type = match declared {
        Some(value) => value.clone(),
        None => HeaderValue::from_static(MediaFormat::from_path(target.path()).content_type()),
    };
    let lowered = declared
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(X_ORIGINAL_URL, original_url_value(target)?);
    headers.insert(
        header::CACHE_CONTROL,
        CachePolicy::for_response(target, &lowered).header_value(),
    );

    for name in [header::CONTENT_RANGE, header::ACCEPT_RANGES] {
        if let Some(value) = upstream.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    Ok(headers)
}

/// Build the client-facing headers for a rewritten playlist.
pub fn playlist_headers(target: &Url) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(crate::hls::PLAYLIST_CONTENT_TYPE),
    );
    headers.insert(header::CACHE_CONTROL, CachePolicy::NoStore.header_value());
    headers.insert(X_ORIGINAL_URL, original_url_value(target)?);
    Ok(headers)
}

fn original_url_value(target: &Url) -> Result<HeaderValue> {
    HeaderValue::from_str(target.as_str()).map_err(|e| Error::Internal(e.to_string()))
}
