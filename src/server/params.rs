use axum::http::{HeaderMap, HeaderValue, Uri, header};
use url::Url;

use crate::{Error, Result};

/// Path prefix for targets embedded in the path: `/proxy/<url-encoded URL>`.
pub const PROXY_PATH_PREFIX: &str = "/proxy/";

/// Raw query parameters of a relay request.
///
/// Parsed by hand so that the first occurrence of a repeated key wins
/// and empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayParams {
    /// Target URL.
    pub url: Option<String>,

    /// Referer override (`ref`).
    pub referer: Option<String>,

    /// `strict=1` enables block-page sniffing.
    pub strict: bool,

    /// `rewrite=0` disables playlist rewriting.
    pub rewrite: bool,
}

impl RelayParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut url = None;
        let mut referer = None;
        let mut strict = None;
        let mut rewrite = None;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            let slot = match &*key {
                "url" => &mut url,
                "ref" => &mut referer,
                "strict" => &mut strict,
                "rewrite" => &mut rewrite,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        Self {
            url: url.filter(|u| !u.is_empty()),
            referer: referer.filter(|r| !r.is_empty()),
            strict: strict.as_deref() == Some("1"),
            rewrite: rewrite.as_deref() != Some("0"),
        }
    }
}

/// A parsed inbound relay request. Built once per request and never mutated.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub target: Url,
    pub referer: Option<String>,
    pub strict: bool,
    pub rewrite: bool,
    /// Inbound `Range` header, forwarded verbatim.
    pub range: Option<HeaderValue>,
    /// This relay's own origin + path, trailing slashes stripped.
    pub relay_base: String,
}

impl RelayRequest {
    /// Parse the target and flags from an inbound request.
    ///
    /// The `url` query parameter takes precedence over a `/proxy/` path.
    /// Fails before any upstream call when no absolute target is given.
    pub fn parse(uri: &Uri, headers: &HeaderMap, external_base: Option<&Url>) -> Result<Self> {
        let params = RelayParams::from_query(uri.query());

        let raw_target = params
            .url
            .clone()
            .or_else(|| target_from_path(uri.path()))
            .ok_or_else(|| Error::InvalidRequest("missing ?url= target".to_string()))?;

        let target = Url::parse(&raw_target)
            .map_err(|e| Error::InvalidRequest(format!("invalid target URL {:?}: {}", raw_target, e)))?;

        Ok(Self {
            target,
            referer: params.referer,
            strict: params.strict,
            rewrite: params.rewrite,
            range: headers.get(header::RANGE).cloned(),
            relay_base: relay_base(uri, headers, external_base),
        })
    }
}

/// Extract a percent-encoded target from `/proxy/<encoded>`.
///
/// A segment that fails to decode is used as-is.
pub fn target_from_path(path: &str) -> Option<String> {
    let raw = path.strip_prefix(PROXY_PATH_PREFIX)?;
    if raw.is_empty() {
        return None;
    }

    Some(
        urlencoding::decode(raw)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| raw.to_string()),
    )
}

/// Origin + path under which this relay was reached.
///
/// The origin comes from the configured external base URL, else from the
/// request authority / `Host` header and `x-forwarded-proto`.
pub fn relay_base(uri: &Uri, headers: &HeaderMap, external_base: Option<&Url>) -> String {
    let origin = match external_base {
        Some(base) => base.origin().ascii_serialization(),
        None => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .or_else(|| uri.scheme_str())
                .unwrap_or("http");
            let host = uri
                .authority()
                .map(|a| a.as_str())
                .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
                .unwrap_or("localhost");
            format!("{}://{}", scheme, host)
        }
    };

    format!("{}{}", origin, uri.path().trim_end_matches('/'))
}
