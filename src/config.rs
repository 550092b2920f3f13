//! Configuration loaded from environment variables.

use std::{env, time::Duration};

use url::Url;

use crate::proxy::UpstreamProfile;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host (default: 0.0.0.0)
    pub host: String,
    /// Bind port (default: 8080)
    pub port: u16,
    /// Public base URL of this relay. When unset, the relay base is derived
    /// from each request's `Host` header.
    pub external_base_url: Option<Url>,
    /// Total upstream request timeout (default: none)
    pub upstream_timeout: Option<Duration>,
    /// Upstream connect timeout (default: none)
    pub upstream_connect_timeout: Option<Duration>,
    /// Maximum redirects followed upstream (default: 10)
    pub max_redirects: usize,
    /// Header template sent with every upstream request.
    pub profile: UpstreamProfile,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let external_base_url = match env::var("EXTERNAL_HOST") {
            Ok(host) if !host.is_empty() => {
                let scheme = env::var("EXTERNAL_SCHEME").unwrap_or_else(|_| "http".to_string());
                Some(Url::parse(&format!("{}://{}", scheme, host))?)
            }
            _ => None,
        };

        let mut profile = UpstreamProfile::default();
        if let Ok(user_agent) = env::var("RELAY_USER_AGENT") {
            profile.user_agent = user_agent;
        }
        if let Ok(accept_language) = env::var("RELAY_ACCEPT_LANGUAGE") {
            profile.accept_language = accept_language;
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            external_base_url,
            upstream_timeout: secs_from_env("UPSTREAM_TIMEOUT_SECS"),
            upstream_connect_timeout: secs_from_env("UPSTREAM_CONNECT_TIMEOUT_SECS"),
            max_redirects: env::var("UPSTREAM_MAX_REDIRECTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            profile,
        })
    }

    /// Address to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            external_base_url: None,
            upstream_timeout: None,
            upstream_connect_timeout: None,
            max_redirects: 10,
            profile: UpstreamProfile::default(),
        }
    }
}

fn secs_from_env(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
