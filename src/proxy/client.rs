use axum::http::{HeaderMap, HeaderValue, StatusCode};
use reqwest::{Client, redirect::Policy};
use std::sync::Arc;
use url::Url;

use super::{body::UpstreamBody, headers::UpstreamProfile};
use crate::{Config, Error, Result};

/// Response from the upstream server, body not yet consumed.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// Declared content type, lowercased; empty when absent.
    pub fn content_type(&self) -> String {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// HTTP client for relaying requests to upstream servers.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    profile: Arc<UpstreamProfile>,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Referer comes from the header template on every hop.
        let mut builder = Client::builder()
            .redirect(Policy::limited(config.max_redirects))
            .referer(false);
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.upstream_connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.profile.clone()))
    }

    pub fn with_client(client: Client, profile: UpstreamProfile) -> Self {
        Self {
            client,
            profile: Arc::new(profile),
        }
    }

    /// Fetch `target` with the spoofed header template.
    ///
    /// Any status is returned as-is; only transport failures are errors.
    pub async fn fetch(
        &self,
        target: &Url,
        referer: Option<&str>,
        range: Option<&HeaderValue>,
    ) -> Result<UpstreamResponse> {
        let headers = self.profile.request_headers(target, referer, range)?;

        let response = self
            .client
            .get(target.clone())
            .headers(headers)
            .send()
            .await?;

        tracing::debug!(
            "Upstream responded {} for {} (final URL {})",
            response.status(),
            target,
            response.url()
        );

        Ok(UpstreamResponse {
            status: response.status(),
            headers: response.headers().clone(),
            body: UpstreamBody::from_response(response),
        })
    }
}
