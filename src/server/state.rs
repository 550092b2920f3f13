use crate::{Config, Result, proxy::UpstreamClient};
use url::Url;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub client: UpstreamClient,
    pub external_base_url: Option<Url>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: UpstreamClient::new(config)?,
            external_base_url: config.external_base_url.clone(),
        })
    }
}
