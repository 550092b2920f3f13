use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Access record for one relayed request.
#[derive(Debug, Clone)]
pub struct RelayLogRecord {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub request_uri: String,
    pub original_url: Option<String>,
    pub referer_override: bool,
    pub strict: bool,
    pub rewrite: bool,
    pub range: Option<String>,
    pub outcome: Option<&'static str>,
    pub response_status: u16,
    pub response_time_ms: i64,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub user_agent: Option<String>,
}

impl RelayLogRecord {
    pub fn new(method: &str, request_uri: &str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            method: method.to_string(),
            request_uri: request_uri.to_string(),
            original_url: None,
            referer_override: false,
            strict: false,
            rewrite: true,
            range: None,
            outcome: None,
            response_status: 0,
            response_time_ms: 0,
            error_type: None,
            error_message: None,
            user_agent: None,
        }
    }

    pub fn with_target(mut self, url: &str, referer_override: bool) -> Self {
        self.original_url = Some(url.to_string());
        self.referer_override = referer_override;
        self
    }

    pub fn with_flags(mut self, strict: bool, rewrite: bool, range: Option<&str>) -> Self {
        self.strict = strict;
        self.rewrite = rewrite;
        self.range = range.map(String::from);
        self
    }

    pub fn with_client_info(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(String::from);
        self
    }

    pub fn with_response(mut self, outcome: &'static str, status: u16) -> Self {
        self.outcome = Some(outcome);
        self.response_status = status;
        self
    }

    pub fn with_error(mut self, error_type: &str, message: &str, status: u16) -> Self {
        self.outcome = Some("error");
        self.error_type = Some(error_type.to_string());
        self.error_message = Some(message.to_string());
        self.response_status = status;
        self
    }

    /// Stamp the elapsed time since the record was created.
    pub fn finish(mut self) -> Self {
        self.response_time_ms = (Utc::now() - self.timestamp).num_milliseconds();
        self
    }

    /// Write the record to the `access` log target.
    pub fn emit(&self) {
        tracing::info!(
            target: "hls_relay::access",
            request_id = %self.request_id,
            timestamp = %self.timestamp.to_rfc3339(),
            method = %self.method,
            uri = %self.request_uri,
            original_url = self.original_url.as_deref().unwrap_or("-"),
            referer_override = self.referer_override,
            strict = self.strict,
            rewrite = self.rewrite,
            range = self.range.as_deref().unwrap_or("-"),
            outcome = self.outcome.unwrap_or("-"),
            status = self.response_status,
            elapsed_ms = self.response_time_ms,
            error_type = self.error_type.as_deref().unwrap_or("-"),
            error = self.error_message.as_deref().unwrap_or("-"),
            user_agent = self.user_agent.as_deref().unwrap_or("-"),
            "relay request"
        );
    }
}
