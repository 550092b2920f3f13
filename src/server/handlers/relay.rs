use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};

use crate::{
    Error, Result,
    logging::RelayLogRecord,
    proxy::{
        BlockReport, CachePolicy, SNIFF_LIMIT, UpstreamBody, UpstreamClient, detect_block,
        headers::{passthrough_headers, playlist_headers},
        is_playlist,
    },
    server::{params::RelayRequest, state::AppState},
    stream::{RewriteContext, StreamProcessor},
};

/// Terminal state of one relay request. Exactly one is produced per request.
pub enum RelayOutcome {
    /// CORS preflight, answered without contacting the upstream.
    Preflight,
    /// Upstream served a soft-block page (strict mode).
    Blocked(BlockReport),
    /// Rewritten HLS playlist.
    Playlist { headers: HeaderMap, body: String },
    /// Upstream body streamed through with selected headers.
    Passthrough {
        status: StatusCode,
        headers: HeaderMap,
        body: UpstreamBody,
    },
}

impl RelayOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Blocked(_) => "blocked",
            Self::Playlist { .. } => "playlist",
            Self::Passthrough { .. } => "passthrough",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Passthrough { status, .. } => *status,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for RelayOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Preflight => StatusCode::OK.into_response(),
            Self::Blocked(report) => (
                StatusCode::OK,
                [(header::CACHE_CONTROL, CachePolicy::NoStore.header_value())],
                Json(report),
            )
                .into_response(),
            Self::Playlist { headers, body } => (StatusCode::OK, headers, body).into_response(),
            Self::Passthrough {
                status,
                headers,
                body,
            } => (status, headers, Body::from_stream(body.into_stream())).into_response(),
        }
    }
}

/// Handle any request that is not routed elsewhere.
pub async fn handle_relay(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let record = RelayLogRecord::new(method.as_str(), &uri.to_string()).with_client_info(
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
    );

    if method == Method::OPTIONS {
        return respond(record, RelayOutcome::Preflight);
    }

    let request = match RelayRequest::parse(&uri, &headers, state.external_base_url.as_ref()) {
        Ok(request) => request,
        Err(e) => return fail(record, e),
    };

    let record = record
        .with_target(request.target.as_str(), request.referer.is_some())
        .with_flags(
            request.strict,
            request.rewrite,
            request.range.as_ref().and_then(|v| v.to_str().ok()),
        );

    match relay(&state.client, &request).await {
        Ok(outcome) => respond(record, outcome),
        Err(e) => fail(record, e),
    }
}

/// Fetch the target and decide how to answer.
pub async fn relay(client: &UpstreamClient, request: &RelayRequest) -> Result<RelayOutcome> {
    tracing::info!("Relay request: {}", request.target);

    let mut upstream = client
        .fetch(
            &request.target,
            request.referer.as_deref(),
            request.range.as_ref(),
        )
        .await?;
    let content_type = upstream.content_type();

    if request.strict {
        let peek = upstream.body.peek(SNIFF_LIMIT).await?;
        if let Some(reason) = detect_block(&content_type, &peek) {
            tracing::warn!(
                "Upstream {} served a block page (status {})",
                request.target,
                upstream.status
            );
            return Ok(RelayOutcome::Blocked(BlockReport::new(
                upstream.status.as_u16(),
                reason,
            )));
        }
    }

    if request.rewrite && is_playlist(&content_type, &request.target) {
        let text = upstream.body.into_text().await?;

        let context = RewriteContext::new(
            request.target.clone(),
            &request.relay_base,
            request.referer.clone(),
        );
        let processor = StreamProcessor::with_default_rules(context);
        let body = processor.process(&text);

        tracing::debug!(
            "Rewrote playlist {} ({} lines)",
            request.target,
            body.split('\n').count()
        );

        return Ok(RelayOutcome::Playlist {
            headers: playlist_headers(&request.target)?,
            body,
        });
    }

    Ok(RelayOutcome::Passthrough {
        status: upstream.status,
        headers: passthrough_headers(&request.target, &upstream.headers)?,
        body: upstream.body,
    })
}

fn respond(record: RelayLogRecord, outcome: RelayOutcome) -> Response {
    record
        .with_response(outcome.kind(), outcome.status().as_u16())
        .finish()
        .emit();
    outcome.into_response()
}

fn fail(record: RelayLogRecord, error: Error) -> Response {
    tracing::warn!("Relay failed: {}", error);
    record
        .with_error(
            error.error_code(),
            &error.to_string(),
            error.status_code().as_u16(),
        )
        .finish()
        .emit();
    error.into_response()
}
