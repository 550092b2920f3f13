//! Router-level tests using tower::ServiceExt::oneshot against a wiremock upstream.
//!
//! `.expect(n)` on each mock checks how many upstream fetches a request made;
//! the check runs when the MockServer is dropped.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use hls_relay::{Config, proxy::headers::DEFAULT_USER_AGENT, server::create_router};
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{any, header as header_eq, method, path},
};

const PLAYLIST: &str = "#EXTM3U\n\
                        #EXT-X-VERSION:3\n\
                        #EXT-X-TARGETDURATION:6\n\
                        #EXT-X-KEY:METHOD=AES-128,URI=\"key.bin\",IV=0x1\n\
                        #EXTINF:6.0,\n\
                        seg001.ts\n\
                        #EXTINF:6.0,\n\
                        https://cdn.example/seg002.ts\n\
                        #EXT-X-ENDLIST\n";

fn test_config() -> Config {
    Config {
        external_base_url: Some(Url::parse("http://relay.test").unwrap()),
        ..Config::default()
    }
}

fn relay_uri(target: &str, extra: &str) -> String {
    format!("/?url={}{}", urlencoding::encode(target), extra)
}

async fn send(request: Request<Body>) -> Response {
    let app = create_router(&test_config()).unwrap();
    app.oneshot(request).await.unwrap()
}

async fn get(uri: &str) -> Response {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing {} header", name))
        .to_str()
        .unwrap()
}

fn assert_cors(response: &Response) {
    assert_eq!(header_str(response, "access-control-allow-origin"), "*");
    assert_eq!(
        header_str(response, "access-control-allow-methods"),
        "GET,HEAD,OPTIONS"
    );
    assert_eq!(header_str(response, "access-control-allow-headers"), "*");
}

fn url_param(relay_url: &str, name: &str) -> Option<String> {
    Url::parse(relay_url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Mock server that fails verification if anything is fetched.
async fn untouched_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    server
}

// ── Request validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn missing_target_returns_400_without_fetch() {
    let _server = untouched_upstream().await;

    for uri in ["/", "/proxy/", "/?ref=https%3A%2F%2Fplayer.example%2F"] {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_cors(&response);
        assert_eq!(header_str(&response, "content-type"), "application/json");

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("missing ?url="));
    }
}

#[tokio::test]
async fn invalid_target_returns_400_without_fetch() {
    let _server = untouched_upstream().await;

    let response = get("/?url=not%20a%20url").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors(&response);

    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("invalid target URL"));
}

#[tokio::test]
async fn options_never_fetches_upstream() {
    let server = untouched_upstream().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri(relay_uri(&format!("{}/live/index.m3u8", server.uri()), ""))
        .header("origin", "https://player.example")
        .header("access-control-request-method", "GET")
        .body(Body::empty())
        .unwrap();

    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn options_without_target_is_still_preflight() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
}

// ── Passthrough ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn passthrough_forwards_status_and_spoofed_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("gone", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/download", server.uri());
    let response = get(&relay_uri(&target, "")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors(&response);
    assert_eq!(header_str(&response, "content-type"), "text/plain");
    assert_eq!(header_str(&response, "x-original-url"), target);
    assert_eq!(
        header_str(&response, "cache-control"),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(body_bytes(response).await, b"gone");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let upstream_headers = &received[0].headers;
    let upstream_header = |name: &str| {
        upstream_headers
            .get(name)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    };
    assert_eq!(upstream_header("user-agent"), DEFAULT_USER_AGENT);
    assert_eq!(upstream_header("accept"), "*/*");
    assert_eq!(upstream_header("accept-language"), "es-ES,es;q=0.9,en;q=0.8");
    assert_eq!(upstream_header("referer"), format!("{}/", server.uri()));
    assert_eq!(upstream_header("origin"), server.uri());
    assert!(upstream_headers.get("range").is_none());
}

#[tokio::test]
async fn range_is_forwarded_and_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video.mp4"))
        .and(header_eq("range", "bytes=100-199"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 100-199/1000")
                .insert_header("accept-ranges", "bytes")
                .set_body_raw(vec![7u8; 100], "video/mp4"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::builder()
        .uri(relay_uri(&format!("{}/video.mp4", server.uri()), ""))
        .header("range", "bytes=100-199")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, "content-range"), "bytes 100-199/1000");
    assert_eq!(header_str(&response, "accept-ranges"), "bytes");
    assert_eq!(header_str(&response, "content-type"), "video/mp4");
    assert_eq!(
        header_str(&response, "cache-control"),
        "public, max-age=0, s-maxage=8, stale-while-revalidate=8"
    );
    assert_eq!(body_bytes(response).await, vec![7u8; 100]);
}

#[tokio::test]
async fn referer_override_sets_referer_and_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_eq("referer", "https://player.example/watch"))
        .and(header_eq("origin", "https://player.example"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("ok", "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/file.txt", server.uri());
    let response = get(&relay_uri(&target, "&ref=https%3A%2F%2Fplayer.example%2Fwatch")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Upstream where `/start.ts` redirects to `/final.ts`, which serves a partial body.
async fn redirecting_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start.ts"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/final.ts", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/final.ts"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("content-range", "bytes 0-3/188")
                .set_body_raw("G@\x00\x10", "video/mp2t"),
        )
        .expect(1)
        .mount(&server)
        .await;
    server
}

/// Headers the upstream received on the request for `path`.
async fn received_headers(server: &MockServer, path: &str) -> Vec<(String, String)> {
    let received = server.received_requests().await.unwrap();
    let request = received
        .iter()
        .find(|r| r.url.path() == path)
        .unwrap_or_else(|| panic!("no request for {}", path));
    ["referer", "origin", "range"]
        .into_iter()
        .filter_map(|name| {
            request
                .headers
                .get(name)
                .map(|v| (name.to_string(), v.to_str().unwrap().to_string()))
        })
        .collect()
}

#[tokio::test]
async fn redirect_keeps_referer_override_and_range() {
    let server = redirecting_upstream().await;

    let request = Request::builder()
        .uri(relay_uri(
            &format!("{}/start.ts", server.uri()),
            "&ref=https%3A%2F%2Fplayer.example%2Fwatch",
        ))
        .header("range", "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, "content-range"), "bytes 0-3/188");
    assert_eq!(body_bytes(response).await, b"G@\x00\x10");

    let expected = vec![
        ("referer".to_string(), "https://player.example/watch".to_string()),
        ("origin".to_string(), "https://player.example".to_string()),
        ("range".to_string(), "bytes=0-3".to_string()),
    ];
    assert_eq!(received_headers(&server, "/start.ts").await, expected);
    assert_eq!(received_headers(&server, "/final.ts").await, expected);
}

#[tokio::test]
async fn redirect_keeps_target_origin_referer() {
    let server = redirecting_upstream().await;

    let target = format!("{}/start.ts", server.uri());
    let response = get(&relay_uri(&target, "")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, "x-original-url"), target);
    assert_eq!(
        received_headers(&server, "/final.ts").await,
        vec![
            ("referer".to_string(), format!("{}/", server.uri())),
            ("origin".to_string(), server.uri()),
        ]
    );
}

#[tokio::test]
async fn path_form_target_is_relayed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seg/001.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x47u8; 188], "video/mp2t"))
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/seg/001.ts", server.uri());
    let response = get(&format!("/proxy/{}", urlencoding::encode(&target))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "x-original-url"), target);
    assert_eq!(body_bytes(response).await.len(), 188);
}

// ── Strict mode ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn strict_mode_reports_html_block_as_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_raw("<!DOCTYPE html><html><body>Just a moment</body></html>", "text/plain"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/live/index.m3u8", server.uri());
    let response = get(&relay_uri(&target, "&strict=1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({
            "ok": false,
            "offline": true,
            "status": 503,
            "reason": "html_blocked"
        })
    );
}

#[tokio::test]
async fn strict_mode_reports_html_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("nothing to see", "text/html"))
        .mount(&server)
        .await;

    let response = get(&relay_uri(&format!("{}/a.ts", server.uri()), "&strict=1")).await;
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["status"], 200);
}

#[tokio::test]
async fn strict_mode_streams_unblocked_body_intact() {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(payload.clone(), "video/mp2t"))
        .expect(1)
        .mount(&server)
        .await;

    let response = get(&relay_uri(&format!("{}/seg.ts", server.uri()), "&strict=1")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn html_is_passed_through_without_strict() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_raw("<html>Forbidden</html>", "text/html"))
        .mount(&server)
        .await;

    let response = get(&relay_uri(&format!("{}/a.ts", server.uri()), "")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_bytes(response).await, b"<html>Forbidden</html>");
}

// ── Playlist rewriting ──────────────────────────────────────────────────────

#[tokio::test]
async fn playlist_is_rewritten_through_relay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/live/index.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PLAYLIST, "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/live/index.m3u8", server.uri());
    let response = get(&relay_uri(&target, "")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(
        header_str(&response, "content-type"),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(
        header_str(&response, "cache-control"),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(header_str(&response, "x-original-url"), target);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines.len(), PLAYLIST.split('\n').count());

    assert_eq!(lines[0], "#EXTM3U");
    assert!(lines[3].starts_with("#EXT-X-KEY:METHOD=AES-128,URI=\"http://relay.test?url="));
    assert!(lines[3].ends_with("\",IV=0x1"));
    let key_uri = lines[3].split('"').nth(1).unwrap();
    assert_eq!(
        url_param(key_uri, "url").unwrap(),
        format!("{}/live/key.bin", server.uri())
    );

    assert!(lines[5].starts_with("http://relay.test?url="));
    assert_eq!(
        url_param(lines[5], "url").unwrap(),
        format!("{}/live/seg001.ts", server.uri())
    );
    assert_eq!(url_param(lines[5], "ref"), None);
    assert_eq!(
        url_param(lines[7], "url").unwrap(),
        "https://cdn.example/seg002.ts"
    );
    assert_eq!(lines[8], "#EXT-X-ENDLIST");
}

#[tokio::test]
async fn playlist_rewrite_carries_referer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("#EXTM3U\nchunk.m4s", "application/vnd.apple.mpegurl"),
        )
        .mount(&server)
        .await;

    let target = format!("{}/vod/master", server.uri());
    let response = get(&relay_uri(&target, "&ref=https%3A%2F%2Fplayer.example%2F")).await;

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let line = text.lines().nth(1).unwrap();
    assert_eq!(
        url_param(line, "url").unwrap(),
        format!("{}/vod/chunk.m4s", server.uri())
    );
    assert_eq!(url_param(line, "ref").unwrap(), "https://player.example/");
}

#[tokio::test]
async fn rewrite_disabled_passes_playlist_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PLAYLIST, "audio/mpegurl"))
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/live/index.m3u8", server.uri());
    let response = get(&relay_uri(&target, "&rewrite=0")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "content-type"), "audio/mpegurl");
    // audio/* falls in the segment cache window.
    assert_eq!(
        header_str(&response, "cache-control"),
        "public, max-age=0, s-maxage=8, stale-while-revalidate=8"
    );
    assert_eq!(body_bytes(response).await, PLAYLIST.as_bytes());
}

#[tokio::test]
async fn rewrite_disabled_hls_playlist_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PLAYLIST, "application/vnd.apple.mpegurl"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let target = format!("{}/live/index.m3u8", server.uri());
    let response = get(&relay_uri(&target, "&rewrite=0")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "content-type"),
        "application/vnd.apple.mpegurl"
    );
    assert_eq!(
        header_str(&response, "cache-control"),
        "no-store, no-cache, must-revalidate"
    );
    assert_eq!(body_bytes(response).await, PLAYLIST.as_bytes());
}

#[tokio::test]
async fn path_form_playlist_uses_path_as_relay_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("seg.ts", "text/plain"))
        .mount(&server)
        .await;

    let target = format!("{}/live/index.m3u8", server.uri());
    let encoded = urlencoding::encode(&target).into_owned();
    let response = get(&format!("/proxy/{}", encoded)).await;

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with(&format!("http://relay.test/proxy/{}?url=", encoded)));
    assert_eq!(
        url_param(&text, "url").unwrap(),
        format!("{}/live/seg.ts", server.uri())
    );
}

// ── Upstream failures ───────────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_upstream_returns_502_json() {
    let response = get(&relay_uri("http://127.0.0.1:1/live/index.m3u8", "")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_cors(&response);
    assert_eq!(header_str(&response, header::CONTENT_TYPE.as_str()), "application/json");
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn malformed_referer_returns_502_without_fetch() {
    let server = untouched_upstream().await;

    let target = format!("{}/a.ts", server.uri());
    let response = get(&relay_uri(&target, "&ref=not-a-url")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("referer"));
}

// ── Ambient routes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok_with_cors() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_answers_preflight() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert!(body_bytes(response).await.is_empty());
}
