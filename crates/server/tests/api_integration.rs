//! API integration tests driving the router in-process.

mod common;

use axum::http::StatusCode;
use mediactl_core::RemoteTranscodeConfig;
use std::path::PathBuf;

use common::{TestConfig, TestFixture};

/// A remote host nobody listens on, with a wake target on loopback.
fn unreachable_remote() -> RemoteTranscodeConfig {
    let mut remote = RemoteTranscodeConfig::new("http://127.0.0.1:1", "00:11:22:33:44:55");
    remote.max_attempts = 1;
    remote.poll_interval_secs = 0;
    remote.request_timeout_secs = 1;
    remote.broadcast_addr = "127.0.0.1:9".parse().unwrap();
    remote
}

// ============================================================================
// Liveness
// ============================================================================

#[tokio::test]
async fn test_ping_answers_pong() {
    let fixture = TestFixture::new();
    let response = fixture.get("/ping").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.text, "pong");
}

// ============================================================================
// Transcode
// ============================================================================

#[tokio::test]
async fn test_transcode_rejects_bad_base64() {
    let fixture = TestFixture::new();
    let response = fixture.get("/transcode?user=alice&file=%21%21%21").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
async fn test_transcode_requires_query_parameters() {
    let fixture = TestFixture::new();
    let response = fixture.get("/transcode?user=alice").await;

    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transcode_missing_source_is_unprocessable() {
    let fixture = TestFixture::new();
    let file = TestFixture::encoded(&PathBuf::from("/nonexistent/movie.mkv"));
    let response = fixture
        .get(&format!("/transcode?user=alice&file={}", file))
        .await;

    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_transcode_start_and_stop() {
    let fixture = TestFixture::with_config(TestConfig::with_fake_engine());
    let source = fixture.media_file("movie.mkv");
    let file = TestFixture::encoded(&source);

    let response = fixture
        .get(&format!("/transcode?user=alice&file={}", file))
        .await;
    assert_status!(response, StatusCode::OK);
    assert!(response.body["pid"].as_u64().unwrap() > 0);

    let output_file = PathBuf::from(response.body["output_file"].as_str().unwrap());
    assert_eq!(output_file.file_name().unwrap(), "stream.m3u8");
    let output_dir = output_file.parent().unwrap().to_path_buf();
    assert!(output_dir.is_dir());
    assert!(output_dir.starts_with(fixture.temp_dir.path().join("out")));
    assert!(fixture.state.registry().get("alice").await.is_some());

    let response = fixture.get("/stop?user=alice").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["stopped"], true);
    assert!(!output_dir.exists());
    assert!(fixture.state.registry().is_empty().await);
}

#[tokio::test]
async fn test_second_transcode_replaces_first() {
    let fixture = TestFixture::with_config(TestConfig::with_fake_engine());
    let file = TestFixture::encoded(&fixture.media_file("movie.mkv"));
    let uri = format!("/transcode?user=alice&file={}", file);

    let first = fixture.get(&uri).await;
    assert_status!(first, StatusCode::OK);
    let first_dir = PathBuf::from(first.body["output_file"].as_str().unwrap())
        .parent()
        .unwrap()
        .to_path_buf();

    let second = fixture.get(&uri).await;
    assert_status!(second, StatusCode::OK);

    assert!(!first_dir.exists());
    assert_eq!(fixture.state.registry().len().await, 1);

    fixture.state.registry().stop_all(fixture.state.manager()).await;
}

#[tokio::test]
async fn test_stop_without_job() {
    let fixture = TestFixture::new();
    let response = fixture.get("/stop?user=nobody").await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["stopped"], false);
}

// ============================================================================
// Play (dispatch)
// ============================================================================

#[tokio::test]
async fn test_play_without_remote_is_unavailable() {
    let fixture = TestFixture::new();
    let file = TestFixture::encoded(&PathBuf::from("/media/movie.mkv"));
    let response = fixture.get(&format!("/play?user=alice&file={}", file)).await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_play_playable_source_is_local() {
    let fixture = TestFixture::with_config(TestConfig::with_remote(unreachable_remote()));
    let file = TestFixture::encoded(&PathBuf::from("/media/clips/trailer.mp4"));
    let response = fixture.get(&format!("/play?user=alice&file={}", file)).await;

    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["handled_locally"], true);
    assert_eq!(response.body["accepted"], true);
}

#[tokio::test]
async fn test_play_unreachable_remote_is_unavailable() {
    let fixture = TestFixture::with_config(TestConfig::with_remote(unreachable_remote()));
    let file = TestFixture::encoded(&PathBuf::from("/media/movie.mkv"));
    let response = fixture.get(&format!("/play?user=alice&file={}", file)).await;

    assert_status!(response, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("after 1 attempt"));
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/ping").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    assert!(response.text.contains("mediactl_http_requests_total"));
    assert!(response.text.contains("/ping"));
    assert!(response.text.contains("mediactl_tracked_jobs"));
}
