//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router around a
//! fresh `AppState`, with an optional fake engine standing in for ffmpeg
//! and ffprobe so transcodes can be started without real media tools.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediactl_core::dispatch::encode_path;
use mediactl_core::{Config, RemoteDispatcher, RemoteTranscodeConfig, TranscodeConfig};
use mediactl_server::api::create_router;
use mediactl_server::state::AppState;

/// Prints probe JSON when called like ffprobe, otherwise idles like a running ffmpeg.
const FAKE_ENGINE: &str = r#"#!/bin/sh
if [ "$1" = "-v" ]; then
  cat <<'JSON'
{"format":{"format_name":"matroska,webm","duration":"120.0"},"streams":[{"index":0,"codec_type":"video","codec_name":"h264","display_aspect_ratio":"16:9"},{"index":1,"codec_type":"audio","codec_name":"ac3","channels":2}]}
JSON
else
  exec sleep 30
fi
"#;

/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_ping() {
///     let fixture = TestFixture::new();
///     let response = fixture.get("/ping").await;
///     assert_eq!(response.text, "pong");
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Temporary directory for media files, engine script and output
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Replace ffmpeg and ffprobe with a shell script
    pub fake_engine: bool,
    /// Remote transcode host for `/play`
    pub remote: Option<RemoteTranscodeConfig>,
}

impl TestConfig {
    pub fn with_fake_engine() -> Self {
        Self {
            fake_engine: true,
            remote: None,
        }
    }

    pub fn with_remote(remote: RemoteTranscodeConfig) -> Self {
        Self {
            fake_engine: false,
            remote: Some(remote),
        }
    }
}

impl TestFixture {
    /// Create a fixture with the default (real) engine paths and no remote host.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut transcode =
            TranscodeConfig::default().with_output_root(temp_dir.path().join("out"));
        if test_config.fake_engine {
            let engine = write_fake_engine(temp_dir.path());
            transcode = transcode.with_ffmpeg_path(engine.clone());
            transcode.ffprobe_path = engine;
        }

        let config = Config {
            transcode,
            remote: test_config.remote.clone(),
            ..Default::default()
        };

        let dispatcher = config.remote.as_ref().map(|remote| {
            Arc::new(
                RemoteDispatcher::from_config(remote, &config.playback)
                    .expect("Failed to create dispatcher"),
            )
        });

        let state = Arc::new(AppState::new(config, dispatcher));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            temp_dir,
        }
    }

    /// Create an (empty) media file inside the fixture directory.
    pub fn media_file(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, b"").expect("Failed to create media file");
        path
    }

    /// Query value for a source path.
    pub fn encoded(path: &Path) -> String {
        urlencoding::encode(&encode_path(path)).into_owned()
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

fn write_fake_engine(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-engine.sh");
    std::fs::write(&path, FAKE_ENGINE).expect("Failed to write fake engine");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake engine executable");
    path
}

#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
