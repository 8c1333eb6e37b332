//! Remote transcode host client.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::transcode::TranscodeError;

/// Body the liveness endpoint answers with.
pub const PONG: &str = "pong";

/// A machine that can run transcodes on our behalf.
#[async_trait]
pub trait TranscodeHost: Send + Sync {
    /// Whether the host answered the liveness probe.
    async fn ping(&self) -> bool;

    /// Submits a transcode of `path` for `user`.
    async fn submit(&self, user: &str, path: &Path) -> Result<(), TranscodeError>;
}

/// [`TranscodeHost`] speaking the HTTP contract of the transcoder binary.
pub struct HttpTranscodeHost {
    client: Client,
    base_url: String,
}

impl HttpTranscodeHost {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TranscodeError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn transcode_url(&self, user: &str, path: &Path) -> String {
        format!(
            "{}/transcode?user={}&file={}",
            self.base_url,
            urlencoding::encode(user),
            urlencoding::encode(&encode_path(path))
        )
    }
}

#[async_trait]
impl TranscodeHost for HttpTranscodeHost {
    async fn ping(&self) -> bool {
        let url = format!("{}/ping", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Liveness probe failed");
                return false;
            }
        };
        if !response.status().is_success() {
            debug!(url = %url, status = %response.status(), "Liveness probe rejected");
            return false;
        }
        match response.text().await {
            Ok(body) => body.trim() == PONG,
            Err(e) => {
                debug!(url = %url, error = %e, "Liveness probe body unreadable");
                false
            }
        }
    }

    async fn submit(&self, user: &str, path: &Path) -> Result<(), TranscodeError> {
        let response = self
            .client
            .get(self.transcode_url(user, path))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Remote host refused transcode");
            Err(TranscodeError::RemoteRejected {
                reason: format!("status {}", status),
            })
        }
    }
}

/// Encodes a source path for transport in a query string (before URL encoding).
pub fn encode_path(path: &Path) -> String {
    STANDARD.encode(path.to_string_lossy().as_bytes())
}

/// Decodes a path produced by [`encode_path`].
pub fn decode_path(encoded: &str) -> Result<PathBuf, TranscodeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TranscodeError::invalid_option(format!("file is not valid base64: {}", e)))?;
    let path = String::from_utf8(bytes)
        .map_err(|_| TranscodeError::invalid_option("file is not valid UTF-8"))?;
    if path.is_empty() {
        return Err(TranscodeError::invalid_option("file is empty"));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_encoding() {
        let path = Path::new("/media/movies/Heat (1995)/Heat (1995).mkv");
        let encoded = encode_path(path);
        assert_eq!(encoded, "L21lZGlhL21vdmllcy9IZWF0ICgxOTk1KS9IZWF0ICgxOTk1KS5ta3Y=");
        assert_eq!(decode_path(&encoded).unwrap(), path);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_path("not base64!"),
            Err(TranscodeError::InvalidOption { .. })
        ));
        assert!(decode_path("").is_err());
    }

    #[test]
    fn test_transcode_url() {
        let host = HttpTranscodeHost::new("http://transcoder.lan:8080/", Duration::from_secs(5))
            .unwrap();
        let url = host.transcode_url("alice smith", Path::new("/m/a.mkv"));
        assert_eq!(
            url,
            "http://transcoder.lan:8080/transcode?user=alice%20smith&file=L20vYS5ta3Y%3D"
        );
    }

    #[tokio::test]
    async fn test_ping_unreachable_host() {
        let host =
            HttpTranscodeHost::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(!host.ping().await);
    }
}
