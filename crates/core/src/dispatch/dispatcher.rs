//! Local-or-remote decision with wake-up and retry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::host::{HttpTranscodeHost, TranscodeHost};
use super::wake::{MagicPacketSender, WakeSignal};
use crate::config::{PlaybackConfig, RemoteTranscodeConfig};
use crate::media::SourceDescriptor;
use crate::metrics;
use crate::transcode::TranscodeError;

/// A playback request to route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub user_id: String,
    pub path: PathBuf,
}

impl DispatchRequest {
    pub fn new(user_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            user_id: user_id.into(),
            path: path.into(),
        }
    }
}

/// Where a request ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// The source plays as-is; nothing was sent anywhere.
    pub handled_locally: bool,
    /// The file is playable or the remote host accepted the transcode.
    pub accepted: bool,
    /// Liveness rounds used.
    pub attempts: u32,
}

impl DispatchOutcome {
    fn local() -> Self {
        Self {
            handled_locally: true,
            accepted: true,
            attempts: 0,
        }
    }

    fn remote(accepted: bool, attempts: u32) -> Self {
        Self {
            handled_locally: false,
            accepted,
            attempts,
        }
    }

    /// Turns a refused dispatch into [`TranscodeError::RemoteUnavailable`].
    pub fn require_accepted(self) -> Result<Self, TranscodeError> {
        if self.accepted {
            Ok(self)
        } else {
            Err(TranscodeError::RemoteUnavailable {
                attempts: self.attempts,
            })
        }
    }

    fn label(&self) -> &'static str {
        match (self.handled_locally, self.accepted) {
            (true, _) => "local",
            (false, true) => "accepted",
            (false, false) => "unavailable",
        }
    }
}

/// Routes playback requests to a remote transcode host, waking it if needed.
pub struct RemoteDispatcher {
    host: Arc<dyn TranscodeHost>,
    wake: Arc<dyn WakeSignal>,
    playable_extensions: Vec<String>,
    max_attempts: u32,
    poll_interval: Duration,
}

impl RemoteDispatcher {
    pub fn new(
        host: Arc<dyn TranscodeHost>,
        wake: Arc<dyn WakeSignal>,
        playable_extensions: Vec<String>,
        max_attempts: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            host,
            wake,
            playable_extensions,
            max_attempts,
            poll_interval,
        }
    }

    /// Builds a dispatcher talking HTTP to the configured host.
    pub fn from_config(
        remote: &RemoteTranscodeConfig,
        playback: &PlaybackConfig,
    ) -> Result<Self, TranscodeError> {
        let host = HttpTranscodeHost::new(
            remote.url.clone(),
            Duration::from_secs(remote.request_timeout_secs),
        )?;
        let wake = MagicPacketSender::new(&remote.mac_address, remote.broadcast_addr)?;
        Ok(Self::new(
            Arc::new(host),
            Arc::new(wake),
            playback.playable_extensions.clone(),
            remote.max_attempts,
            Duration::from_secs(remote.poll_interval_secs),
        ))
    }

    /// Decides where the request runs and, if remote, hands it over.
    ///
    /// Blocks for up to `max_attempts * poll_interval` while the host wakes up.
    pub async fn dispatch(&self, request: &DispatchRequest) -> DispatchOutcome {
        let started = Instant::now();
        let outcome = self.route(request).await;
        let label = outcome.label();
        metrics::DISPATCH_OUTCOMES.with_label_values(&[label]).inc();
        metrics::DISPATCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());
        outcome
    }

    /// Runs [`dispatch`](Self::dispatch) on a background task.
    pub fn spawn_dispatch(self: Arc<Self>, request: DispatchRequest) -> JoinHandle<DispatchOutcome> {
        tokio::spawn(async move { self.dispatch(&request).await })
    }

    async fn route(&self, request: &DispatchRequest) -> DispatchOutcome {
        if SourceDescriptor::new(&request.path).is_playable_as_is(&self.playable_extensions) {
            debug!(path = %request.path.display(), "Source is directly playable");
            return DispatchOutcome::local();
        }

        let Some(attempts) = self.wait_for_host().await else {
            warn!(
                user = %request.user_id,
                attempts = self.max_attempts,
                "Remote transcode host unreachable"
            );
            return DispatchOutcome::remote(false, self.max_attempts);
        };

        match self.host.submit(&request.user_id, &request.path).await {
            Ok(()) => {
                info!(
                    user = %request.user_id,
                    path = %request.path.display(),
                    attempts,
                    "Remote transcode accepted"
                );
                DispatchOutcome::remote(true, attempts)
            }
            Err(e) => {
                warn!(user = %request.user_id, error = %e, "Remote transcode submission failed");
                DispatchOutcome::remote(false, attempts)
            }
        }
    }

    /// Probes until the host answers. Returns the round it answered in.
    async fn wait_for_host(&self) -> Option<u32> {
        for attempt in 1..=self.max_attempts {
            if self.host.ping().await {
                metrics::REMOTE_PROBES.with_label_values(&["alive"]).inc();
                return Some(attempt);
            }
            metrics::REMOTE_PROBES.with_label_values(&["unreachable"]).inc();
            debug!(attempt, max_attempts = self.max_attempts, "Remote host not answering");

            // One wake signal per dispatch
            if attempt == 1 {
                match self.wake.wake().await {
                    Ok(()) => metrics::WAKE_SIGNALS.with_label_values(&["sent"]).inc(),
                    Err(e) => {
                        metrics::WAKE_SIGNALS.with_label_values(&["failed"]).inc();
                        warn!(error = %e, "Failed to send wake signal");
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        None
    }
}
