//! Mock transcode host for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::dispatch::TranscodeHost;
use crate::transcode::TranscodeError;

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub user: String,
    pub path: PathBuf,
}

/// Mock implementation of the TranscodeHost trait.
///
/// Provides controllable behavior for testing:
/// - Scripted liveness answers, then a fixed fallback
/// - Track probe times and submissions for assertions
/// - Simulate the host refusing jobs
///
/// # Example
///
/// ```rust,ignore
/// use mediactl_core::testing::MockTranscodeHost;
///
/// let host = MockTranscodeHost::new();
///
/// // Asleep for two rounds, then awake
/// host.set_ping_responses(vec![false, false]).await;
///
/// assert!(!host.ping().await);
/// assert!(!host.ping().await);
/// assert!(host.ping().await);
/// ```
#[derive(Debug)]
pub struct MockTranscodeHost {
    /// Answers consumed by the next probes.
    ping_responses: Arc<RwLock<VecDeque<bool>>>,
    /// Answer once the scripted responses run out.
    alive: Arc<RwLock<bool>>,
    /// When each probe happened.
    pings: Arc<RwLock<Vec<Instant>>>,
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// Whether submissions are refused.
    reject_submissions: Arc<RwLock<bool>>,
}

impl Default for MockTranscodeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTranscodeHost {
    /// Create a mock host that is awake and accepts everything.
    pub fn new() -> Self {
        Self {
            ping_responses: Arc::new(RwLock::new(VecDeque::new())),
            alive: Arc::new(RwLock::new(true)),
            pings: Arc::new(RwLock::new(Vec::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            reject_submissions: Arc::new(RwLock::new(false)),
        }
    }

    /// Script the next liveness answers.
    pub async fn set_ping_responses(&self, responses: Vec<bool>) {
        *self.ping_responses.write().await = responses.into();
    }

    /// Set the answer used once scripted responses are exhausted.
    pub async fn set_alive(&self, alive: bool) {
        *self.alive.write().await = alive;
    }

    /// Make submissions fail.
    pub async fn set_reject_submissions(&self, reject: bool) {
        *self.reject_submissions.write().await = reject;
    }

    /// Get the number of probes received.
    pub async fn ping_count(&self) -> usize {
        self.pings.read().await.len()
    }

    /// Get the instants at which probes were received.
    pub async fn ping_times(&self) -> Vec<Instant> {
        self.pings.read().await.clone()
    }

    /// Get all recorded submissions.
    pub async fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Get the number of submissions received.
    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

#[async_trait]
impl TranscodeHost for MockTranscodeHost {
    async fn ping(&self) -> bool {
        self.pings.write().await.push(Instant::now());
        match self.ping_responses.write().await.pop_front() {
            Some(answer) => answer,
            None => *self.alive.read().await,
        }
    }

    async fn submit(&self, user: &str, path: &Path) -> Result<(), TranscodeError> {
        self.submissions.write().await.push(RecordedSubmission {
            user: user.to_string(),
            path: path.to_path_buf(),
        });
        if *self.reject_submissions.read().await {
            return Err(TranscodeError::RemoteRejected {
                reason: "status 500 Internal Server Error".to_string(),
            });
        }
        Ok(())
    }
}
