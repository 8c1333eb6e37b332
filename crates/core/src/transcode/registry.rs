//! Per-user table of running transcodes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::process::ProcessManager;
use super::types::JobHandle;

/// Tracks the running job of each user; a user has at most one.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, JobHandle>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `handle` for `user`, stopping the job it replaces.
    pub async fn replace(&self, user: &str, handle: JobHandle, manager: &ProcessManager) {
        let previous = {
            let mut jobs = self.jobs.write().await;
            jobs.insert(user.to_string(), handle)
        };
        if let Some(previous) = previous {
            info!(user, pid = previous.pid, "Replacing running transcode");
            manager.stop(&previous).await;
        }
    }

    /// Stops and forgets the user's job. Returns whether there was one.
    pub async fn stop(&self, user: &str, manager: &ProcessManager) -> bool {
        let handle = self.jobs.write().await.remove(user);
        match handle {
            Some(handle) => {
                manager.stop(&handle).await;
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, user: &str) -> Option<JobHandle> {
        self.jobs.read().await.get(user).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Stops every tracked job.
    pub async fn stop_all(&self, manager: &ProcessManager) {
        let handles: Vec<JobHandle> = self.jobs.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            manager.stop(&handle).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscodeConfig;
    use chrono::Utc;
    use std::path::Path;
    use tempfile::TempDir;

    // Handles with a pid that cannot exist, so stop only cleans the directory.
    fn handle(dir: &Path) -> JobHandle {
        std::fs::create_dir_all(dir).unwrap();
        JobHandle {
            pid: i32::MAX as u32,
            output_dir: dir.to_path_buf(),
            output_file: dir.join("stream.m3u8"),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replace_stops_previous_job() {
        let root = TempDir::new().unwrap();
        let manager = ProcessManager::new(TranscodeConfig::default());
        let registry = JobRegistry::new();

        let first = handle(&root.path().join("first"));
        let second = handle(&root.path().join("second"));
        registry.replace("alice", first.clone(), &manager).await;
        registry.replace("alice", second.clone(), &manager).await;

        assert!(!first.output_dir.exists());
        assert!(second.output_dir.exists());
        assert_eq!(registry.get("alice").await, Some(second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_stop_removes_entry() {
        let root = TempDir::new().unwrap();
        let manager = ProcessManager::new(TranscodeConfig::default());
        let registry = JobRegistry::new();

        let job = handle(&root.path().join("job"));
        registry.replace("bob", job.clone(), &manager).await;

        assert!(registry.stop("bob", &manager).await);
        assert!(!job.output_dir.exists());
        assert!(!registry.stop("bob", &manager).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let root = TempDir::new().unwrap();
        let manager = ProcessManager::new(TranscodeConfig::default());
        let registry = JobRegistry::new();

        registry
            .replace("alice", handle(&root.path().join("a")), &manager)
            .await;
        registry
            .replace("bob", handle(&root.path().join("b")), &manager)
            .await;
        assert_eq!(registry.len().await, 2);

        registry.stop_all(&manager).await;
        assert!(registry.is_empty().await);
        assert!(!root.path().join("a").exists());
        assert!(!root.path().join("b").exists());
    }
}
