//! Engine process lifecycle: launch, reap, terminate, clean up.

use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::TranscodeError;
use super::plan::CommandPlan;
use super::types::JobHandle;
use crate::config::TranscodeConfig;
use crate::metrics;

/// Launches and terminates ffmpeg processes for command plans.
///
/// Clones share the table of launched children.
#[derive(Debug, Clone)]
pub struct ProcessManager {
    config: TranscodeConfig,
    /// Exit flag of each launched child, set by its reaper. A reaped pid
    /// may be handed out again by the OS, so it must never be signalled.
    children: Arc<RwLock<HashMap<u32, Arc<AtomicBool>>>>,
}

impl ProcessManager {
    pub fn new(config: TranscodeConfig) -> Self {
        Self {
            config,
            children: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Runs a plan: prepares the output directory, runs the pre-cut to
    /// completion, then launches the main process without waiting for it.
    pub async fn start(&self, plan: &CommandPlan) -> Result<JobHandle, TranscodeError> {
        let result = self.launch(plan).await;
        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::TRANSCODES_STARTED.with_label_values(&[label]).inc();
        if result.is_err() {
            self.remove_output_dir(&plan.output_dir).await;
        }
        result
    }

    async fn launch(&self, plan: &CommandPlan) -> Result<JobHandle, TranscodeError> {
        prepare_output_dir(&plan.output_dir).await?;

        let ffmpeg = &self.config.ffmpeg_path;

        if let Some(ref pre_cut) = plan.pre_cut {
            info!(command = %command_line(ffmpeg, pre_cut), "Running pre-cut");
            let started = Instant::now();
            let output = Command::new(ffmpeg)
                .args(pre_cut)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .await
                .map_err(|e| self.spawn_error(e))?;

            let label = if output.status.success() { "success" } else { "failed" };
            metrics::PRE_CUT_DURATION
                .with_label_values(&[label])
                .observe(started.elapsed().as_secs_f64());

            if !output.status.success() {
                return Err(TranscodeError::spawn_failed(format!(
                    "pre-cut exited with code {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
        }

        info!(command = %command_line(ffmpeg, &plan.main), "Starting transcode");
        let mut child = Command::new(ffmpeg)
            .args(&plan.main)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let Some(pid) = child.id() else {
            return Err(TranscodeError::spawn_failed(
                "engine exited before its pid could be read",
            ));
        };

        // A recycled pid belongs to the new child now
        let exited = Arc::new(AtomicBool::new(false));
        self.children.write().await.insert(pid, Arc::clone(&exited));

        metrics::TRANSCODES_RUNNING.inc();
        // Reap the child so it never lingers as a zombie
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(pid, ?status, "Transcode process exited"),
                Err(e) => warn!(pid, error = %e, "Failed to wait for transcode process"),
            }
            exited.store(true, Ordering::SeqCst);
            metrics::TRANSCODES_RUNNING.dec();
        });

        Ok(JobHandle {
            pid,
            output_dir: plan.output_dir.clone(),
            output_file: plan.output_file.clone(),
            started_at: Utc::now(),
        })
    }

    /// Terminates the process and removes its output directory.
    ///
    /// A process that already exited is not an error. Processes this manager
    /// has reaped are not signalled again.
    pub async fn stop(&self, handle: &JobHandle) {
        if self.has_exited(handle.pid).await {
            debug!(pid = handle.pid, "Transcode process already exited");
        } else if let Err(e) = terminate(handle.pid).await {
            warn!(pid = handle.pid, error = %e, "Failed to signal transcode process");
        }
        self.remove_output_dir(&handle.output_dir).await;
        metrics::TRANSCODES_STOPPED.inc();
        info!(pid = handle.pid, output_dir = %handle.output_dir.display(), "Stopped transcode");
    }

    /// Whether a process launched by this manager has exited and been reaped.
    pub async fn has_exited(&self, pid: u32) -> bool {
        self.children
            .read()
            .await
            .get(&pid)
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Recursively removes a job directory. Missing directories are ignored.
    pub async fn remove_output_dir(&self, dir: &Path) {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => debug!(dir = %dir.display(), "Removed output directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to remove output directory"),
        }
    }

    fn spawn_error(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::spawn_failed(format!(
                "ffmpeg not found at path: {}",
                self.config.ffmpeg_path.display()
            ))
        } else {
            TranscodeError::spawn_failed(e.to_string())
        }
    }
}

/// Empties the job directory, creating it if needed.
async fn prepare_output_dir(dir: &Path) -> Result<(), TranscodeError> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(TranscodeError::spawn_failed(format!(
                "cannot clear output directory {}: {}",
                dir.display(),
                e
            )))
        }
    }
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        TranscodeError::spawn_failed(format!(
            "cannot create output directory {}: {}",
            dir.display(),
            e
        ))
    })
}

#[cfg(unix)]
async fn terminate(pid: u32) -> Result<(), TranscodeError> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| TranscodeError::invalid_option(format!("invalid pid: {}", pid)))?;
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(TranscodeError::Io(std::io::Error::from(e))),
    }
}

#[cfg(windows)]
async fn terminate(pid: u32) -> Result<(), TranscodeError> {
    Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/F"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    Ok(())
}

/// Renders a command for logs, quoting arguments that contain spaces.
pub fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) || arg.is_empty() {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn manager(engine: &str) -> ProcessManager {
        ProcessManager::new(TranscodeConfig::default().with_ffmpeg_path(PathBuf::from(engine)))
    }

    fn shell_plan(dir: &Path, pre_cut: Option<&str>, main: &str) -> CommandPlan {
        CommandPlan {
            output_dir: dir.to_path_buf(),
            pre_cut: pre_cut.map(|script| vec!["-c".to_string(), script.to_string()]),
            main: vec!["-c".to_string(), main.to_string()],
            filter_graph: None,
            output_file: dir.join("stream.m3u8"),
        }
    }

    fn is_alive(pid: u32) -> bool {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;
        kill(Pid::from_raw(pid as i32), None).is_ok()
    }

    #[tokio::test]
    async fn test_start_recreates_output_dir() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.ts"), b"old").unwrap();

        let manager = manager("/bin/sh");
        let handle = manager
            .start(&shell_plan(&dir, None, "sleep 30"))
            .await
            .unwrap();

        assert!(dir.is_dir());
        assert!(!dir.join("stale.ts").exists());
        assert_eq!(handle.output_dir, dir);
        assert_eq!(handle.output_file, dir.join("stream.m3u8"));

        manager.stop(&handle).await;
    }

    #[tokio::test]
    async fn test_stop_terminates_and_removes_dir() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        let manager = manager("/bin/sh");
        let handle = manager
            .start(&shell_plan(&dir, None, "sleep 30"))
            .await
            .unwrap();
        assert!(is_alive(handle.pid));

        manager.stop(&handle).await;
        assert!(!dir.exists());

        // The reaper collects the exit status shortly after the signal
        let mut alive = true;
        for _ in 0..50 {
            if !is_alive(handle.pid) {
                alive = false;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(!alive);
    }

    #[tokio::test]
    async fn test_stop_after_exit_is_harmless() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        let manager = manager("/bin/sh");
        let handle = manager
            .start(&shell_plan(&dir, None, "exit 0"))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        manager.stop(&handle).await;
        manager.stop(&handle).await;
        assert!(!dir.exists());
    }

    async fn wait_until_exited(manager: &ProcessManager, pid: u32) {
        for _ in 0..100 {
            if manager.has_exited(pid).await {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("process {} was not reaped", pid);
    }

    #[tokio::test]
    async fn test_reaped_pid_is_not_signalled() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        let manager = manager("/bin/sh");
        let handle = manager
            .start(&shell_plan(&dir, None, "exit 0"))
            .await
            .unwrap();
        wait_until_exited(&manager, handle.pid).await;

        // Stand in for a process that was given the recycled pid
        let mut bystander = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let recycled = JobHandle {
            pid: bystander.id(),
            ..handle.clone()
        };
        manager
            .children
            .write()
            .await
            .insert(recycled.pid, Arc::new(AtomicBool::new(true)));

        manager.stop(&recycled).await;
        manager.stop(&recycled).await;
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(bystander.try_wait().unwrap().is_none());
        assert!(!dir.exists());

        bystander.kill().unwrap();
        bystander.wait().unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_reaped_pids() {
        let root = TempDir::new().unwrap();
        let manager = manager("/bin/sh");
        let clone = manager.clone();
        let handle = manager
            .start(&shell_plan(&root.path().join("job"), None, "exit 0"))
            .await
            .unwrap();

        wait_until_exited(&clone, handle.pid).await;
        clone.stop(&handle).await;
        assert!(manager.has_exited(handle.pid).await);
    }

    #[tokio::test]
    async fn test_pre_cut_runs_before_main() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        let marker = dir.join("temp.mkv");
        let script = format!("touch '{}'", marker.display());

        let manager = manager("/bin/sh");
        let handle = manager
            .start(&shell_plan(&dir, Some(&script), "sleep 30"))
            .await
            .unwrap();

        assert!(marker.exists());
        manager.stop(&handle).await;
    }

    #[tokio::test]
    async fn test_failed_pre_cut_is_spawn_error() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("job");
        let manager = manager("/bin/sh");

        let err = manager
            .start(&shell_plan(&dir, Some("exit 1"), "sleep 30"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_missing_engine_is_spawn_error() {
        let root = TempDir::new().unwrap();
        let manager = manager("/nonexistent/ffmpeg");
        let err = manager
            .start(&shell_plan(&root.path().join("job"), None, "sleep 1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/ffmpeg"));
    }

    #[tokio::test]
    async fn test_remove_missing_dir_is_silent() {
        let manager = manager("/bin/sh");
        manager
            .remove_output_dir(&PathBuf::from("/nonexistent/mediactl/job"))
            .await;
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let line = command_line(
            Path::new("ffmpeg"),
            &["-i".to_string(), "/media/Heat (1995).mkv".to_string()],
        );
        assert_eq!(line, r#"ffmpeg -i "/media/Heat (1995).mkv""#);
    }
}
