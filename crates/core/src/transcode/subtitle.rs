//! Sidecar subtitle extraction to WebVTT.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::TranscodeError;
use super::job::TranscodeJob;
use crate::metrics;

/// Result of a subtitle extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleOutcome {
    /// WebVTT document produced by the engine.
    WebVtt(String),
    /// The selected track is bitmap-based and has no text cues.
    Unsupported,
    /// The job has neither a subtitle stream nor a subtitle file.
    NotRequested,
}

impl SubtitleOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::WebVtt(_) => "webvtt",
            Self::Unsupported => "unsupported",
            Self::NotRequested => "not_requested",
        }
    }
}

/// Runs one-shot engine invocations converting a subtitle to WebVTT.
#[derive(Debug, Clone)]
pub struct SubtitleExtractor {
    ffmpeg_path: PathBuf,
}

impl SubtitleExtractor {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Extracts the job's subtitle. A stream selector wins over a file.
    pub async fn extract(&self, job: &TranscodeJob) -> Result<SubtitleOutcome, TranscodeError> {
        let result = self.extract_inner(job).await;
        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(_) => "failed",
        };
        metrics::SUBTITLE_EXTRACTIONS.with_label_values(&[label]).inc();
        result
    }

    async fn extract_inner(&self, job: &TranscodeJob) -> Result<SubtitleOutcome, TranscodeError> {
        if let Some(selector) = job.subtitle_stream() {
            let track = job.source().subtitle(selector).ok_or_else(|| {
                TranscodeError::invalid_option(format!(
                    "subtitle stream {} does not exist",
                    selector
                ))
            })?;
            if track.is_bitmap() {
                debug!(codec = %track.codec, "Bitmap subtitle has no text cues");
                return Ok(SubtitleOutcome::Unsupported);
            }
            let map = format!("0:s:{}", selector);
            return self
                .run(&job.source().path, &["-map", map.as_str()])
                .await
                .map(SubtitleOutcome::WebVtt);
        }

        match job.subtitle_file() {
            Some(file) => self.run(file, &[]).await.map(SubtitleOutcome::WebVtt),
            None => Ok(SubtitleOutcome::NotRequested),
        }
    }

    async fn run(&self, input: &Path, extra: &[&str]) -> Result<String, TranscodeError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-loglevel", "panic", "-i"])
            .arg(input)
            .args(extra)
            .args(["-f", "webvtt", "-"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::spawn_failed(format!(
                        "ffmpeg not found at path: {}",
                        self.ffmpeg_path.display()
                    ))
                } else {
                    TranscodeError::spawn_failed(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::spawn_failed(format!(
                "subtitle extraction exited with code {:?}",
                output.status.code()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
