//! Per-request transcode job.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::TranscodeError;
use super::plan::plan;
use super::process::ProcessManager;
use super::types::{
    AudioSelector, JobHandle, JobState, OutputMode, StereoMode, TranscodeOptions,
};
use crate::config::TranscodeConfig;
use crate::media::{SourceDescriptor, SubtitleTrack};

/// The subtitle that gets burnt into the picture, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnIn<'a> {
    /// An embedded track, selected by `0:s:{selector}`.
    Stream {
        selector: u32,
        track: &'a SubtitleTrack,
    },
    /// An external text subtitle file.
    File(&'a Path),
}

impl BurnIn<'_> {
    /// Bitmap subtitles need a pixel overlay instead of the text renderer.
    pub fn is_bitmap(&self) -> bool {
        match self {
            Self::Stream { track, .. } => track.is_bitmap(),
            Self::File(_) => false,
        }
    }
}

/// A transcode of one source file for one playback request.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    source: SourceDescriptor,
    output_dir: PathBuf,
    audio_stream: AudioSelector,
    subtitle_stream: Option<u32>,
    subtitle_file: Option<PathBuf>,
    start_offset_secs: u64,
    stereo_mode: StereoMode,
    resize_width: Option<u32>,
    encoder: String,
    crf: u8,
    output: OutputMode,
    default_segment_secs: u32,
    handle: Option<JobHandle>,
    state: JobState,
}

impl TranscodeJob {
    /// Creates a job writing into a fresh directory under `config.output_root`.
    pub fn new(source: SourceDescriptor, config: &TranscodeConfig) -> Self {
        let output_dir = config.output_root.join(Uuid::new_v4().to_string());
        Self::with_output_dir(source, config, output_dir)
    }

    /// Creates a job writing into the given directory.
    ///
    /// The directory is wiped when the job starts, so it must not be shared.
    pub fn with_output_dir(
        source: SourceDescriptor,
        config: &TranscodeConfig,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            output_dir,
            audio_stream: AudioSelector::Default,
            subtitle_stream: None,
            subtitle_file: None,
            start_offset_secs: 0,
            stereo_mode: StereoMode::None,
            resize_width: None,
            encoder: config.encoder.clone(),
            crf: config.crf,
            output: OutputMode::Segmented {
                segment_secs: config.segment_secs,
            },
            default_segment_secs: config.segment_secs,
            handle: None,
            state: JobState::New,
        }
    }

    /// Applies a client option set. Only allowed before the job starts.
    pub fn apply(&mut self, options: &TranscodeOptions) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;

        if let Some(ref audio) = options.audio_stream {
            self.audio_stream = AudioSelector::parse(audio)?;
        }
        if let Some(ref sub) = options.sub_stream {
            // Non-numeric selectors are ignored; negative ones clear the selection
            if let Ok(n) = sub.trim().parse::<i64>() {
                self.subtitle_stream = u32::try_from(n).ok();
            }
        }
        if let Some(ref name) = options.sub_file {
            if !name.is_empty() {
                let path = resolve_subtitle_file(&self.source.path, name)?;
                self.subtitle_file = Some(path);
            }
        }
        if let Some(offset) = options.start_from {
            self.start_offset_secs = offset;
        }
        if let Some(width) = options.resize {
            self.resize_width = match width {
                -1 => None,
                w if w < 0 => {
                    return Err(TranscodeError::invalid_option(format!(
                        "resize width must be positive, got {}",
                        w
                    )))
                }
                w => Some(u32::try_from(w).map_err(|_| {
                    TranscodeError::invalid_option(format!("resize width too large: {}", w))
                })?),
            };
        }
        if let Some(tag) = options.remove_3d {
            self.stereo_mode = StereoMode::from_tag(tag).ok_or_else(|| {
                TranscodeError::invalid_option(format!("unknown stereo mode tag: {}", tag))
            })?;
        }
        match (options.segmented, options.segment_seconds) {
            (Some(false), _) => self.output = OutputMode::SingleFile,
            (Some(true), Some(secs)) | (None, Some(secs)) => {
                self.output = OutputMode::Segmented { segment_secs: secs }
            }
            (Some(true), None) => {
                if self.output == OutputMode::SingleFile {
                    self.output = OutputMode::Segmented {
                        segment_secs: self.default_segment_secs,
                    };
                }
            }
            (None, None) => {}
        }
        if let Some(ref encoder) = options.encoder {
            self.encoder = encoder.clone();
        }
        if let Some(crf) = options.crf {
            self.crf = crf;
        }

        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_audio_stream(&mut self, selector: AudioSelector) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.audio_stream = selector;
        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_subtitle_stream(&mut self, selector: Option<u32>) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.subtitle_stream = selector;
        self.state = JobState::Configured;
        Ok(self)
    }

    /// Sets an external subtitle file by absolute path.
    pub fn set_subtitle_file(&mut self, path: Option<PathBuf>) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.subtitle_file = path;
        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_start_offset(&mut self, secs: u64) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.start_offset_secs = secs;
        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_stereo_mode(&mut self, mode: StereoMode) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.stereo_mode = mode;
        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_resize_width(&mut self, width: Option<u32>) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.resize_width = width;
        self.state = JobState::Configured;
        Ok(self)
    }

    pub fn set_output_mode(&mut self, output: OutputMode) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.output = output;
        self.state = JobState::Configured;
        Ok(self)
    }

    /// Overrides the configured encoder and quality factor.
    pub fn set_encoder(
        &mut self,
        encoder: impl Into<String>,
        crf: u8,
    ) -> Result<&mut Self, TranscodeError> {
        self.ensure_configurable("configure")?;
        self.encoder = encoder.into();
        self.crf = crf;
        self.state = JobState::Configured;
        Ok(self)
    }

    /// Plans and launches the engine, moving the job to `Running`.
    ///
    /// Planning errors leave the job untouched; launch errors mark it `Failed`.
    pub async fn start(&mut self, manager: &ProcessManager) -> Result<JobHandle, TranscodeError> {
        self.ensure_configurable("start")?;

        let plan = plan(self)?;
        match manager.start(&plan).await {
            Ok(handle) => {
                self.handle = Some(handle.clone());
                self.state = JobState::Running;
                Ok(handle)
            }
            Err(e) => {
                warn!(source = %self.source.path.display(), error = %e, "Transcode failed to start");
                self.state = JobState::Failed;
                Err(e)
            }
        }
    }

    /// Terminates the engine and removes the output directory.
    ///
    /// Calling this on a stopped or failed job is a no-op.
    pub async fn stop(&mut self, manager: &ProcessManager) {
        if self.state.is_terminal() {
            debug!(state = ?self.state, "Job already terminated");
            return;
        }

        match self.handle.take() {
            Some(handle) => manager.stop(&handle).await,
            None => manager.remove_output_dir(&self.output_dir).await,
        }
        self.state = JobState::Stopped;
    }

    /// Converts a player position (relative to the seek point) to a position in the source.
    pub fn watched_duration(&self, position_secs: f64) -> f64 {
        position_secs + self.start_offset_secs as f64
    }

    /// The playlist or single file the engine writes.
    pub fn output_file(&self) -> PathBuf {
        match self.output {
            OutputMode::Segmented { .. } => self.output_dir.join("stream.m3u8"),
            OutputMode::SingleFile => self
                .output_dir
                .join(format!("stream.{}", self.source.container_extension())),
        }
    }

    /// The subtitle to burn in. A stream selector wins over a subtitle file.
    ///
    /// Returns `None` when the selector points past the known tracks; the
    /// planner reports that as an invalid option.
    pub fn burn_in(&self) -> Option<BurnIn<'_>> {
        match (self.subtitle_stream, self.subtitle_file.as_deref()) {
            (Some(selector), _) => self
                .source
                .subtitle(selector)
                .map(|track| BurnIn::Stream { selector, track }),
            (None, Some(file)) => Some(BurnIn::File(file)),
            (None, None) => None,
        }
    }

    /// Whether the selected subtitle stream is bitmap-based.
    pub fn is_bitmap_subtitle(&self) -> bool {
        self.subtitle_stream
            .and_then(|s| self.source.subtitle(s))
            .map(|t| t.is_bitmap())
            .unwrap_or(false)
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn audio_stream(&self) -> AudioSelector {
        self.audio_stream
    }

    pub fn subtitle_stream(&self) -> Option<u32> {
        self.subtitle_stream
    }

    pub fn subtitle_file(&self) -> Option<&Path> {
        self.subtitle_file.as_deref()
    }

    pub fn start_offset_secs(&self) -> u64 {
        self.start_offset_secs
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn resize_width(&self) -> Option<u32> {
        self.resize_width
    }

    pub fn encoder(&self) -> &str {
        &self.encoder
    }

    pub fn crf(&self) -> u8 {
        self.crf
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    pub fn handle(&self) -> Option<&JobHandle> {
        self.handle.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn ensure_configurable(&self, action: &'static str) -> Result<(), TranscodeError> {
        if self.state.is_configurable() {
            Ok(())
        } else {
            Err(TranscodeError::InvalidState {
                state: self.state,
                action,
            })
        }
    }
}

/// Resolves a user-supplied subtitle file name next to the source file.
///
/// Only bare file names are accepted.
fn resolve_subtitle_file(source: &Path, name: &str) -> Result<PathBuf, TranscodeError> {
    let candidate = Path::new(name);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => {}
        _ => {
            return Err(TranscodeError::invalid_option(format!(
                "subtitle file must be a plain file name, got {:?}",
                name
            )))
        }
    }

    let dir = source.parent().unwrap_or_else(|| Path::new("/"));
    Ok(dir.join(candidate))
}
