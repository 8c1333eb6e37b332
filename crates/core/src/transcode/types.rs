//! Types for the transcode module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::TranscodeError;

/// Stereoscopic layout of the source video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StereoMode {
    /// Flat (mono) video, nothing to do.
    #[default]
    None,
    /// Left and right eyes next to each other.
    SideBySide,
    /// Left eye above the right eye.
    TopAndBottom,
}

impl StereoMode {
    /// Maps the numeric tag clients send (`0`, `1` = SBS, `2` = TAB).
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            1 => Some(Self::SideBySide),
            2 => Some(Self::TopAndBottom),
            _ => None,
        }
    }

    /// The ffmpeg `stereo3d` expression extracting the left eye as mono.
    pub fn flatten_filter(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::SideBySide => Some("stereo3d=sbsl:ml"),
            Self::TopAndBottom => Some("stereo3d=abl:ml"),
        }
    }

    pub fn is_stereo(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Which audio track ends up in the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSelector {
    /// No explicit mapping, ffmpeg picks the default track.
    #[default]
    Default,
    /// Explicitly map `0:a:N`.
    Track(u32),
}

impl AudioSelector {
    /// Parses the client representation, where `"0"` means "default".
    pub fn parse(value: &str) -> Result<Self, TranscodeError> {
        match value.trim().parse::<u32>() {
            Ok(0) => Ok(Self::Default),
            Ok(n) => Ok(Self::Track(n)),
            Err(_) => Err(TranscodeError::invalid_option(format!(
                "audio stream must be a track number, got {:?}",
                value
            ))),
        }
    }
}

/// Shape of the produced artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputMode {
    /// HLS event playlist `stream.m3u8` plus `stream000.ts`, `stream001.ts`, ...
    Segmented { segment_secs: u32 },
    /// A single `stream.{ext}` file using the source container's extension.
    SingleFile,
}

/// Lifecycle state of a transcode job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    New,
    Configured,
    Running,
    Stopped,
    Failed,
}

impl JobState {
    /// Whether the job still accepts option changes.
    pub fn is_configurable(&self) -> bool {
        matches!(self, Self::New | Self::Configured)
    }

    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

/// Reference to a running engine process and the directory it writes to.
///
/// Callers persist this (it is serde-serializable) and hand it back to
/// [`ProcessManager::stop`](super::ProcessManager::stop).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// OS process id of the main ffmpeg process.
    pub pid: u32,
    /// Directory exclusively owned by the job.
    pub output_dir: PathBuf,
    /// Playlist or single output file clients poll for.
    pub output_file: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Playback options as sent by clients.
///
/// Field names follow the request keys (`audioStream`, `subStream`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_stream: Option<String>,
    /// Subtitle track number; values that are not integers are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_stream: Option<String>,
    /// Name of a subtitle file next to the source; empty is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_from: Option<u64>,
    /// Target width; `-1` means no resize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<i64>,
    #[serde(default, rename = "remove3D", skip_serializing_if = "Option::is_none")]
    pub remove_3d: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmented: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crf: Option<u8>,
}
