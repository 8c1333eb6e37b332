//! Transcode orchestration for playback requests.
//!
//! This module turns a source file plus client playback options into a
//! running ffmpeg process producing browser-playable output.
//!
//! # Features
//!
//! - Audio track selection
//! - Subtitle burn-in (text rendering or bitmap overlay) and WebVTT extraction
//! - Stereoscopic 3D flattening with aspect ratio override
//! - Resizing, seeking (with a stream-copy pre-cut when burning subtitles)
//! - HLS event playlists or single-file output
//!
//! # Example
//!
//! ```ignore
//! use mediactl_core::transcode::{ProcessManager, TranscodeJob, TranscodeOptions};
//!
//! let manager = ProcessManager::new(config.transcode.clone());
//! let mut job = TranscodeJob::new(source, &config.transcode);
//! job.apply(&TranscodeOptions {
//!     sub_stream: Some("2".to_string()),
//!     remove_3d: Some(1),
//!     ..Default::default()
//! })?;
//!
//! let handle = job.start(&manager).await?;
//! println!("Playlist at {}", handle.output_file.display());
//!
//! // Later, from the same or another request
//! manager.stop(&handle).await;
//! ```

mod error;
mod job;
mod plan;
mod process;
mod registry;
mod subtitle;
mod types;

pub use error::TranscodeError;
pub use job::{BurnIn, TranscodeJob};
pub use plan::{plan, CommandPlan, FilterGraph, FilterStage, DEFAULT_ASPECT_RATIO};
pub use process::{command_line, ProcessManager};
pub use registry::JobRegistry;
pub use subtitle::{SubtitleExtractor, SubtitleOutcome};
pub use types::{
    AudioSelector, JobHandle, JobState, OutputMode, StereoMode, TranscodeOptions,
};
