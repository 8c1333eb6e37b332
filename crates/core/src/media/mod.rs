//! Source media description and probing.
//!
//! The storage layer hands the transcode subsystem a [`SourceDescriptor`]:
//! the file path, its container extension and per-stream metadata. When no
//! stored metadata is available, [`probe`] builds one from ffprobe output.

mod probe;
mod types;

pub use probe::{parse_probe_output, probe};
pub use types::{AudioTrack, SourceDescriptor, SubtitleTrack, BITMAP_SUBTITLE_CODECS};
