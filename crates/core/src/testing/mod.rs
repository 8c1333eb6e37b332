//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the dispatch seams and
//! canned source descriptors, allowing the dispatcher and the planner to be
//! exercised without a network, a remote machine or real media files.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediactl_core::testing::{fixtures, MockTranscodeHost, MockWakeSignal};
//!
//! let host = Arc::new(MockTranscodeHost::new());
//! let wake = Arc::new(MockWakeSignal::new());
//!
//! // Host sleeps through the first probe
//! host.set_ping_responses(vec![false]).await;
//!
//! let job = TranscodeJob::new(fixtures::movie_source(), &config.transcode);
//! ```

mod mock_transcode_host;
mod mock_wake_signal;

pub use mock_transcode_host::{MockTranscodeHost, RecordedSubmission};
pub use mock_wake_signal::MockWakeSignal;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::media::{AudioTrack, SourceDescriptor, SubtitleTrack};

    /// A stereoscopic Matroska movie with text and bitmap subtitles.
    ///
    /// Subtitle selectors: `0` subrip, `1` PGS, `2` DVD.
    /// Audio selectors: `0` DTS 5.1, `1` AC-3 stereo.
    pub fn movie_source() -> SourceDescriptor {
        let mut source = SourceDescriptor::new("/media/movies/Heat (1995)/Heat (1995).mkv");
        source.format = "matroska".to_string();
        source.duration_secs = 10_223.0;
        source.ratio = Some("12:5".to_string());
        source.video_codec = Some("h264".to_string());
        source.audio = vec![
            AudioTrack {
                index: 1,
                codec: "dts".to_string(),
                channels: Some(6),
                language: Some("eng".to_string()),
            },
            AudioTrack {
                index: 2,
                codec: "ac3".to_string(),
                channels: Some(2),
                language: Some("fre".to_string()),
            },
        ];
        source.subtitles = vec![
            SubtitleTrack {
                index: 3,
                codec: "subrip".to_string(),
                language: Some("eng".to_string()),
            },
            SubtitleTrack {
                index: 4,
                codec: "hdmv_pgs_subtitle".to_string(),
                language: Some("eng".to_string()),
            },
            SubtitleTrack {
                index: 5,
                codec: "dvd_subtitle".to_string(),
                language: Some("fre".to_string()),
            },
        ];
        source
    }

    /// A directly playable MP4 with no subtitles.
    pub fn mp4_source() -> SourceDescriptor {
        let mut source = SourceDescriptor::new("/media/clips/trailer.mp4");
        source.format = "mov".to_string();
        source.duration_secs = 142.0;
        source.ratio = Some("16:9".to_string());
        source.video_codec = Some("h264".to_string());
        source.audio = vec![AudioTrack {
            index: 1,
            codec: "aac".to_string(),
            channels: Some(2),
            language: None,
        }];
        source
    }
}
