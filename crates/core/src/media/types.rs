//! Source media descriptors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Subtitle codecs stored as pre-rendered images rather than text cues.
pub const BITMAP_SUBTITLE_CODECS: &[&str] = &["hdmv_pgs_subtitle", "dvd_subtitle"];

/// An audio track of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Global stream index in the container.
    pub index: u32,
    pub codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A subtitle track of a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Global stream index in the container.
    pub index: u32,
    pub codec: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SubtitleTrack {
    /// Whether the track holds bitmap subtitles that need a pixel overlay.
    pub fn is_bitmap(&self) -> bool {
        BITMAP_SUBTITLE_CODECS.contains(&self.codec.as_str())
    }
}

/// Read-only description of a source file, as known to the storage layer.
///
/// Subtitle and audio selectors index into `subtitles` and `audio`
/// (ffmpeg's `0:s:N` / `0:a:N`), not into global stream indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Container extension without the dot (e.g., "mkv").
    pub extension: String,
    /// Container format name reported by ffprobe.
    pub format: String,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Display aspect ratio of the first video stream (e.g., "16:9").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default)]
    pub audio: Vec<AudioTrack>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleTrack>,
}

impl SourceDescriptor {
    /// Creates a descriptor with no known streams, deriving the extension from the path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self {
            path,
            format: extension.clone(),
            extension,
            duration_secs: 0.0,
            ratio: None,
            video_codec: None,
            audio: Vec::new(),
            subtitles: Vec::new(),
        }
    }

    /// Returns the subtitle track selected by `0:s:{selector}`.
    pub fn subtitle(&self, selector: u32) -> Option<&SubtitleTrack> {
        self.subtitles.get(selector as usize)
    }

    /// Returns the audio track selected by `0:a:{selector}`.
    pub fn audio_track(&self, selector: u32) -> Option<&AudioTrack> {
        self.audio.get(selector as usize)
    }

    /// Extension for files written in the source container.
    ///
    /// Falls back to the probed format, then to Matroska, when the path has
    /// no extension.
    pub fn container_extension(&self) -> &str {
        if !self.extension.is_empty() {
            return &self.extension;
        }
        match self.format.as_str() {
            "matroska" => "mkv",
            "mov" => "mp4",
            "avi" => "avi",
            "mpegts" => "ts",
            _ => "mkv",
        }
    }

    /// Whether the container extension is one of the given playable extensions.
    pub fn is_playable_as_is(&self, playable_extensions: &[String]) -> bool {
        playable_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

/// Lowercased extension of a path, or an empty string.
pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_extension() {
        let source = SourceDescriptor::new("/media/movies/Heat (1995).MKV");
        assert_eq!(source.extension, "mkv");
        assert!(source.subtitles.is_empty());
    }

    #[test]
    fn test_bitmap_subtitle_detection() {
        let pgs = SubtitleTrack {
            index: 3,
            codec: "hdmv_pgs_subtitle".to_string(),
            language: Some("eng".to_string()),
        };
        let srt = SubtitleTrack {
            index: 4,
            codec: "subrip".to_string(),
            language: None,
        };
        assert!(pgs.is_bitmap());
        assert!(!srt.is_bitmap());
    }

    #[test]
    fn test_selectors_index_track_lists() {
        let mut source = SourceDescriptor::new("/media/a.mkv");
        source.subtitles.push(SubtitleTrack {
            index: 5,
            codec: "ass".to_string(),
            language: None,
        });
        assert_eq!(source.subtitle(0).map(|s| s.index), Some(5));
        assert!(source.subtitle(1).is_none());
        assert!(source.audio_track(0).is_none());
    }

    #[test]
    fn test_container_extension_fallbacks() {
        assert_eq!(SourceDescriptor::new("/m/a.avi").container_extension(), "avi");
        assert_eq!(SourceDescriptor::new("/m/noext").container_extension(), "mkv");

        let mut probed = SourceDescriptor::new("/m/noext");
        probed.format = "mov".to_string();
        assert_eq!(probed.container_extension(), "mp4");
    }

    #[test]
    fn test_playable_as_is() {
        let playable = vec!["mp4".to_string()];
        assert!(SourceDescriptor::new("/m/a.MP4").is_playable_as_is(&playable));
        assert!(!SourceDescriptor::new("/m/a.mkv").is_playable_as_is(&playable));
        assert!(!SourceDescriptor::new("/m/noext").is_playable_as_is(&playable));
    }
}
