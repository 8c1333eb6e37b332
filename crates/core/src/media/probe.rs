//! FFprobe-based source inspection.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use super::types::{extension_of, AudioTrack, SourceDescriptor, SubtitleTrack};
use crate::transcode::TranscodeError;

/// Probes a media file and builds its source descriptor.
pub async fn probe(ffprobe_path: &Path, path: &Path) -> Result<SourceDescriptor, TranscodeError> {
    if !path.exists() {
        return Err(TranscodeError::probe_failed(format!(
            "input file not found: {}",
            path.display()
        )));
    }

    let output = Command::new(ffprobe_path)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TranscodeError::probe_failed(format!(
                    "ffprobe not found at path: {}",
                    ffprobe_path.display()
                ))
            } else {
                TranscodeError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(TranscodeError::probe_failed(format!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let descriptor = parse_probe_output(path, &stdout)?;
    debug!(
        path = %path.display(),
        audio = descriptor.audio.len(),
        subtitles = descriptor.subtitles.len(),
        "Probed source"
    );
    Ok(descriptor)
}

/// Parses ffprobe JSON output into a SourceDescriptor.
pub fn parse_probe_output(path: &Path, output: &str) -> Result<SourceDescriptor, TranscodeError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        format_name: String,
        duration: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        index: u32,
        codec_type: String,
        codec_name: Option<String>,
        channels: Option<u8>,
        display_aspect_ratio: Option<String>,
        #[serde(default)]
        tags: HashMap<String, String>,
    }

    let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
        TranscodeError::probe_failed(format!("Failed to parse ffprobe output: {}", e))
    })?;

    let duration_secs = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let format_name = probe
        .format
        .format_name
        .split(',')
        .next()
        .unwrap_or("unknown")
        .to_string();

    let mut descriptor = SourceDescriptor {
        path: path.to_path_buf(),
        extension: extension_of(path),
        format: format_name,
        duration_secs,
        ratio: None,
        video_codec: None,
        audio: Vec::new(),
        subtitles: Vec::new(),
    };

    for stream in probe.streams {
        let codec = stream.codec_name.unwrap_or_else(|| "unknown".to_string());
        let language = stream.tags.get("language").cloned();
        match stream.codec_type.as_str() {
            "video" if descriptor.video_codec.is_none() => {
                descriptor.video_codec = Some(codec);
                // ffprobe reports "0:1" or "N/A" when the container has no ratio
                descriptor.ratio = stream
                    .display_aspect_ratio
                    .filter(|r| r.contains(':') && !r.starts_with("0:"));
            }
            "audio" => descriptor.audio.push(AudioTrack {
                index: stream.index,
                codec,
                channels: stream.channels,
                language,
            }),
            "subtitle" => descriptor.subtitles.push(SubtitleTrack {
                index: stream.index,
                codec,
                language,
            }),
            _ => {}
        }
    }

    Ok(descriptor)
}
