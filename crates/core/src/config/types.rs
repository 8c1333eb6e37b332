use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub remote: Option<RemoteTranscodeConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Defaults applied to every transcode job unless overridden per job.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Directory under which each job gets its own output directory.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Video encoder passed to `-c:v`.
    #[serde(default = "default_encoder")]
    pub encoder: String,

    /// Constant rate factor passed to `-crf`.
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Duration of one HLS segment in seconds.
    #[serde(default = "default_segment_secs")]
    pub segment_secs: u32,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_output_root() -> PathBuf {
    std::env::temp_dir().join("mediactl")
}

fn default_encoder() -> String {
    "libx264".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_segment_secs() -> u32 {
    6
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            output_root: default_output_root(),
            encoder: default_encoder(),
            crf: default_crf(),
            segment_secs: default_segment_secs(),
        }
    }
}

impl TranscodeConfig {
    /// Sets the output root directory.
    pub fn with_output_root(mut self, output_root: PathBuf) -> Self {
        self.output_root = output_root;
        self
    }

    /// Sets the ffmpeg binary path.
    pub fn with_ffmpeg_path(mut self, ffmpeg_path: PathBuf) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }
}

/// Playback decisions made before any transcoding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Container extensions clients can play without transcoding.
    #[serde(default = "default_playable_extensions")]
    pub playable_extensions: Vec<String>,
}

fn default_playable_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            playable_extensions: default_playable_extensions(),
        }
    }
}

/// Remote transcoding host configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteTranscodeConfig {
    /// Base URL of the transcode host (e.g., "http://10.0.0.5:8080")
    pub url: String,
    /// Hardware address used for the wake signal (e.g., "aa:bb:cc:dd:ee:ff")
    pub mac_address: String,
    /// Liveness rounds before giving up (default: 4)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between failed rounds in seconds (default: 10)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Timeout for a single HTTP request in seconds (default: 5)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Destination of the wake-on-LAN broadcast
    #[serde(default = "default_broadcast_addr")]
    pub broadcast_addr: SocketAddr,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_poll_interval() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    5
}

fn default_broadcast_addr() -> SocketAddr {
    SocketAddr::from(([255, 255, 255, 255], 9))
}

impl RemoteTranscodeConfig {
    /// Creates a remote target with default retry settings.
    pub fn new(url: impl Into<String>, mac_address: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mac_address: mac_address.into(),
            max_attempts: default_max_attempts(),
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            broadcast_addr: default_broadcast_addr(),
        }
    }
}
