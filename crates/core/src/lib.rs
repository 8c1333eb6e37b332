pub mod config;
pub mod dispatch;
pub mod media;
pub mod metrics;
pub mod testing;
pub mod transcode;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PlaybackConfig,
    RemoteTranscodeConfig, ServerConfig, TranscodeConfig,
};
pub use dispatch::{DispatchOutcome, DispatchRequest, RemoteDispatcher};
pub use media::{probe, SourceDescriptor};
pub use transcode::{
    JobHandle, JobRegistry, ProcessManager, SubtitleExtractor, SubtitleOutcome, TranscodeError,
    TranscodeJob, TranscodeOptions,
};
