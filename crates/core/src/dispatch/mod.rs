//! Remote transcode dispatch.
//!
//! Sources in a directly playable container are served as-is. Everything
//! else is handed to a remote transcode host: the dispatcher probes it,
//! wakes it over the network when it does not answer, and keeps probing at
//! a fixed interval before giving up.
//!
//! # Example
//!
//! ```ignore
//! use mediactl_core::dispatch::{DispatchRequest, RemoteDispatcher};
//!
//! let dispatcher = RemoteDispatcher::from_config(&remote, &config.playback)?;
//! let outcome = dispatcher
//!     .dispatch(&DispatchRequest::new("alice", "/media/movies/Heat (1995).mkv"))
//!     .await
//!     .require_accepted()?;
//! ```

mod dispatcher;
mod host;
mod wake;

pub use dispatcher::{DispatchOutcome, DispatchRequest, RemoteDispatcher};
pub use host::{decode_path, encode_path, HttpTranscodeHost, TranscodeHost, PONG};
pub use wake::{magic_packet, parse_mac, MagicPacketSender, WakeSignal, MAGIC_PACKET_LEN};
