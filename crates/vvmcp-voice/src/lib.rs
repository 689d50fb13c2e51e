//! Chunked text-to-speech for vvmcp.
//!
//! Text is split into sentence-sized chunks ([`text_utils`]), synthesized by a
//! VOICEVOX-compatible engine ([`backend::voicevox`]) a few chunks ahead of
//! playback ([`pipeline`]), and played through a platform player
//! ([`playback`]). Dialogues are serialized by a single-worker
//! [`queue::DialogueQueue`] and exposed through [`SpeechService`], which
//! implements `vvmcp_core::SpeechPort`.
#![deny(unused_crate_dependencies)]

pub mod audio_io;
pub mod backend;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod queue;
pub mod service;
pub mod text_utils;

// Re-export key types for convenience
pub use audio_io::{AudioClip, AudioSink};
pub use backend::voicevox::VoicevoxClient;
pub use backend::{AudioFilter, SpeechSynthesizer};
pub use error::VoiceError;
pub use pipeline::{PipelineConfig, SpeechPipeline, TurnOutcome};
pub use playback::{CommandPlayer, PlayerCommand};
pub use queue::{DialogueQueue, StreamOutcome};
pub use service::SpeechService;
