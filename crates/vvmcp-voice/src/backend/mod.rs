//! Synthesis backend traits — engine-agnostic interfaces.
//!
//! The [`SpeechPipeline`](crate::pipeline::SpeechPipeline) operates on trait
//! objects (`Arc<dyn SpeechSynthesizer>`) so the engine can be swapped
//! without touching the scheduling logic.
//!
//! ## Backend implementations
//!
//! | Module         | Role                                         |
//! |----------------|----------------------------------------------|
//! | [`voicevox`]   | VOICEVOX-compatible HTTP engine              |
//! | [`filter`]     | `ffmpeg` post-filter applied to engine audio |

pub mod filter;
pub mod voicevox;

use std::path::Path;

use serde_json::Value;
use vvmcp_core::SpeakerId;

use crate::audio_io::AudioClip;
use crate::error::VoiceError;

// ── Synthesizer Trait ──────────────────────────────────────────────

/// Backend-agnostic text-to-speech engine.
///
/// Implementations must be `Send + Sync`: the pipeline issues several
/// `synthesize` calls concurrently through a shared reference.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one chunk of text into an audio clip.
    ///
    /// A failure means "this chunk could not be produced"; callers record it
    /// and carry on. Implementations must not leave temp files behind on
    /// failure.
    async fn synthesize(&self, text: &str, speaker: SpeakerId) -> Result<AudioClip, VoiceError>;

    /// The engine's speaker catalogue, passed through uninterpreted.
    async fn speakers(&self) -> Result<Value, VoiceError>;
}

// ── Post-filter Trait ──────────────────────────────────────────────

/// Optional audio post-processing stage.
#[async_trait::async_trait]
pub trait AudioFilter: Send + Sync {
    /// Produce a new filtered clip from `input`. The input file is left
    /// untouched; on error the caller keeps using it.
    async fn apply(&self, input: &Path) -> Result<AudioClip, VoiceError>;
}
