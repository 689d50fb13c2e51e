//! Speech port — the only surface the tool layer needs.
//!
//! Implemented by `SpeechService` in `vvmcp-voice`; consumed by the MCP
//! tool dispatcher in `vvmcp-mcp`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{SpeakerId, Turn, TurnError};

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// One turn as requested by a tool caller. The speaker is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<u32>,
}

impl TurnRequest {
    pub fn new(text: impl Into<String>, speaker: Option<u32>) -> Self {
        Self {
            text: text.into(),
            speaker,
        }
    }

    /// Resolve into a domain [`Turn`], filling in the default speaker.
    pub fn into_turn(self, default_speaker: SpeakerId) -> Result<Turn, TurnError> {
        let speaker = self.speaker.map_or(default_speaker, SpeakerId);
        Turn::new(self.text, speaker)
    }
}

/// Acknowledgement returned once a dialogue has been queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakReceipt {
    /// Number of turns accepted.
    pub turns: usize,
    /// Dialogues waiting ahead of this one (0 = starts immediately or is
    /// next after the active stream).
    pub queued_ahead: usize,
}

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors returned by [`SpeechPort`] operations.
#[derive(Debug, Error)]
pub enum SpeechPortError {
    /// The request was malformed (empty turn list, blank text).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The synthesis engine could not be reached or answered with an error.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Unexpected internal error.
    #[error("Internal speech error: {0}")]
    Internal(String),
}

impl From<TurnError> for SpeechPortError {
    fn from(err: TurnError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

// ── Port trait ────────────────────────────────────────────────────────────────

/// Text-to-speech operations exposed to tool callers.
#[async_trait]
pub trait SpeechPort: Send + Sync {
    /// Return the engine's speaker list unchanged.
    async fn list_speakers(&self) -> Result<Value, SpeechPortError>;

    /// Queue a dialogue for playback. Returns as soon as it is queued.
    async fn speak(&self, turns: Vec<TurnRequest>) -> Result<SpeakReceipt, SpeechPortError>;

    /// Stop the active dialogue and drop everything queued.
    async fn stop(&self) -> Result<(), SpeechPortError>;
}
