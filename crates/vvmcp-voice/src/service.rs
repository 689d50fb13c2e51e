//! `SpeechService` — the adapter that implements `SpeechPort`.
//!
//! This is the single place where tool-facing DTOs from `vvmcp-core` are
//! turned into domain Turns and handed to the [`DialogueQueue`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use vvmcp_core::{
    SpeakReceipt, SpeakerId, SpeechPort, SpeechPortError, SpeechSettings, Turn, TurnRequest,
};

use crate::audio_io::AudioSink;
use crate::backend::SpeechSynthesizer;
use crate::backend::voicevox::VoicevoxClient;
use crate::error::VoiceError;
use crate::pipeline::SpeechPipeline;
use crate::playback::CommandPlayer;
use crate::queue::DialogueQueue;

/// Queue-backed implementation of [`SpeechPort`].
pub struct SpeechService {
    queue: DialogueQueue,
    default_speaker: SpeakerId,
}

impl SpeechService {
    pub fn new(pipeline: SpeechPipeline, default_speaker: SpeakerId, max_chunk_len: usize) -> Self {
        Self {
            queue: DialogueQueue::new(pipeline, max_chunk_len),
            default_speaker,
        }
    }

    /// Wire the VOICEVOX client and the platform player from settings.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_settings(settings: &SpeechSettings) -> Result<Self, VoiceError> {
        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(VoicevoxClient::from_settings(settings)?);
        let sink: Arc<dyn AudioSink> = Arc::new(CommandPlayer::detect());

        info!(
            engine = %settings.engine_base_url(),
            default_speaker = %settings.default_speaker,
            filter = settings.filter.enabled,
            "Speech service ready"
        );

        Ok(Self::new(
            SpeechPipeline::new(synthesizer, sink),
            settings.default_speaker,
            settings.max_chunk_length,
        ))
    }

    pub const fn queue(&self) -> &DialogueQueue {
        &self.queue
    }

    pub const fn default_speaker(&self) -> SpeakerId {
        self.default_speaker
    }

    fn resolve_turns(&self, requests: Vec<TurnRequest>) -> Result<Vec<Turn>, SpeechPortError> {
        if requests.is_empty() {
            return Err(SpeechPortError::InvalidInput(
                "at least one turn is required".to_string(),
            ));
        }
        requests
            .into_iter()
            .enumerate()
            .map(|(ordinal, request)| {
                request.into_turn(self.default_speaker).map_err(|e| {
                    SpeechPortError::InvalidInput(format!("turn {}: {e}", ordinal + 1))
                })
            })
            .collect()
    }
}

#[async_trait]
impl SpeechPort for SpeechService {
    async fn list_speakers(&self) -> Result<Value, SpeechPortError> {
        Ok(self.queue.pipeline().synthesizer().speakers().await?)
    }

    async fn speak(&self, turns: Vec<TurnRequest>) -> Result<SpeakReceipt, SpeechPortError> {
        let turns = self.resolve_turns(turns)?;
        let count = turns.len();
        let queued_ahead = self.queue.enqueue(turns);
        info!(turns = count, queued_ahead, "Dialogue queued");
        Ok(SpeakReceipt {
            turns: count,
            queued_ahead,
        })
    }

    async fn stop(&self) -> Result<(), SpeechPortError> {
        self.queue.stop();
        Ok(())
    }
}
