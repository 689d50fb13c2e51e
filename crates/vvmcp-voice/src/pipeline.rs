//! Chunk scheduler: synthesizes ahead while playing, strictly in order.
//!
//! For one Turn the pipeline overlaps engine work with playback:
//!
//! ```text
//!   synth 0 ─▶ synth 1..L-1 (together) ─▶ play 0
//!   play k  ║ synth next     (steady state, one synthesis per played unit)
//!   synth k ─▶ play k        (sequential tail once the buffer runs dry)
//! ```
//!
//! `L` is [`PipelineConfig::lookahead`]. Clips are buffered in chunk order,
//! so completion order of the engine calls never affects playback order.
//! The cancellation token is checked before every play and every scheduling
//! decision, and engine calls in flight are abandoned when it fires; once it
//! fires nothing further is played.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use vvmcp_core::{SpeakerId, Turn};

use crate::audio_io::{AudioClip, AudioSink};
use crate::backend::SpeechSynthesizer;
use crate::error::VoiceError;
use crate::text_utils;

/// Default number of units (in-flight or buffered) ahead of playback.
pub const DEFAULT_LOOKAHEAD: usize = 3;

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Total synthesis units allowed in flight or buffered; at least 1.
    pub lookahead: usize,
}

impl PipelineConfig {
    pub fn new(lookahead: usize) -> Self {
        Self {
            lookahead: lookahead.max(1),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD)
    }
}

/// Result of speaking one Turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// Chunks played to completion.
    pub played: usize,
    /// Chunks that failed to synthesize or play.
    pub failed: usize,
    /// The token fired before the Turn finished.
    pub cancelled: bool,
}

impl TurnOutcome {
    /// Every chunk was synthesized and played.
    pub const fn succeeded(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    fn record_synthesis(&mut self, index: usize, result: Result<AudioClip, VoiceError>) -> Option<AudioClip> {
        match result {
            Ok(clip) => Some(clip),
            Err(VoiceError::Cancelled) => {
                self.cancelled = true;
                None
            }
            Err(e) => {
                tracing::warn!(chunk = index, error = %e, "Chunk synthesis failed");
                self.failed += 1;
                None
            }
        }
    }

    fn record_playback(&mut self, index: usize, result: Result<(), VoiceError>) {
        match result {
            Ok(()) => self.played += 1,
            Err(VoiceError::Cancelled) => self.cancelled = true,
            Err(e) => {
                tracing::warn!(chunk = index, error = %e, "Chunk playback failed");
                self.failed += 1;
            }
        }
    }
}

/// Drives synthesis and playback of chunked text.
pub struct SpeechPipeline {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    config: PipelineConfig,
}

impl SpeechPipeline {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self::with_config(synthesizer, sink, PipelineConfig::default())
    }

    pub fn with_config(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            synthesizer,
            sink,
            config: PipelineConfig::new(config.lookahead),
        }
    }

    pub fn synthesizer(&self) -> &Arc<dyn SpeechSynthesizer> {
        &self.synthesizer
    }

    pub fn sink(&self) -> &Arc<dyn AudioSink> {
        &self.sink
    }

    pub const fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Chunk a Turn's text and speak it.
    pub async fn speak_turn(
        &self,
        turn: &Turn,
        max_chunk_len: usize,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let chunks = text_utils::split_into_chunks(turn.text(), max_chunk_len);
        tracing::debug!(
            speaker = %turn.speaker(),
            chunks = chunks.len(),
            "Speaking turn"
        );
        self.run(&chunks, turn.speaker(), cancel).await
    }

    /// Synthesize and play `chunks` in order with bounded lookahead.
    pub async fn run(
        &self,
        chunks: &[String],
        speaker: SpeakerId,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();
        if chunks.is_empty() {
            return outcome;
        }
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }

        // The first chunk gates the whole Turn.
        let first = self.synthesize(chunks, 0, speaker, cancel).await;
        let Some(first) = outcome.record_synthesis(0, first) else {
            return outcome;
        };

        // Initial lookahead batch, synthesized together.
        let batch_end = chunks.len().min(self.config.lookahead).max(1);
        let batch = join_all((1..batch_end).map(|index| async move {
            (index, self.synthesize(chunks, index, speaker, cancel).await)
        }))
        .await;
        let mut next = batch_end;

        let mut buffer: VecDeque<(usize, AudioClip)> = VecDeque::with_capacity(self.config.lookahead);
        for (index, result) in batch {
            if let Some(clip) = outcome.record_synthesis(index, result) {
                buffer.push_back((index, clip));
            }
        }

        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return outcome;
        }
        let played = self.sink.play(first, cancel).await;
        outcome.record_playback(0, played);

        // Steady state: play one buffered unit while synthesizing the next.
        while let Some((index, clip)) = buffer.pop_front() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return outcome;
            }

            if next < chunks.len() {
                let upcoming = next;
                next += 1;
                let (played, synthesized) = tokio::join!(
                    self.sink.play(clip, cancel),
                    self.synthesize(chunks, upcoming, speaker, cancel)
                );
                outcome.record_playback(index, played);
                if let Some(clip) = outcome.record_synthesis(upcoming, synthesized) {
                    buffer.push_back((upcoming, clip));
                }
            } else {
                let played = self.sink.play(clip, cancel).await;
                outcome.record_playback(index, played);
            }
        }

        // Buffer ran dry with chunks left (failed lookahead units): go sequential.
        while next < chunks.len() {
            let index = next;
            next += 1;

            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return outcome;
            }
            let synthesized = self.synthesize(chunks, index, speaker, cancel).await;
            // A fired token always surfaces here as `Cancelled`.
            let Some(clip) = outcome.record_synthesis(index, synthesized) else {
                continue;
            };
            let played = self.sink.play(clip, cancel).await;
            outcome.record_playback(index, played);
        }

        if cancel.is_cancelled() {
            outcome.cancelled = true;
        }
        outcome
    }

    async fn synthesize(
        &self,
        chunks: &[String],
        index: usize,
        speaker: SpeakerId,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, VoiceError> {
        tracing::trace!(chunk = index, %speaker, "Synthesizing chunk");
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(VoiceError::Cancelled),
            result = self.synthesizer.synthesize(&chunks[index], speaker) => result,
        }
    }
}
