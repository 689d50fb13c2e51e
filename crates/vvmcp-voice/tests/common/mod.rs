//! Fake engine and player shared by the integration tests.
//!
//! `FakeSynth` writes each chunk's text as the clip's file contents, so
//! `RecordingSink` can read the file back and record which chunk it played.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use vvmcp_core::SpeakerId;
use vvmcp_voice::{AudioClip, AudioSink, SpeechSynthesizer, VoiceError};

// ── Fake synthesizer ───────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSynth {
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    cancel_on: Option<(String, CancellationToken)>,
    calls: Mutex<Vec<(String, SpeakerId)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSynth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, text: &str, millis: u64) -> Self {
        self.delays.insert(text.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Fire `token` when synthesis of this chunk starts.
    pub fn cancelling_on(mut self, text: &str, token: &CancellationToken) -> Self {
        self.cancel_on = Some((text.to_string(), token.clone()));
        self
    }

    pub fn calls(&self) -> Vec<(String, SpeakerId)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(text, _)| text).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, text: &str, speaker: SpeakerId) -> Result<AudioClip, VoiceError> {
        self.calls.lock().unwrap().push((text.to_string(), speaker));
        if let Some((_, token)) = self.cancel_on.as_ref().filter(|(on, _)| on == text) {
            token.cancel();
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(text) {
            return Err(VoiceError::EngineStatus {
                endpoint: "/synthesis",
                status: 500,
            });
        }
        AudioClip::write_temp(text.as_bytes()).await
    }

    async fn speakers(&self) -> Result<Value, VoiceError> {
        Ok(json!([{"name": "fake", "styles": [{"name": "normal", "id": 1}]}]))
    }
}

// ── Recording sink ─────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    play_delay: Duration,
    failing: HashSet<String>,
    cancel_on: Option<String>,
    played: Mutex<Vec<String>>,
    play_calls: AtomicUsize,
    interrupts: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_play_delay(mut self, millis: u64) -> Self {
        self.play_delay = Duration::from_millis(millis);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Fire the stream's token while this chunk is playing.
    pub fn cancelling_on(mut self, text: &str) -> Self {
        self.cancel_on = Some(text.to_string());
        self
    }

    /// Chunks the player was started for, in order.
    pub fn played(&self) -> Vec<String> {
        self.played.lock().unwrap().clone()
    }

    /// Every `play` invocation, including ones refused for a fired token.
    pub fn play_calls(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, clip: AudioClip, cancel: &CancellationToken) -> Result<(), VoiceError> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(VoiceError::Cancelled);
        }

        let text = tokio::fs::read_to_string(clip.path()).await?;
        self.played.lock().unwrap().push(text.clone());

        if self.cancel_on.as_deref() == Some(text.as_str()) {
            cancel.cancel();
        }
        if self.failing.contains(&text) {
            return Err(VoiceError::PlaybackFailed {
                path: clip.path().to_path_buf(),
                reason: "fake player failure".to_string(),
            });
        }

        tokio::select! {
            () = tokio::time::sleep(self.play_delay) => Ok(()),
            () = cancel.cancelled() => Err(VoiceError::Cancelled),
        }
    }

    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn chunks(texts: &[&str]) -> Vec<String> {
    texts.iter().map(ToString::to_string).collect()
}
