//! VOICEVOX-compatible engine client.
//!
//! Synthesis is a two-step exchange with the engine:
//!
//! ```text
//!   POST /audio_query?text=…&speaker=N   → query descriptor (JSON)
//!   (overwrite volume / speed / pauses / intonation)
//!   POST /synthesis?speaker=N  + JSON     → WAV bytes
//! ```
//!
//! The WAV is written to a temp file and, when configured, passed through the
//! [`AudioFilter`]. Filter failures fall back to the unfiltered file.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use vvmcp_core::{SpeakerId, SpeechSettings, SynthesisParams};

use super::filter::FfmpegFilter;
use super::{AudioFilter, SpeechSynthesizer};
use crate::audio_io::AudioClip;
use crate::error::VoiceError;

/// HTTP client for a VOICEVOX-compatible engine.
pub struct VoicevoxClient {
    client: reqwest::Client,
    base_url: String,
    params: SynthesisParams,
    filter: Option<Arc<dyn AudioFilter>>,
}

impl VoicevoxClient {
    /// Create a client for the engine at `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        params: SynthesisParams,
        timeout: Duration,
    ) -> Result<Self, VoiceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            params,
            filter: None,
        })
    }

    /// Create a client (and its optional `ffmpeg` filter) from settings.
    pub fn from_settings(settings: &SpeechSettings) -> Result<Self, VoiceError> {
        let client = Self::new(
            settings.engine_base_url(),
            settings.synthesis,
            settings.request_timeout(),
        )?;
        let filter = FfmpegFilter::from_settings(&settings.filter)
            .map(|f| Arc::new(f) as Arc<dyn AudioFilter>);
        Ok(client.with_filter(filter))
    }

    /// Attach (or clear) the post-filter stage.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<Arc<dyn AudioFilter>>) -> Self {
        self.filter = filter;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Engine version string (`GET /version`), used as a reachability probe.
    pub async fn version(&self) -> Result<String, VoiceError> {
        let response = self
            .client
            .get(format!("{}/version", self.base_url))
            .send()
            .await?;
        let response = check_status(response, "/version")?;
        let version: Value = response.json().await?;
        Ok(version
            .as_str()
            .map_or_else(|| version.to_string(), ToString::to_string))
    }

    /// Step 1: fetch the engine's query descriptor for `text`.
    async fn audio_query(&self, text: &str, speaker: SpeakerId) -> Result<Value, VoiceError> {
        let speaker = speaker.to_string();
        let response = self
            .client
            .post(format!("{}/audio_query", self.base_url))
            .query(&[("text", text), ("speaker", speaker.as_str())])
            .send()
            .await?;
        let response = check_status(response, "/audio_query")?;
        Ok(response.json().await?)
    }

    /// Step 3: submit the (modified) descriptor and collect WAV bytes.
    async fn synthesis(&self, query: &Value, speaker: SpeakerId) -> Result<Vec<u8>, VoiceError> {
        let response = self
            .client
            .post(format!("{}/synthesis", self.base_url))
            .query(&[("speaker", speaker.to_string())])
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "audio/wav")
            .json(query)
            .send()
            .await?;
        let response = check_status(response, "/synthesis")?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Run the post-filter if configured, keeping the original on failure.
    async fn post_filter(&self, clip: AudioClip) -> AudioClip {
        let Some(filter) = &self.filter else {
            return clip;
        };

        match filter.apply(clip.path()).await {
            // Dropping the original clip removes the unfiltered file.
            Ok(filtered) => filtered,
            Err(e) => {
                tracing::warn!(error = %e, "Audio filter failed, using unfiltered audio");
                clip
            }
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for VoicevoxClient {
    async fn synthesize(&self, text: &str, speaker: SpeakerId) -> Result<AudioClip, VoiceError> {
        let mut query = self.audio_query(text, speaker).await?;
        apply_synthesis_params(&mut query, &self.params)?;

        let wav = self.synthesis(&query, speaker).await?;
        tracing::debug!(
            %speaker,
            chars = text.chars().count(),
            bytes = wav.len(),
            "Synthesized chunk"
        );

        let clip = AudioClip::write_temp(&wav).await?;
        Ok(self.post_filter(clip).await)
    }

    async fn speakers(&self) -> Result<Value, VoiceError> {
        let response = self
            .client
            .get(format!("{}/speakers", self.base_url))
            .send()
            .await?;
        let response = check_status(response, "/speakers")?;
        Ok(response.json().await?)
    }
}

/// Overwrite the tunable fields of an engine query descriptor.
///
/// Every other field is left exactly as the engine produced it.
pub fn apply_synthesis_params(query: &mut Value, params: &SynthesisParams) -> Result<(), VoiceError> {
    let object = match query {
        Value::Object(object) => object,
        other => {
            return Err(VoiceError::InvalidQuery(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };

    object.insert("volumeScale".into(), params.volume_scale.into());
    object.insert("speedScale".into(), params.speed_scale.into());
    object.insert("prePhonemeLength".into(), params.pre_phoneme_length.into());
    object.insert("postPhonemeLength".into(), params.post_phoneme_length.into());
    object.insert("intonationScale".into(), params.intonation_scale.into());
    Ok(())
}

fn check_status(
    response: reqwest::Response,
    endpoint: &'static str,
) -> Result<reqwest::Response, VoiceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(VoiceError::EngineStatus {
            endpoint,
            status: status.as_u16(),
        })
    }
}
