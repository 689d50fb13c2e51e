//! Speech pipeline error types.

use std::path::PathBuf;

/// Errors that can occur while producing or playing speech.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// Network-level failure talking to the engine (connect, timeout, body).
    #[error("Engine request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("Engine endpoint {endpoint} returned HTTP {status}")]
    EngineStatus { endpoint: &'static str, status: u16 },

    /// The engine returned a query descriptor that is not a JSON object.
    #[error("Engine returned an invalid audio query: {0}")]
    InvalidQuery(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The audio post-filter failed.
    #[error("Audio filter failed: {0}")]
    FilterFailed(String),

    /// No supported audio player was found on this system.
    #[error("No audio player found (tried: {0})")]
    NoAudioPlayer(String),

    /// The platform player exited unsuccessfully.
    #[error("Playback of {path} failed: {reason}")]
    PlaybackFailed { path: PathBuf, reason: String },

    /// IO error (temp files, process spawn).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was stopped before this step ran.
    #[error("Speech cancelled")]
    Cancelled,
}

impl From<VoiceError> for vvmcp_core::SpeechPortError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::Http(_)
            | VoiceError::EngineStatus { .. }
            | VoiceError::InvalidQuery(_)
            | VoiceError::Json(_) => Self::Engine(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use vvmcp_core::SpeechPortError;

    use super::*;

    #[test]
    fn engine_failures_map_to_engine_port_errors() {
        let err: SpeechPortError = VoiceError::EngineStatus {
            endpoint: "/speakers",
            status: 503,
        }
        .into();
        assert!(matches!(err, SpeechPortError::Engine(msg) if msg.contains("503")));
    }

    #[test]
    fn local_failures_map_to_internal_port_errors() {
        let err: SpeechPortError = VoiceError::NoAudioPlayer("paplay".to_string()).into();
        assert!(matches!(err, SpeechPortError::Internal(_)));
    }
}
