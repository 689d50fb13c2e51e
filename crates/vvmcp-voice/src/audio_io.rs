//! `AudioClip` and the `AudioSink` trait abstraction for playback.
//!
//! The [`SpeechPipeline`](crate::pipeline::SpeechPipeline) never touches the
//! platform player directly; it hands each clip to an injected sink:
//!
//! | Implementor | Where used |
//! |---|---|
//! | [`CommandPlayer`](crate::playback::CommandPlayer) | CLI / MCP server — `afplay`, `paplay`/`aplay`/`ffplay`, PowerShell |
//! | test fakes | pipeline and queue tests — record play order without audio |

use std::path::Path;

use tempfile::{Builder, TempPath};
use tokio_util::sync::CancellationToken;

use crate::error::VoiceError;

// ── AudioClip ──────────────────────────────────────────────────────

/// A synthesized audio file waiting to be played.
///
/// The clip owns its temporary file: dropping the clip deletes it. The
/// pipeline drops every clip right after its playback attempt, whether the
/// attempt succeeded, failed or was skipped.
#[derive(Debug)]
pub struct AudioClip {
    path: TempPath,
    size: u64,
}

impl AudioClip {
    /// Write `bytes` to a fresh uniquely named `.wav` temp file.
    ///
    /// If the write fails the partial file is removed before returning.
    pub async fn write_temp(bytes: &[u8]) -> Result<Self, VoiceError> {
        let path = Self::reserve_temp_path()?;
        tokio::fs::write(&path, bytes).await?;
        Ok(Self {
            path,
            size: bytes.len() as u64,
        })
    }

    /// Reserve an empty uniquely named `.wav` temp file, deleted on drop.
    pub fn reserve_temp_path() -> Result<TempPath, VoiceError> {
        let file = Builder::new()
            .prefix("vvmcp-")
            .suffix(".wav")
            .tempfile()?;
        Ok(file.into_temp_path())
    }

    /// Adopt an already written temp file.
    pub fn from_temp_path(path: TempPath) -> Result<Self, VoiceError> {
        let size = std::fs::metadata(&path)?.len();
        Ok(Self { path, size })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the audio file in bytes.
    pub const fn size(&self) -> u64 {
        self.size
    }
}

// ── AudioSink ──────────────────────────────────────────────────────

/// Abstraction over an audio output sink.
///
/// # Object safety
/// All methods take `&self`, so the trait is usable as `Arc<dyn AudioSink>`
/// shared between the pipeline and the dialogue queue's stop path.
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one clip to completion.
    ///
    /// Must check `cancel` before starting: a cancelled token means the clip
    /// is discarded and [`VoiceError::Cancelled`] returned without invoking
    /// the player. The clip is consumed either way so its file is released.
    async fn play(&self, clip: AudioClip, cancel: &CancellationToken) -> Result<(), VoiceError>;

    /// Best-effort interruption of whatever is playing right now.
    ///
    /// Fire-and-forget: there is no guarantee the player has stopped when
    /// this returns.
    fn interrupt(&self);
}
