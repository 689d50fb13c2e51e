//! `ffmpeg` audio post-filter.
//!
//! Runs highpass → lowpass → FFT denoise over an engine WAV and re-encodes
//! the result as 16-bit PCM, 24 kHz mono.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use vvmcp_core::FilterSettings;

use super::AudioFilter;
use crate::audio_io::AudioClip;
use crate::error::VoiceError;

/// Output sample rate of filtered audio.
pub const FILTER_SAMPLE_RATE: u32 = 24_000;

/// Output codec of filtered audio.
const FILTER_CODEC: &str = "pcm_s16le";

/// Audio filter backed by an `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegFilter {
    executable: PathBuf,
    highpass_hz: u32,
    lowpass_hz: u32,
    noise_reduction: f64,
}

impl FfmpegFilter {
    /// Build the filter from settings, or `None` when filtering is disabled.
    ///
    /// Without an explicit executable, `ffmpeg` is resolved on `PATH`; if it
    /// cannot be found the bare name is kept and every run fails, which the
    /// synthesizer treats as "use the unfiltered audio".
    pub fn from_settings(settings: &FilterSettings) -> Option<Self> {
        if !settings.enabled {
            return None;
        }

        let executable = settings.executable.clone().unwrap_or_else(|| {
            which::which("ffmpeg").unwrap_or_else(|_| {
                tracing::warn!("Audio filter enabled but ffmpeg was not found on PATH");
                PathBuf::from("ffmpeg")
            })
        });

        Some(Self {
            executable,
            highpass_hz: settings.highpass_hz,
            lowpass_hz: settings.lowpass_hz,
            noise_reduction: settings.noise_reduction,
        })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The `-af` filter graph.
    fn filter_graph(&self) -> String {
        format!(
            "highpass=f={},lowpass=f={},afftdn=nr={}",
            self.highpass_hz, self.lowpass_hz, self.noise_reduction
        )
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-af".into(),
            self.filter_graph().into(),
            "-acodec".into(),
            FILTER_CODEC.into(),
            "-ar".into(),
            FILTER_SAMPLE_RATE.to_string().into(),
            "-ac".into(),
            "1".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait::async_trait]
impl AudioFilter for FfmpegFilter {
    async fn apply(&self, input: &Path) -> Result<AudioClip, VoiceError> {
        let output = AudioClip::reserve_temp_path()?;

        let result = Command::new(&self.executable)
            .args(self.build_args(input, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                VoiceError::FilterFailed(format!(
                    "failed to run {}: {e}",
                    self.executable.display()
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(VoiceError::FilterFailed(format!(
                "{} exited with {}: {}",
                self.executable.display(),
                result.status,
                stderr.trim()
            )));
        }

        let clip = AudioClip::from_temp_path(output)?;
        if clip.size() == 0 {
            return Err(VoiceError::FilterFailed("filter produced no audio".to_string()));
        }
        Ok(clip)
    }
}
