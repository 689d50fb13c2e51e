//! Speech settings and environment parsing.
//!
//! Settings are read once at startup. Every field has a default, so an empty
//! environment yields a working configuration against a local engine.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::SpeakerId;

/// Default engine host.
pub const DEFAULT_ENGINE_HOST: &str = "127.0.0.1";

/// Default engine port (VOICEVOX engine default).
pub const DEFAULT_ENGINE_PORT: u16 = 50021;

/// Default speaker used when a turn does not name one.
pub const DEFAULT_SPEAKER: SpeakerId = SpeakerId(1);

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LENGTH: usize = 150;

/// Default per-request engine timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Values written over the engine's query descriptor before synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisParams {
    pub volume_scale: f64,
    pub speed_scale: f64,
    pub intonation_scale: f64,
    pub pre_phoneme_length: f64,
    pub post_phoneme_length: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            volume_scale: 1.0,
            speed_scale: 1.0,
            intonation_scale: 1.0,
            pre_phoneme_length: 0.1,
            post_phoneme_length: 0.1,
        }
    }
}

/// Optional audio post-filter (highpass → lowpass → noise reduction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSettings {
    pub enabled: bool,
    pub highpass_hz: u32,
    pub lowpass_hz: u32,
    /// Noise reduction strength in dB (ffmpeg `afftdn` `nr`, 0.01–97).
    pub noise_reduction: f64,
    /// Filter executable override. `None` resolves `ffmpeg` on `PATH`.
    pub executable: Option<PathBuf>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            highpass_hz: 100,
            lowpass_hz: 8000,
            noise_reduction: 12.0,
            executable: None,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSettings {
    pub engine_host: String,
    pub engine_port: u16,
    pub default_speaker: SpeakerId,
    pub synthesis: SynthesisParams,
    pub max_chunk_length: usize,
    pub request_timeout_secs: u64,
    pub filter: FilterSettings,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            engine_host: DEFAULT_ENGINE_HOST.to_string(),
            engine_port: DEFAULT_ENGINE_PORT,
            default_speaker: DEFAULT_SPEAKER,
            synthesis: SynthesisParams::default(),
            max_chunk_length: DEFAULT_MAX_CHUNK_LENGTH,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            filter: FilterSettings::default(),
        }
    }
}

/// Settings parsing / validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("{0} must not be negative")]
    Negative(&'static str),

    #[error("Engine port must not be 0")]
    InvalidPort,

    #[error("Lowpass cutoff ({lowpass} Hz) must be above highpass cutoff ({highpass} Hz)")]
    InvalidFilterBand { highpass: u32, lowpass: u32 },

    #[error("Engine host cannot be empty")]
    EmptyHost,
}

impl SpeechSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Unset and empty variables fall back to defaults. Values are parsed but
    /// not range-checked; call [`Self::validate`] once overrides are applied.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            engine_host: get("VOICEVOX_HOST").unwrap_or(defaults.engine_host),
            engine_port: parse(&get, "VOICEVOX_PORT", defaults.engine_port)?,
            default_speaker: SpeakerId(parse(
                &get,
                "VOICEVOX_DEFAULT_SPEAKER",
                defaults.default_speaker.get(),
            )?),
            synthesis: SynthesisParams {
                volume_scale: parse(&get, "VOICEVOX_VOLUME_SCALE", defaults.synthesis.volume_scale)?,
                speed_scale: parse(&get, "VOICEVOX_SPEED_SCALE", defaults.synthesis.speed_scale)?,
                intonation_scale: parse(
                    &get,
                    "VOICEVOX_INTONATION_SCALE",
                    defaults.synthesis.intonation_scale,
                )?,
                pre_phoneme_length: parse(
                    &get,
                    "VOICEVOX_PRE_PHONEME_LENGTH",
                    defaults.synthesis.pre_phoneme_length,
                )?,
                post_phoneme_length: parse(
                    &get,
                    "VOICEVOX_POST_PHONEME_LENGTH",
                    defaults.synthesis.post_phoneme_length,
                )?,
            },
            max_chunk_length: parse(&get, "VOICEVOX_MAX_CHUNK_LENGTH", defaults.max_chunk_length)?,
            request_timeout_secs: parse(
                &get,
                "VOICEVOX_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            filter: FilterSettings {
                enabled: parse_flag(&get, "VOICEVOX_AUDIO_FILTER", defaults.filter.enabled)?,
                highpass_hz: parse(
                    &get,
                    "VOICEVOX_FILTER_HIGHPASS_HZ",
                    defaults.filter.highpass_hz,
                )?,
                lowpass_hz: parse(&get, "VOICEVOX_FILTER_LOWPASS_HZ", defaults.filter.lowpass_hz)?,
                noise_reduction: parse(
                    &get,
                    "VOICEVOX_FILTER_NOISE_REDUCTION",
                    defaults.filter.noise_reduction,
                )?,
                executable: get("VOICEVOX_FFMPEG_PATH").map(PathBuf::from),
            },
        })
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.engine_host.trim().is_empty() {
            return Err(SettingsError::EmptyHost);
        }
        if self.engine_port == 0 {
            return Err(SettingsError::InvalidPort);
        }
        if self.max_chunk_length == 0 {
            return Err(SettingsError::NonPositive("max chunk length"));
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::NonPositive("request timeout"));
        }

        let scales = [
            ("volume scale", self.synthesis.volume_scale),
            ("speed scale", self.synthesis.speed_scale),
        ];
        for (name, value) in scales {
            if value <= 0.0 {
                return Err(SettingsError::NonPositive(name));
            }
        }
        // Zero intonation is a flat voice.
        if self.synthesis.intonation_scale < 0.0 {
            return Err(SettingsError::Negative("intonation scale"));
        }

        if self.filter.enabled && self.filter.lowpass_hz <= self.filter.highpass_hz {
            return Err(SettingsError::InvalidFilterBand {
                highpass: self.filter.highpass_hz,
                lowpass: self.filter.lowpass_hz,
            });
        }

        Ok(())
    }

    /// Base URL of the engine HTTP API, without a trailing slash.
    #[must_use]
    pub fn engine_base_url(&self) -> String {
        format!("http://{}:{}", self.engine_host, self.engine_port)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag<G>(get: &G, key: &'static str, default: bool) -> Result<bool, SettingsError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(SettingsError::InvalidValue { key, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let settings = SpeechSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, SpeechSettings::default());
        assert_eq!(settings.engine_base_url(), "http://127.0.0.1:50021");
        assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_are_applied() {
        let settings = SpeechSettings::from_lookup(lookup_from(&[
            ("VOICEVOX_HOST", "engine.local"),
            ("VOICEVOX_PORT", "50121"),
            ("VOICEVOX_DEFAULT_SPEAKER", "3"),
            ("VOICEVOX_SPEED_SCALE", "1.25"),
            ("VOICEVOX_MAX_CHUNK_LENGTH", "80"),
            ("VOICEVOX_AUDIO_FILTER", "yes"),
            ("VOICEVOX_FFMPEG_PATH", "/opt/ffmpeg/bin/ffmpeg"),
        ]))
        .unwrap();

        assert_eq!(settings.engine_base_url(), "http://engine.local:50121");
        assert_eq!(settings.default_speaker, SpeakerId(3));
        assert!((settings.synthesis.speed_scale - 1.25).abs() < f64::EPSILON);
        assert_eq!(settings.max_chunk_length, 80);
        assert!(settings.filter.enabled);
        assert_eq!(
            settings.filter.executable,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
    }

    #[test]
    fn test_empty_value_falls_back_to_default() {
        let settings =
            SpeechSettings::from_lookup(lookup_from(&[("VOICEVOX_PORT", "  ")])).unwrap();
        assert_eq!(settings.engine_port, DEFAULT_ENGINE_PORT);
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = SpeechSettings::from_lookup(lookup_from(&[("VOICEVOX_PORT", "fifty")]))
            .unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidValue {
                key: "VOICEVOX_PORT",
                value: "fifty".to_string()
            }
        );

        let err = SpeechSettings::from_lookup(lookup_from(&[("VOICEVOX_AUDIO_FILTER", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key: "VOICEVOX_AUDIO_FILTER", .. }));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_length() {
        let settings =
            SpeechSettings::from_lookup(lookup_from(&[("VOICEVOX_MAX_CHUNK_LENGTH", "0")]))
                .unwrap();
        assert_eq!(settings.max_chunk_length, 0);
        assert_eq!(settings.validate(), Err(SettingsError::NonPositive("max chunk length")));
    }

    #[test]
    fn test_validate_intonation_scale() {
        let with_intonation = |intonation_scale| SpeechSettings {
            synthesis: SynthesisParams {
                intonation_scale,
                ..SynthesisParams::default()
            },
            ..SpeechSettings::default()
        };
        assert_eq!(with_intonation(0.0).validate(), Ok(()));
        assert_eq!(
            with_intonation(-0.5).validate(),
            Err(SettingsError::Negative("intonation scale"))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_filter_band() {
        let settings = SpeechSettings {
            filter: FilterSettings {
                enabled: true,
                highpass_hz: 4000,
                lowpass_hz: 3000,
                ..FilterSettings::default()
            },
            ..SpeechSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidFilterBand {
                highpass: 4000,
                lowpass: 3000
            })
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_speed() {
        let settings = SpeechSettings {
            synthesis: SynthesisParams {
                speed_scale: 0.0,
                ..SynthesisParams::default()
            },
            ..SpeechSettings::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::NonPositive("speed scale")));
    }
}
