//! Core domain types, configuration and port definitions for vvmcp.
//!
//! This crate has no I/O of its own. Adapters (`vvmcp-voice` for the
//! synthesis/playback pipeline, `vvmcp-mcp` for the tool surface) depend on
//! it and meet each other only through the [`ports::SpeechPort`] trait.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{SpeakerId, Turn, TurnError};
pub use ports::{SpeakReceipt, SpeechPort, SpeechPortError, TurnRequest};
pub use settings::{
    DEFAULT_ENGINE_HOST, DEFAULT_ENGINE_PORT, DEFAULT_MAX_CHUNK_LENGTH, DEFAULT_SPEAKER,
    FilterSettings, SettingsError, SpeechSettings, SynthesisParams,
};
