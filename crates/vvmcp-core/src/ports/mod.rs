//! Port definitions (trait abstractions) for the adapters.
//!
//! # Design Rules
//!
//! - DTOs here are transport-agnostic wire shapes.
//! - No HTTP, process or audio details in any signature.

pub mod speech;

pub use speech::{SpeakReceipt, SpeechPort, SpeechPortError, TurnRequest};
