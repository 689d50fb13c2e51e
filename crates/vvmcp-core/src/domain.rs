//! Dialogue domain types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Engine speaker (style) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerId(pub u32);

impl SpeakerId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for SpeakerId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SpeakerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised when constructing a [`Turn`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("Turn text must not be blank")]
    BlankText,
}

/// One speaker's line of dialogue.
///
/// A turn is immutable once created and its text is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    text: String,
    speaker: SpeakerId,
}

impl Turn {
    /// Create a turn, rejecting blank text.
    pub fn new(text: impl Into<String>, speaker: SpeakerId) -> Result<Self, TurnError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TurnError::BlankText);
        }
        Ok(Self { text, speaker })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn speaker(&self) -> SpeakerId {
        self.speaker
    }
}
