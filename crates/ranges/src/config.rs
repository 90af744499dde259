//! Transcript configuration.

use serde::{Deserialize, Serialize};

/// The default glyph rendered in place of redacted bytes.
pub const DEFAULT_REDACTION_GLYPH: char = '*';

/// Configuration of a [`Transcript`](crate::Transcript).
#[derive(derive_builder::Builder, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct TranscriptConfig {
    /// Glyph rendered in place of redacted bytes.
    #[builder(default = "DEFAULT_REDACTION_GLYPH")]
    redaction_glyph: char,
    /// Maximum number of bytes that can be sent.
    #[builder(setter(strip_option), default)]
    max_sent_data: Option<usize>,
    /// Maximum number of bytes that can be received.
    #[builder(setter(strip_option), default)]
    max_recv_data: Option<usize>,
}

impl TranscriptConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.redaction_glyph == Some('\0') {
            return Err("redaction_glyph must not be the redaction byte itself".to_string());
        }
        Ok(())
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            redaction_glyph: DEFAULT_REDACTION_GLYPH,
            max_sent_data: None,
            max_recv_data: None,
        }
    }
}

impl TranscriptConfig {
    /// Creates a new builder for `TranscriptConfig`.
    pub fn builder() -> TranscriptConfigBuilder {
        TranscriptConfigBuilder::default()
    }

    /// Returns the glyph rendered in place of redacted bytes.
    pub fn redaction_glyph(&self) -> char {
        self.redaction_glyph
    }

    /// Returns the maximum number of bytes that can be sent.
    pub fn max_sent_data(&self) -> Option<usize> {
        self.max_sent_data
    }

    /// Returns the maximum number of bytes that can be received.
    pub fn max_recv_data(&self) -> Option<usize> {
        self.max_recv_data
    }
}
