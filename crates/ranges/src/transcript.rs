//! Transcript types.
//!
//! All application data communicated over a TLS connection is referred to as a
//! [`Transcript`]. A transcript is just two vectors of bytes, each
//! corresponding to a [`Direction`].
//!
//! ## Redacted bytes
//!
//! The byte `0x00` is reserved: the attestation engine writes it in place of
//! every byte whose plaintext was withheld by the other party. It never occurs
//! as legitimate transcript data. Rendering a transcript as text substitutes
//! it with a glyph, see [`TranscriptConfig::redaction_glyph`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    commit::Commitment,
    config::{TranscriptConfig, DEFAULT_REDACTION_GLYPH},
    http::{HttpMessage, TranscriptRanges},
    lines::parse_transcript_lines,
    range::ByteRange,
    Error,
};

/// The byte standing in for redacted data.
pub const REDACTED_BYTE: u8 = 0x00;

/// A transcript contains all the data communicated over a TLS connection.
#[derive(Clone)]
pub struct Transcript {
    /// Data sent from the Prover to the Server.
    sent: Vec<u8>,
    /// Data received by the Prover from the Server.
    recv: Vec<u8>,
    redaction_glyph: char,
}

opaque_debug::implement!(Transcript);

impl Transcript {
    /// Creates a new transcript.
    pub fn new(sent: impl Into<Vec<u8>>, recv: impl Into<Vec<u8>>) -> Self {
        Self {
            sent: sent.into(),
            recv: recv.into(),
            redaction_glyph: DEFAULT_REDACTION_GLYPH,
        }
    }

    /// Creates a new transcript, checking it against `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`Config`](crate::ErrorKind::Config) error if either direction
    /// exceeds its configured maximum length.
    pub fn with_config(
        sent: impl Into<Vec<u8>>,
        recv: impl Into<Vec<u8>>,
        config: &TranscriptConfig,
    ) -> Result<Self, Error> {
        let sent = sent.into();
        let recv = recv.into();

        if config.redaction_glyph() == '\0' {
            return Err(Error::config(
                "redaction glyph must not be the redaction byte itself",
            ));
        }

        check_len(Direction::Sent, sent.len(), config.max_sent_data())?;
        check_len(Direction::Received, recv.len(), config.max_recv_data())?;

        Ok(Self {
            sent,
            recv,
            redaction_glyph: config.redaction_glyph(),
        })
    }

    /// Returns a reference to the sent data.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Returns a reference to the received data.
    pub fn recv(&self) -> &[u8] {
        &self.recv
    }

    /// Returns the data of the given direction.
    pub fn data(&self, direction: Direction) -> &[u8] {
        match direction {
            Direction::Sent => &self.sent,
            Direction::Received => &self.recv,
        }
    }

    /// Returns the length of the sent and received data, respectively.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> (usize, usize) {
        (self.sent.len(), self.recv.len())
    }

    /// Renders both directions as text with the configured redaction glyph.
    pub fn text(&self) -> TranscriptText {
        self.text_with(self.redaction_glyph)
    }

    /// Renders both directions as text, substituting redacted bytes with
    /// `glyph`.
    pub fn text_with(&self, glyph: char) -> TranscriptText {
        TranscriptText {
            sent: render(&self.sent, glyph),
            recv: render(&self.recv, glyph),
        }
    }

    /// Renders the sent data as text.
    pub fn sent_text(&self) -> String {
        render(&self.sent, self.redaction_glyph)
    }

    /// Renders the received data as text.
    pub fn recv_text(&self) -> String {
        render(&self.recv, self.redaction_glyph)
    }

    /// Returns the maximal runs of redacted bytes in the given direction.
    pub fn redacted(&self, direction: Direction) -> Vec<ByteRange> {
        let mut ranges: Vec<ByteRange> = Vec::new();

        for (pos, &byte) in self.data(direction).iter().enumerate() {
            if byte != REDACTED_BYTE {
                continue;
            }

            match ranges.last_mut() {
                Some(range) if range.end == pos => range.end += 1,
                _ => ranges.push(pos..pos + 1),
            }
        }

        ranges
    }

    /// Parses the sent data as an HTTP request.
    pub fn parse_sent(&self) -> Result<HttpMessage, Error> {
        HttpMessage::parse_request(&self.sent)
    }

    /// Parses the received data as an HTTP response.
    pub fn parse_recv(&self) -> Result<HttpMessage, Error> {
        HttpMessage::parse_response(&self.recv)
    }

    /// Classifies every line of the given direction.
    ///
    /// # Errors
    ///
    /// Returns a [`Utf8`](crate::ErrorKind::Utf8) error if the data is not
    /// valid UTF-8.
    pub fn lines(&self, direction: Direction) -> Result<Vec<Commitment>, Error> {
        let text = std::str::from_utf8(self.data(direction))?;

        Ok(parse_transcript_lines(text))
    }

    /// Returns the ranges of the HTTP message in the given direction.
    pub fn ranges(&self, direction: Direction) -> Result<TranscriptRanges, Error> {
        let message = match direction {
            Direction::Sent => self.parse_sent()?,
            Direction::Received => self.parse_recv()?,
        };

        let ranges = TranscriptRanges::new(&message, self.data(direction))?;

        debug!(
            %direction,
            headers = ranges.headers.len(),
            json = ranges.json.len(),
            "computed transcript ranges"
        );

        Ok(ranges)
    }
}

fn check_len(direction: Direction, len: usize, max: Option<usize>) -> Result<(), Error> {
    match max {
        Some(max) if len > max => Err(Error::config(format!(
            "{} data length {} exceeds the configured maximum {}",
            direction, len, max
        ))),
        _ => Ok(()),
    }
}

fn render(data: &[u8], glyph: char) -> String {
    let mut buf = [0u8; 4];
    let glyph = glyph.encode_utf8(&mut buf).as_bytes();

    let mut bytes = Vec::with_capacity(data.len());
    for &byte in data {
        if byte == REDACTED_BYTE {
            bytes.extend_from_slice(glyph);
        } else {
            bytes.push(byte);
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// Both directions of a transcript rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptText {
    /// The sent data.
    pub sent: String,
    /// The received data.
    pub recv: String,
}

/// The direction of data communicated over a TLS connection.
///
/// This is used to differentiate between data sent from the Prover to the TLS
/// peer, and data received by the Prover from the TLS peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Sent from the Prover to the TLS peer.
    Sent = 0x00,
    /// Received by the prover from the TLS peer.
    Received = 0x01,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Sent => write!(f, "sent"),
            Direction::Received => write!(f, "received"),
        }
    }
}
