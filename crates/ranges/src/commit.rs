//! Commitments and the commit/reveal plans handed to the attestation layer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    range::{complement, locate_all, ByteRange},
    transcript::{Direction, Transcript},
    Error,
};

/// A located part of a transcript.
///
/// Produced by the JSON structural parser and the transcript line classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    /// Dot-joined JSON object keys leading to the value, eg.
    /// `information.address.street`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Name of the HTTP header on this line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The range of the commitment.
    pub range: ByteRange,
}

impl Commitment {
    pub(crate) fn opaque(range: ByteRange) -> Self {
        Self {
            path: None,
            name: None,
            range,
        }
    }

    /// Returns the commitment with its range moved right by `offset`.
    pub fn shift(self, offset: usize) -> Self {
        Self {
            range: self.range.start + offset..self.range.end + offset,
            ..self
        }
    }
}

/// Ranges of the transcript the prover commits to during notarization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Ranges of the sent data.
    pub sent: Vec<ByteRange>,
    /// Ranges of the received data.
    pub recv: Vec<ByteRange>,
}

impl Commit {
    /// Creates a new commit builder.
    pub fn builder(transcript: &Transcript) -> CommitBuilder<'_> {
        CommitBuilder::new(transcript)
    }

    /// Returns a commit to the entire transcript.
    pub fn full(transcript: &Transcript) -> Self {
        let (sent_len, recv_len) = transcript.len();

        Self {
            sent: vec![0..sent_len],
            recv: vec![0..recv_len],
        }
    }

    /// Checks that every range is in bounds of the transcript.
    pub fn validate(&self, transcript: &Transcript) -> Result<(), Error> {
        validate_ranges(transcript, Direction::Sent, &self.sent)?;
        validate_ranges(transcript, Direction::Received, &self.recv)
    }
}

/// Ranges of the transcript the prover discloses to the verifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    /// Ranges of the sent data.
    pub sent: Vec<ByteRange>,
    /// Ranges of the received data.
    pub recv: Vec<ByteRange>,
    /// Whether to disclose the identity of the server.
    #[serde(default)]
    pub server_identity: bool,
}

impl Reveal {
    /// Checks that every range is in bounds of the transcript.
    pub fn validate(&self, transcript: &Transcript) -> Result<(), Error> {
        validate_ranges(transcript, Direction::Sent, &self.sent)?;
        validate_ranges(transcript, Direction::Received, &self.recv)
    }
}

impl From<Commit> for Reveal {
    fn from(value: Commit) -> Self {
        Self {
            sent: value.sent,
            recv: value.recv,
            server_identity: false,
        }
    }
}

fn validate_ranges(
    transcript: &Transcript,
    direction: Direction,
    ranges: &[ByteRange],
) -> Result<(), Error> {
    let len = transcript.data(direction).len();

    for range in ranges {
        if range.start > range.end || range.end > len {
            return Err(Error::invalid_range(format!(
                "range {:?} is out of bounds of the transcript ({}): {}",
                range, direction, len
            )));
        }
    }

    Ok(())
}

/// A builder for [`Commit`].
///
/// Ranges are kept per direction in the order they were added.
#[derive(Debug)]
pub struct CommitBuilder<'a> {
    transcript: &'a Transcript,
    sent: Vec<ByteRange>,
    recv: Vec<ByteRange>,
}

impl<'a> CommitBuilder<'a> {
    /// Creates a new commit builder.
    pub fn new(transcript: &'a Transcript) -> Self {
        Self {
            transcript,
            sent: Vec::new(),
            recv: Vec::new(),
        }
    }

    fn ranges_mut(&mut self, direction: Direction) -> &mut Vec<ByteRange> {
        match direction {
            Direction::Sent => &mut self.sent,
            Direction::Received => &mut self.recv,
        }
    }

    /// Adds ranges.
    ///
    /// # Arguments
    ///
    /// * `direction` - The direction of the transcript.
    /// * `ranges` - The ranges to add.
    pub fn ranges(
        &mut self,
        direction: Direction,
        ranges: impl IntoIterator<Item = ByteRange>,
    ) -> Result<&mut Self, Error> {
        let ranges: Vec<ByteRange> = ranges.into_iter().collect();
        validate_ranges(self.transcript, direction, &ranges)?;

        self.ranges_mut(direction).extend(ranges);

        Ok(self)
    }

    /// Adds the first occurrence of each needle.
    ///
    /// # Arguments
    ///
    /// * `direction` - The direction of the transcript.
    /// * `needles` - The literal text to locate.
    pub fn only<I>(&mut self, direction: Direction, needles: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let ranges = locate_all(self.transcript.data(direction), needles)?;

        self.ranges(direction, ranges)
    }

    /// Adds everything except the first occurrence of each needle.
    ///
    /// # Arguments
    ///
    /// * `direction` - The direction of the transcript.
    /// * `needles` - The literal text to withhold.
    pub fn all_except<I>(&mut self, direction: Direction, needles: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let data = self.transcript.data(direction);
        let holes = locate_all(data, needles)?;
        let ranges = complement(&(0..data.len()), &holes)?;

        debug!(
            %direction,
            withheld = holes.len(),
            ranges = ranges.len(),
            "computed ranges excluding needles"
        );

        self.ranges(direction, ranges)
    }

    /// Builds the commit.
    pub fn build(self) -> Result<Commit, Error> {
        let commit = Commit {
            sent: self.sent,
            recv: self.recv,
        };

        commit.validate(self.transcript)?;

        Ok(commit)
    }
}
