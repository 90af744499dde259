//! Byte ranges of TLS transcripts.
//!
//! A prover commits to, and later discloses, parts of a TLS transcript which
//! are described as half-open byte ranges into the sent and received data.
//! This crate computes those ranges:
//!
//! - [`locate_all`] and [`complement`] turn "everything except this secret"
//!   into explicit ranges.
//! - [`parse_json`] locates the objects, arrays and members of a JSON text.
//! - [`parse_transcript_lines`] classifies the lines of a transcript as JSON,
//!   header or opaque lines.
//! - [`Transcript`] renders redacted transcripts and splits HTTP messages
//!   into their parts.
//!
//! The resulting ranges are collected into a [`Commit`] or [`Reveal`] which is
//! handed to the attestation layer. No cryptography happens here.
//!
//! # Warning
//!
//! The JSON parser does not handle escaped quotes inside strings. A string
//! containing `\"` is rejected as malformed.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]
#![forbid(unsafe_code)]

pub mod commit;
pub mod config;
mod error;
pub mod http;
pub mod json;
pub mod lines;
pub mod log;
pub mod range;
pub mod transcript;

pub use commit::{Commit, CommitBuilder, Commitment, Reveal};
pub use config::{TranscriptConfig, TranscriptConfigBuilder, TranscriptConfigBuilderError};
pub use error::{Error, ErrorKind};
pub use http::{HttpHeader, HttpMessage, TranscriptRanges};
pub use json::parse_json;
pub use lines::parse_transcript_lines;
pub use log::{init_logging, LoggingConfig, LoggingLevel};
pub use range::{complement, locate_all, ByteRange};
pub use transcript::{Direction, Transcript, TranscriptText};

#[doc(hidden)]
pub use spansy;
