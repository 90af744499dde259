//! Transcript line classifier.
//!
//! Splits a transcript into lines and turns every line into commitments:
//! a JSON container line is expanded by the structural parser, a `name: value`
//! line becomes a named header commitment and anything else an opaque one.
//! Empty lines and lines holding just a number produce nothing.

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::{commit::Commitment, json::parse_json, range::ByteRange};

/// Classifies every line of `text`.
///
/// Lines are terminated by `\r\n`, `\r` or `\n`. The range of a header or
/// opaque line includes its terminator, the commitments of a JSON line are
/// shifted to the position of the line in `text`.
pub fn parse_transcript_lines(text: &str) -> Vec<Commitment> {
    let bytes = text.as_bytes();
    let mut commitments = Vec::new();
    let mut line_start: Option<usize> = None;

    let mut pos = 0;
    while pos < bytes.len() {
        let terminator = match bytes[pos] {
            b'\r' if bytes.get(pos + 1) == Some(&b'\n') => 2,
            b'\r' | b'\n' => 1,
            _ => {
                line_start.get_or_insert(pos);
                pos += 1;
                continue;
            }
        };

        if let Some(start) = line_start.take() {
            classify(text, start..pos, pos + terminator, &mut commitments);
        }
        pos += terminator;
    }

    if let Some(start) = line_start {
        classify(text, start..bytes.len(), bytes.len(), &mut commitments);
    }

    debug!(count = commitments.len(), "classified transcript lines");

    commitments
}

/// Classifies the line at `line`, whose terminator ends at `end`.
fn classify(text: &str, line: ByteRange, end: usize, commitments: &mut Vec<Commitment>) {
    let content = &text[line.clone()];

    if content.trim().is_empty() {
        return;
    }

    if is_number(content.trim()) {
        trace!(start = line.start, "ignoring numeric line");
        return;
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(_)) | Ok(Value::Array(_)) => match parse_json(content, line.start) {
            Ok(json) => {
                trace!(start = line.start, count = json.len(), "json line");
                commitments.extend(json);
                return;
            }
            Err(err) => {
                warn!(start = line.start, "treating json line as opaque: {}", err);
                commitments.push(Commitment::opaque(line.start..end));
                return;
            }
        },
        _ => {}
    }

    let commitment = match content.split_once(':') {
        Some((name, _)) => Commitment {
            path: None,
            name: Some(name.trim().to_string()),
            range: line.start..end,
        },
        None => Commitment::opaque(line.start..end),
    };

    trace!(start = line.start, name = ?commitment.name, "header line");

    commitments.push(commitment);
}

/// Returns whether `text` is a JSON number literal, regardless of whether it
/// fits into a `f64`.
fn is_number(text: &str) -> bool {
    fn digits(bytes: &[u8]) -> usize {
        bytes.iter().take_while(|b| b.is_ascii_digit()).count()
    }

    let mut bytes = text.as_bytes();
    if let [b'-', rest @ ..] = bytes {
        bytes = rest;
    }

    let int = digits(bytes);
    if int == 0 || (int > 1 && bytes[0] == b'0') {
        return false;
    }
    bytes = &bytes[int..];

    if let [b'.', rest @ ..] = bytes {
        let frac = digits(rest);
        if frac == 0 {
            return false;
        }
        bytes = &rest[frac..];
    }

    if let [b'e' | b'E', rest @ ..] = bytes {
        let rest = match rest {
            [b'+' | b'-', rest @ ..] => rest,
            _ => rest,
        };
        let exp = digits(rest);
        if exp == 0 {
            return false;
        }
        bytes = &rest[exp..];
    }

    bytes.is_empty()
}
