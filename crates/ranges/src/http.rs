//! HTTP message adapter.
//!
//! Wraps the span-reporting HTTP parser of [`spansy`] and exposes the parts of
//! a message (start line, header lines and body) as literal text together with
//! the byte ranges they occupy in the transcript. The literal text is what
//! [`locate_all`](crate::locate_all) needles are made of, the ranges can be
//! handed to a [`Commit`](crate::Commit) directly.

use std::collections::BTreeMap;

use serde::Serialize;
use spansy::Spanned;
use tracing::{debug, warn};

use crate::{json::parse_json, range::ByteRange, Error, ErrorKind};

/// A header line of an HTTP message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpHeader {
    /// Name of the header, as it appears in the message.
    pub name: String,
    /// Value of the header with surrounding whitespace removed.
    pub value: String,
    /// Range of the whole header line, including its line terminator.
    pub range: ByteRange,
    line: String,
}

impl HttpHeader {
    /// Returns the literal header line, including its line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// An HTTP request or response split into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HttpMessage {
    /// The request or status line, including its line terminator.
    pub start_line: String,
    /// Range of the start line.
    pub start_line_range: ByteRange,
    /// Header lines in the order they appear.
    pub headers: Vec<HttpHeader>,
    /// The message body.
    pub body: Option<Vec<u8>>,
    /// Range of the message body.
    pub body_range: Option<ByteRange>,
    /// Length of the data the message was parsed from.
    #[serde(skip)]
    len: usize,
}

impl HttpMessage {
    /// Parses an HTTP request.
    pub fn parse_request(data: &[u8]) -> Result<Self, Error> {
        let req = spansy::http::parse_request(data)?;

        let start_line = bounds(
            req.request.span().indices().min(),
            req.request.span().indices().end(),
        );
        let headers = req
            .headers
            .iter()
            .filter_map(|header| header.span().indices().min());
        let body = req
            .body
            .as_ref()
            .and_then(|body| bounds(body.span().indices().min(), body.span().indices().end()));

        Self::from_parts(data, start_line, headers, body)
    }

    /// Parses an HTTP response.
    pub fn parse_response(data: &[u8]) -> Result<Self, Error> {
        let resp = spansy::http::parse_response(data)?;

        let start_line = bounds(
            resp.status.span().indices().min(),
            resp.status.span().indices().end(),
        );
        let headers = resp
            .headers
            .iter()
            .filter_map(|header| header.span().indices().min());
        let body = resp
            .body
            .as_ref()
            .and_then(|body| bounds(body.span().indices().min(), body.span().indices().end()));

        Self::from_parts(data, start_line, headers, body)
    }

    fn from_parts(
        data: &[u8],
        start_line: Option<ByteRange>,
        header_starts: impl Iterator<Item = usize>,
        body_range: Option<ByteRange>,
    ) -> Result<Self, Error> {
        let start_line_range = start_line
            .map(|range| line_at(data, range.start))
            .ok_or_else(|| Error::new(ErrorKind::Http, "message has no start line"))?;

        let headers = header_starts
            .map(|start| {
                let range = line_at(data, start);
                let line = String::from_utf8_lossy(&data[range.clone()]).into_owned();
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                    None => (line.trim().to_string(), String::new()),
                };

                HttpHeader {
                    name,
                    value,
                    range,
                    line,
                }
            })
            .collect::<Vec<_>>();

        let body_range = body_range.filter(|range| !range.is_empty() && range.end <= data.len());

        debug!(
            headers = headers.len(),
            body = body_range.is_some(),
            "parsed http message"
        );

        Ok(Self {
            start_line: String::from_utf8_lossy(&data[start_line_range.clone()]).into_owned(),
            start_line_range,
            headers,
            body: body_range.clone().map(|range| data[range].to_vec()),
            body_range,
            len: data.len(),
        })
    }

    /// Returns the header names and values as one flat list,
    /// `[name0, value0, name1, value1, ..]`.
    pub fn raw_headers(&self) -> Vec<String> {
        self.headers
            .iter()
            .flat_map(|header| [header.name.clone(), header.value.clone()])
            .collect()
    }

    /// Returns the headers with the given name, compared case-insensitively.
    pub fn headers_with_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HttpHeader> {
        self.headers
            .iter()
            .filter(move |header| header.name.eq_ignore_ascii_case(name))
    }
}

/// Ranges of the parts of one direction of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptRanges {
    /// The whole direction.
    pub all: ByteRange,
    /// The start line.
    pub info: ByteRange,
    /// Header lines keyed by their lower-cased name. The first header wins if
    /// a name repeats.
    pub headers: BTreeMap<String, ByteRange>,
    /// The message body.
    pub body: Option<ByteRange>,
    /// Members of a JSON body keyed by their path.
    pub json: BTreeMap<String, ByteRange>,
    /// Line terminators in the head of the message.
    pub line_breaks: Vec<ByteRange>,
}

impl TranscriptRanges {
    /// Computes the ranges of `message`, which was parsed from `data`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidRange`](crate::ErrorKind::InvalidRange) error if
    /// `data` is not the length of the data `message` was parsed from.
    pub fn new(message: &HttpMessage, data: &[u8]) -> Result<Self, Error> {
        if data.len() != message.len {
            return Err(Error::invalid_range(format!(
                "message was parsed from {} bytes but {} were given",
                message.len,
                data.len()
            )));
        }

        let mut headers = BTreeMap::new();
        for header in &message.headers {
            headers
                .entry(header.name.to_ascii_lowercase())
                .or_insert_with(|| header.range.clone());
        }

        let mut json = BTreeMap::new();
        if let Some(range) = &message.body_range {
            let body = std::str::from_utf8(&data[range.clone()]).unwrap_or_else(|err| {
                debug!("body is not utf-8, skipping json: {}", err);
                ""
            });
            let trimmed = body.trim_start();

            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match parse_json(body.trim_end(), range.start) {
                    Ok(commitments) => {
                        for commitment in commitments {
                            if let Some(path) = commitment.path {
                                json.entry(path).or_insert(commitment.range);
                            }
                        }
                    }
                    Err(err) => warn!("body looks like json but could not be parsed: {}", err),
                }
            }
        }

        let head_end = message
            .body_range
            .as_ref()
            .map_or(data.len(), |range| range.start);

        Ok(Self {
            all: 0..data.len(),
            info: message.start_line_range.clone(),
            headers,
            body: message.body_range.clone(),
            json,
            line_breaks: line_breaks(&data[..head_end]),
        })
    }
}

fn bounds(min: Option<usize>, end: Option<usize>) -> Option<ByteRange> {
    Some(min?..end?)
}

/// Returns the range of the line starting at `start`, including its `\n`.
fn line_at(data: &[u8], start: usize) -> ByteRange {
    let end = data[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(data.len(), |pos| start + pos + 1);

    start..end
}

fn line_breaks(head: &[u8]) -> Vec<ByteRange> {
    head.iter()
        .enumerate()
        .filter(|(_, &b)| b == b'\n')
        .map(|(pos, _)| {
            if pos > 0 && head[pos - 1] == b'\r' {
                pos - 1..pos + 1
            } else {
                pos..pos + 1
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::*;
    use tlsn_data_fixtures::http::{request, response};

    use super::*;

    #[test]
    fn test_parse_request() {
        let message = HttpMessage::parse_request(request::GET_WITH_HEADER).unwrap();

        assert_eq!(message.start_line, "GET /api/data HTTP/1.1\r\n");
        assert_eq!(message.start_line_range, 0..24);
        assert_eq!(
            message.raw_headers(),
            vec![
                "host",
                "example.com",
                "connection",
                "close",
                "secret",
                "test_secret"
            ]
        );
        assert!(message.body.is_none());
        assert!(message.body_range.is_none());

        for header in &message.headers {
            assert_eq!(
                &request::GET_WITH_HEADER[header.range.clone()],
                header.line().as_bytes()
            );
            assert!(header.line().ends_with("\r\n"));
        }
    }

    #[test]
    fn test_header_lines_are_needles() {
        let message = HttpMessage::parse_request(request::POST_JSON).unwrap();

        let authorization = message.headers_with_name("Authorization").next().unwrap();

        assert_eq!(authorization.line(), "authorization: Bearer t0ken\r\n");
        assert_eq!(
            crate::locate_all(request::POST_JSON, [authorization.line()]).unwrap(),
            vec![authorization.range.clone()]
        );
    }

    #[test]
    fn test_parse_response_body() {
        let message = HttpMessage::parse_response(response::OK_TEXT).unwrap();

        assert_eq!(message.start_line, "HTTP/1.1 200 OK\r\n");
        assert_eq!(message.body.as_deref(), Some(&b"Hello World!"[..]));

        let body_range = message.body_range.clone().unwrap();
        assert_eq!(body_range.end, response::OK_TEXT.len());
        assert_eq!(&response::OK_TEXT[body_range], b"Hello World!");
    }

    #[rstest]
    #[case::request(request::GET_EMPTY, true)]
    #[case::response(response::OK_EMPTY, false)]
    fn test_parse_without_body(#[case] src: &[u8], #[case] is_request: bool) {
        let message = if is_request {
            HttpMessage::parse_request(src).unwrap()
        } else {
            HttpMessage::parse_response(src).unwrap()
        };

        assert!(message.body_range.is_none());
        assert!(message.start_line.ends_with("\r\n"));
    }

    #[test]
    fn test_parse_malformed() {
        let err = HttpMessage::parse_request(b"not http").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Http);
    }

    #[test]
    fn test_transcript_ranges_json_body() {
        let message = HttpMessage::parse_response(response::OK_JSON).unwrap();

        let ranges = TranscriptRanges::new(&message, response::OK_JSON).unwrap();

        assert_eq!(ranges.all, 0..response::OK_JSON.len());
        assert_eq!(&response::OK_JSON[ranges.info.clone()], b"HTTP/1.1 200 OK\r\n");
        assert_eq!(
            &response::OK_JSON[ranges.headers["content-type"].clone()],
            b"content-type: application/json\r\n"
        );
        assert_eq!(
            &response::OK_JSON[ranges.json["information.address.street"].clone()],
            br#""street":"123 Elm Street""#
        );
        assert_eq!(
            &response::OK_JSON[ranges.json["meta.tags"].clone()],
            br#""tags":["fixture","json"]"#
        );

        // Status line, 3 headers and the blank line.
        assert_eq!(ranges.line_breaks.len(), 5);
        for range in &ranges.line_breaks {
            assert_eq!(&response::OK_JSON[range.clone()], b"\r\n");
        }
    }

    #[test]
    fn test_transcript_ranges_text_body() {
        let message = HttpMessage::parse_response(response::OK_TEXT).unwrap();

        let ranges = TranscriptRanges::new(&message, response::OK_TEXT).unwrap();

        assert!(ranges.json.is_empty());
        assert_eq!(ranges.body, message.body_range);
    }

    #[test]
    fn test_transcript_ranges_binary_body() {
        let mut data =
            b"HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: 4\r\n\r\n"
                .to_vec();
        data.extend_from_slice(&[0xff, 0xfe, 0x01, 0x02]);
        let message = HttpMessage::parse_response(&data).unwrap();

        let ranges = TranscriptRanges::new(&message, &data).unwrap();

        assert!(ranges.json.is_empty());
        assert_eq!(ranges.body, Some(data.len() - 4..data.len()));
        assert_eq!(
            &data[ranges.headers["content-type"].clone()],
            b"content-type: application/octet-stream\r\n"
        );
        assert_eq!(&data[ranges.info.clone()], b"HTTP/1.1 200 OK\r\n");
        assert_eq!(ranges.line_breaks.len(), 4);
    }

    #[rstest]
    #[case::shorter(&response::OK_JSON[..20])]
    #[case::longer(&[response::OK_JSON, b"extra"].concat())]
    fn test_transcript_ranges_wrong_data(#[case] data: &[u8]) {
        let message = HttpMessage::parse_response(response::OK_JSON).unwrap();

        let err = TranscriptRanges::new(&message, data).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidRange);
    }

    #[test]
    fn test_line_breaks_mixed() {
        assert_eq!(line_breaks(b"a\r\nb\nc"), vec![1..3, 4..5]);
    }
}
