//! Errors.

use std::{error::Error as StdError, fmt};

/// An error produced while computing transcript ranges.
#[derive(Debug, thiserror::Error)]
pub struct Error {
    kind: ErrorKind,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The JSON text could not be scanned into a balanced structure.
    MalformedJson,
    /// A needle does not occur in the buffer.
    NotFound,
    /// A range is inverted or cannot be clamped into its bounds.
    InvalidRange,
    /// An HTTP message could not be parsed.
    Http,
    /// Data which must be text is not valid UTF-8.
    Utf8,
    /// A configuration value was rejected.
    Config,
}

impl Error {
    pub(crate) fn new<E>(kind: ErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self {
            kind,
            source: Some(source.into()),
        }
    }

    pub(crate) fn malformed_json(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedJson, msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg.into())
    }

    pub(crate) fn invalid_range(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRange, msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg.into())
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::MalformedJson => write!(f, "malformed json error")?,
            ErrorKind::NotFound => write!(f, "not found error")?,
            ErrorKind::InvalidRange => write!(f, "invalid range error")?,
            ErrorKind::Http => write!(f, "http error")?,
            ErrorKind::Utf8 => write!(f, "utf-8 error")?,
            ErrorKind::Config => write!(f, "config error")?,
        }

        if let Some(ref source) = self.source {
            write!(f, " caused by: {}", source)?;
        }

        Ok(())
    }
}

impl From<spansy::ParseError> for Error {
    fn from(value: spansy::ParseError) -> Self {
        Self::new(ErrorKind::Http, value)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(value: std::str::Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8, value)
    }
}
