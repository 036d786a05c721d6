//! Errors that may rise while parsing, validating, sampling or producing
//! an Orbit Ephemeris Message.
use thiserror::Error;

use hifitime::Duration;

use crate::{
    epoch::{EpochTime, TimeSystem},
    validation::ValidationReport,
};

/// Tokenizer errors: the content does not follow the KVN
/// or XML grammar, regardless of its meaning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParsingError {
    #[error("first keyword must be CCSDS_OEM_VERS")]
    MissingVersion,
    #[error("unknown or non supported revision \"{0}\"")]
    UnknownVersion(String),
    #[error("unknown file format \"{0}\"")]
    UnknownFormat(String),
    #[error("malformed line \"{0}\"")]
    MalformedLine(String),
    #[error("unexpected \"{0}\"")]
    Unexpected(String),
    #[error("state vector with {0} components (expecting 6 or 9)")]
    StateVectorWidth(usize),
    #[error("failed to parse number from \"{0}\"")]
    Number(String),
    #[error("malformed covariance: {0}")]
    Covariance(String),
    #[error("unterminated {0} block")]
    Unterminated(&'static str),
    #[error("{0}")]
    Xml(String),
}

/// [ParsingError] with its position in the document
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// KVN error, with 1-based line number
    #[error("line {line}: {error}")]
    Kvn { line: usize, error: ParsingError },
    /// XML error, the message carries the document position
    #[error("xml document: {error}")]
    Xml { error: ParsingError },
}

impl FormatError {
    pub(crate) fn kvn(line: usize, error: ParsingError) -> Self {
        Self::Kvn { line, error }
    }
    pub(crate) fn xml(error: ParsingError) -> Self {
        Self::Xml { error }
    }
    /// Returns line number, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Kvn { line, .. } => Some(*line),
            Self::Xml { .. } => None,
        }
    }
    /// Returns the underlying [ParsingError]
    pub fn error(&self) -> &ParsingError {
        match self {
            Self::Kvn { error, .. } | Self::Xml { error } => error,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("validation failed: {0}")]
    Validation(ValidationReport),
    #[error("epoch {0} is out of bounds")]
    OutOfBounds(EpochTime),
    #[error("interpolation unsupported: {0}")]
    InterpolationUnsupported(String),
    #[error("epoch {0} is not covered by any segment")]
    NoMatchingSegment(EpochTime),
    #[error("time system {found} is not compatible with {expected}")]
    UnsupportedTimeSystem {
        expected: TimeSystem,
        found: TimeSystem,
    },
    #[error("message has {0} segments")]
    MultiSegment(usize),
    #[error("invalid sampling interval {0}")]
    InvalidInterval(Duration),
    #[error("{0} reference frame is not inertial")]
    NonInertialFrame(String),
    #[error("segments are not comparable: {0}")]
    IncompatibleSegments(String),
    #[error("file i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml serialization: {0}")]
    Xml(String),
}
