//! Parsing error types.
//!
//! `UnitError` is what a single field consumer reports when it finds data it
//! cannot repair. `ParseError` is what the runners hand back to their caller,
//! with the position and consumer name attached.

use thiserror::Error;

use crate::pipeline::geo::LocationError;

#[derive(Error, Debug)]
pub enum UnitError {
    #[error("malformed {field} timestamp: \"{value}\"")]
    BadTimestamp { field: &'static str, value: String },

    #[error("unknown month abbreviation: {0}")]
    UnknownMonth(String),

    #[error("invalid header date: {0}")]
    BadHeaderDate(String),

    #[error("report ID \"{value}\" has {parts} parts, expected 2")]
    ReportIdParts { value: String, parts: usize },

    #[error("report ID part \"{part}\" of \"{value}\" is not an unsigned integer")]
    ReportIdNumber { value: String, part: String },

    #[error("date_occurred \"{0}\" does not contain two dates")]
    OccurredNotRange(String),

    #[error("date_occurred \"{0}\" starts after it ends, even after correction")]
    OccurredInverted(String),

    #[error("listed incident count \"{0}\" is not an integer")]
    BadCount(String),

    #[error("fields ended before the listed incident count")]
    MissingCount,

    #[error("document lists {listed} incidents but {parsed} were parsed")]
    CountMismatch { listed: usize, parsed: usize },

    #[error("location lookup failed: {0}")]
    Location(#[from] LocationError),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("field not parsed, index: {index}, field: \"{token}\"")]
    FieldNotInterpretable { index: usize, token: String },

    #[error("error running {unit} against field with index {index}: {source}")]
    Unit {
        unit: String,
        index: usize,
        #[source]
        source: UnitError,
    },

    #[error("{unit} reported consuming {count} fields at index {index} of {len}")]
    InvalidStep {
        unit: String,
        index: usize,
        count: usize,
        len: usize,
    },

    #[error("{count} crimes do not fit in the report's crime count")]
    TooManyCrimes { count: usize },

    #[error("{unit} did not parse any field")]
    NothingParsed { unit: String },

    #[error("no field consumers registered")]
    NoConsumers,
}

impl ParseError {
    /// Index of the token the failure is attached to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::FieldNotInterpretable { index, .. }
            | Self::Unit { index, .. }
            | Self::InvalidStep { index, .. } => Some(*index),
            Self::TooManyCrimes { .. } | Self::NothingParsed { .. } | Self::NoConsumers => None,
        }
    }
}
