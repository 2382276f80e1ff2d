use std::fmt;
use std::io;
use thiserror::Error;

/// Error type for scanning operations.
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed record.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The dialect cannot be used for reading. Every advance fails with this.
    #[error("Invalid dialect: {0}")]
    InvalidDialect(String),

    /// Any other failure reported by the CSV reader.
    #[error("CSV error: {0}")]
    Other(String),
}

impl ScanError {
    /// Returns true if scanning cannot make progress past this error,
    /// whatever the continuation policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::InvalidDialect(_))
    }

    /// Returns the parse error details, if this is a malformed record.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            ScanError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for ScanError {
    fn from(err: csv::Error) -> Self {
        if let Some(parse) = ParseError::from_csv(&err) {
            return ScanError::Parse(parse);
        }
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => ScanError::Io(io),
            _ => ScanError::Other(message),
        }
    }
}

/// A malformed record, with the location of the fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Line where the record starts.
    pub start_line: u64,
    /// Line where the fault was found.
    pub line: u64,
    /// 1-based byte column of the fault within `line`.
    pub column: usize,
    /// 0-based index of the field holding the fault.
    pub field: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn field_count(start_line: u64, expected: usize, found: usize) -> Self {
        Self {
            start_line,
            line: start_line,
            column: 1,
            field: 0,
            kind: ParseErrorKind::FieldCount { expected, found },
        }
    }

    pub(crate) fn utf8(line: u64, field: usize) -> Self {
        Self {
            start_line: line,
            line,
            column: 1,
            field,
            kind: ParseErrorKind::Utf8 { field },
        }
    }

    fn from_csv(err: &csv::Error) -> Option<Self> {
        match err.kind() {
            csv::ErrorKind::Utf8 { pos, err } => {
                let line = pos.as_ref().map_or(0, csv::Position::line);
                Some(Self::utf8(line, err.field()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if matches!(self.kind, ParseErrorKind::FieldCount { .. }) {
            return write!(f, "record on line {}: {}", self.line, self.kind);
        }
        if self.start_line != self.line {
            write!(f, "record on line {}; ", self.start_line)?;
        }
        write!(
            f,
            "parse error on line {}, column {}: {}",
            self.line, self.column, self.kind
        )
    }
}

impl std::error::Error for ParseError {}

/// The kind of fault found in a malformed record.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A quote appeared inside a field that did not start with one.
    #[error("bare \" in non-quoted-field")]
    BareQuote,
    /// A quoted field was not closed, or its closing quote was followed by
    /// something other than a delimiter or line end.
    #[error("extraneous or missing \" in quoted-field")]
    Quote,
    /// The record does not have the expected number of fields.
    #[error("wrong number of fields (expected {expected}, found {found})")]
    FieldCount { expected: usize, found: usize },
    /// A field is not valid UTF-8.
    #[error("invalid UTF-8 in field {field}")]
    Utf8 { field: usize },
}

/// Result type alias for scanning operations.
pub type Result<T> = std::result::Result<T, ScanError>;
