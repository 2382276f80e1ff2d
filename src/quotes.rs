//! Raw record walking: strict quote checks, record start lines and
//! leading-space trimming.
//!
//! The csv reader accepts any quote placement and only sees a quote at the
//! very start of a field. Both rules are applied here to the raw bytes of
//! each record, which [`Recorder`] keeps while the reader consumes the
//! stream.

use std::io::{self, Read};

use crate::dialect::{Dialect, QUOTE};
use crate::encoding::skip_bom;
use crate::error::ParseErrorKind;

/// Wraps the input stream and keeps every byte read from it until the
/// record holding that byte has been checked.
#[derive(Debug)]
pub(crate) struct Recorder<R> {
    inner: R,
    active: bool,
    buf: Vec<u8>,
    /// Stream offset of `buf[0]`.
    start: u64,
}

impl<R> Recorder<R> {
    pub(crate) fn new(inner: R, active: bool) -> Self {
        Self {
            inner,
            active,
            buf: Vec::new(),
            start: 0,
        }
    }

    /// Removes and returns the recorded bytes up to stream offset `end`.
    ///
    /// Returns an empty buffer when recording is off.
    pub(crate) fn take_through(&mut self, end: u64) -> Vec<u8> {
        let n = usize::try_from(end.saturating_sub(self.start))
            .unwrap_or(usize::MAX)
            .min(self.buf.len());
        let rest = self.buf.split_off(n);
        self.start += n as u64;
        std::mem::replace(&mut self.buf, rest)
    }

    /// Returns true if nothing before `buf` has been handed out yet.
    pub(crate) fn at_stream_start(&self) -> bool {
        self.start == 0
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Recorder<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(out)?;
        if self.active {
            self.buf.extend_from_slice(&out[..n]);
        }
        Ok(n)
    }
}

/// Where strict quoting failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuoteFault {
    pub kind: ParseErrorKind,
    /// Lines between the first line of the record and the fault.
    pub line_offset: u64,
    /// 1-based byte column.
    pub column: usize,
    pub field: usize,
}

/// Blank and comment lines in front of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Lead {
    pub lines: u64,
    /// Includes a byte order mark at the start of the stream.
    pub bytes: usize,
}

/// One record read from its raw bytes.
#[derive(Debug, Default)]
pub(crate) struct Walk {
    /// Field contents with quoting resolved, when collected.
    pub fields: Vec<Vec<u8>>,
    /// Set when the bytes ran out inside a quoted field.
    pub open: Option<QuoteFault>,
}

/// Measure the blank and comment lines the reader skips before a record.
pub(crate) fn lead(raw: &[u8], dialect: &Dialect, at_stream_start: bool) -> Lead {
    let cursor = Cursor::at_record(raw, dialect, at_stream_start);
    Lead {
        lines: cursor.first_line,
        bytes: cursor.pos,
    }
}

/// Split one raw record into fields, checking its quoting.
///
/// Quoting faults are errors unless the dialect allows lazy quotes. Running
/// out of bytes inside a quoted field is reported through [`Walk::open`] so
/// the caller can supply more. Bytes after the record's line end other than
/// further line ends are a [`ParseErrorKind::Quote`] fault.
pub(crate) fn walk_record(
    raw: &[u8],
    dialect: &Dialect,
    at_stream_start: bool,
    collect: bool,
) -> Result<Walk, QuoteFault> {
    let mut cursor = Cursor::at_record(raw, dialect, at_stream_start);
    let mut walk = Walk::default();
    let mut buf = Vec::new();
    let mut field = 0;
    loop {
        if dialect.trim_leading_space {
            cursor.skip_space(dialect.comma);
        }
        let end = if cursor.peek() == Some(QUOTE) {
            cursor.advance();
            quoted(&mut cursor, dialect, field, &mut buf)?
        } else {
            unquoted(&mut cursor, dialect, field, &mut buf)?
        };
        if collect {
            walk.fields.push(buf.clone());
        }
        buf.clear();

        match end {
            FieldEnd::Delimiter => field += 1,
            FieldEnd::Open(fault) => {
                walk.open = Some(fault);
                return Ok(walk);
            }
            FieldEnd::Record => {
                while let Some(b'\r' | b'\n') = cursor.peek() {
                    cursor.advance();
                }
                if cursor.peek().is_some() {
                    return Err(cursor.fault(ParseErrorKind::Quote, field));
                }
                return Ok(walk);
            }
        }
    }
}

enum FieldEnd {
    Delimiter,
    Record,
    Open(QuoteFault),
}

fn quoted(
    cursor: &mut Cursor<'_>,
    dialect: &Dialect,
    field: usize,
    buf: &mut Vec<u8>,
) -> Result<FieldEnd, QuoteFault> {
    loop {
        match cursor.peek() {
            None => return Ok(FieldEnd::Open(cursor.fault(ParseErrorKind::Quote, field))),
            Some(QUOTE) => {
                cursor.advance();
                match cursor.peek() {
                    Some(QUOTE) => {
                        buf.push(QUOTE);
                        cursor.advance();
                    }
                    Some(b) if b == dialect.comma => {
                        cursor.advance();
                        return Ok(FieldEnd::Delimiter);
                    }
                    None | Some(b'\r' | b'\n') => return Ok(FieldEnd::Record),
                    Some(_) if dialect.lazy_quotes => buf.push(QUOTE),
                    Some(_) => return Err(cursor.fault(ParseErrorKind::Quote, field)),
                }
            }
            Some(b) => {
                buf.push(b);
                cursor.advance();
            }
        }
    }
}

fn unquoted(
    cursor: &mut Cursor<'_>,
    dialect: &Dialect,
    field: usize,
    buf: &mut Vec<u8>,
) -> Result<FieldEnd, QuoteFault> {
    loop {
        match cursor.peek() {
            None | Some(b'\r' | b'\n') => return Ok(FieldEnd::Record),
            Some(b) if b == dialect.comma => {
                cursor.advance();
                return Ok(FieldEnd::Delimiter);
            }
            Some(QUOTE) if !dialect.lazy_quotes => {
                return Err(cursor.fault(ParseErrorKind::BareQuote, field));
            }
            Some(b) => {
                buf.push(b);
                cursor.advance();
            }
        }
    }
}

/// Decode the character at the start of `bytes`, if it is valid UTF-8.
fn leading_char(bytes: &[u8]) -> Option<char> {
    let head = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&head[..e.valid_up_to()]).ok()?,
    };
    valid.chars().next()
}

struct Cursor<'a> {
    raw: &'a [u8],
    pos: usize,
    line_offset: u64,
    line_start: usize,
    /// Line offset of the record's first line.
    first_line: u64,
}

impl<'a> Cursor<'a> {
    /// Position a cursor on the first byte of the record in `raw`.
    fn at_record(raw: &'a [u8], dialect: &Dialect, at_stream_start: bool) -> Self {
        let bom = if at_stream_start {
            raw.len() - skip_bom(raw).len()
        } else {
            0
        };
        let mut cursor = Cursor {
            raw,
            pos: bom,
            line_offset: 0,
            line_start: bom,
            first_line: 0,
        };
        cursor.skip_ignored_lines(dialect.comment);
        cursor.first_line = cursor.line_offset;
        cursor
    }

    fn peek(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.peek() == Some(b'\n') {
            self.line_offset += 1;
            self.line_start = self.pos + 1;
        }
        self.pos += 1;
    }

    fn skip_ignored_lines(&mut self, comment: Option<u8>) {
        loop {
            match self.peek() {
                Some(b'\r' | b'\n') => self.advance(),
                Some(b) if Some(b) == comment => {
                    while let Some(b) = self.peek() {
                        self.advance();
                        if b == b'\n' {
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    /// Skip whitespace in front of a field, stopping at the delimiter and at
    /// line ends.
    fn skip_space(&mut self, comma: u8) {
        while let Some(c) = leading_char(&self.raw[self.pos..]) {
            if !c.is_whitespace() || matches!(c, '\r' | '\n') || c == char::from(comma) {
                return;
            }
            self.pos += c.len_utf8();
        }
    }

    fn fault(&self, kind: ParseErrorKind, field: usize) -> QuoteFault {
        QuoteFault {
            kind,
            line_offset: self.line_offset - self.first_line,
            column: self.pos - self.line_start + 1,
            field,
        }
    }
}
