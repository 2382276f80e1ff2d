//! Record sources: the reading primitive a [`Scanner`](crate::Scanner) drives.

use std::io::Read;

use csv::{ByteRecord, Position, StringRecord};
use tracing::warn;

use crate::dialect::{Dialect, FieldsPerRecord, QUOTE};
use crate::error::{ParseError, Result, ScanError};
use crate::quotes::{self, Lead, QuoteFault, Recorder};

/// Produces one record per call.
///
/// Returns `Ok(true)` when `record` was filled, `Ok(false)` at end of input
/// and `Err` when the record could not be read. After an error the source
/// may be asked for the next record again.
pub trait RecordSource {
    /// Read the next record into `record`, reusing its storage.
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        (**self).read_record(record)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        (**self).read_record(record)
    }
}

/// A [`RecordSource`] reading CSV text with the `csv` crate.
///
/// The reader frames records; their raw bytes are walked again to place
/// errors, enforce strict quoting and trim leading space.
#[derive(Debug)]
pub struct CsvSource<R> {
    reader: csv::Reader<Recorder<R>>,
    dialect: Dialect,
    /// Why the dialect is unusable, if it is.
    invalid: Option<String>,
    /// Field count fixed by the first record.
    expected_fields: Option<usize>,
    framing: ByteRecord,
    records: u64,
}

impl<R: Read> CsvSource<R> {
    /// Create a source over `rdr` using `dialect`.
    ///
    /// An invalid dialect does not fail here; every read reports it instead.
    pub fn new(rdr: R, dialect: Dialect) -> Self {
        let invalid = dialect.validate().err();
        if let Some(ref reason) = invalid {
            warn!(reason = %reason, "dialect rejected, every read will fail");
        }

        // Field counts are checked here so that every mismatch is reported
        // the same way.
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .quoting(true)
            .quote(QUOTE)
            .double_quote(true)
            .trim(csv::Trim::None);
        if invalid.is_none() {
            builder.delimiter(dialect.comma).comment(dialect.comment);
        }

        let recorder = Recorder::new(rdr, invalid.is_none());
        Self {
            reader: builder.from_reader(recorder),
            dialect,
            invalid,
            expected_fields: dialect.fields_per_record.exact(),
            framing: ByteRecord::new(),
            records: 0,
        }
    }

    /// Returns the dialect this source reads with.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Returns the position just past the last byte consumed.
    pub fn position(&self) -> &Position {
        self.reader.position()
    }

    /// Unwrap the caller's stream. It is never closed by this crate.
    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }

    /// Bytes consumed by the reader since the last call.
    fn take_raw(&mut self) -> Vec<u8> {
        let end = self.reader.position().byte();
        self.reader.get_mut().take_through(end)
    }

    /// Frame one more record and append its raw bytes to `raw`. Returns
    /// false at end of input.
    fn frame(&mut self, raw: &mut Vec<u8>) -> Result<bool> {
        let read = self.reader.read_byte_record(&mut self.framing);
        raw.append(&mut self.take_raw());
        Ok(read?)
    }

    /// Where the record in `raw` starts, given the reader position before it.
    fn start_of(&mut self, base: &Position, lead: Lead) -> Position {
        self.records += 1;
        let mut start = Position::new();
        start
            .set_byte(base.byte() + lead.bytes as u64)
            .set_line(base.line() + lead.lines)
            .set_record(self.records - 1);
        start
    }

    fn check_field_count(&mut self, start_line: u64, found: usize) -> Result<()> {
        if self.dialect.fields_per_record == FieldsPerRecord::Unchecked {
            return Ok(());
        }
        match self.expected_fields {
            None => {
                self.expected_fields = Some(found);
                Ok(())
            }
            Some(expected) if expected != found => {
                Err(ParseError::field_count(start_line, expected, found).into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Read with the csv reader's own field splitting.
    fn read_split(
        &mut self,
        record: &mut StringRecord,
        base: Position,
        at_stream_start: bool,
    ) -> Result<bool> {
        let read = self.reader.read_record(record);
        let raw = self.take_raw();
        match read {
            Ok(false) => return Ok(false),
            Err(err) if err.is_io_error() => return Err(err.into()),
            _ => {}
        }
        let lead = quotes::lead(&raw, &self.dialect, at_stream_start);
        let start = self.start_of(&base, lead);

        if !self.dialect.lazy_quotes {
            let walk = quotes::walk_record(&raw, &self.dialect, at_stream_start, false)
                .map_err(|fault| quote_error(&start, fault))?;
            if let Some(fault) = walk.open {
                return Err(quote_error(&start, fault));
            }
        }
        read.map_err(|err| relocate(err.into(), start.line()))?;

        if at_stream_start {
            strip_bom(record);
        }
        record.set_position(Some(start.clone()));
        self.check_field_count(start.line(), record.len())?;
        Ok(true)
    }

    /// Read with leading space trimmed. Fields are split from the raw bytes,
    /// since the csv reader treats a quote after whitespace as data.
    fn read_trimmed(
        &mut self,
        record: &mut StringRecord,
        base: Position,
        at_stream_start: bool,
    ) -> Result<bool> {
        let mut raw = Vec::new();
        if !self.frame(&mut raw)? {
            return Ok(false);
        }
        let lead = quotes::lead(&raw, &self.dialect, at_stream_start);
        let start = self.start_of(&base, lead);

        // A quoted field holding a line end spans several framed records.
        let mut exhausted = false;
        let walk = loop {
            let walk = quotes::walk_record(&raw, &self.dialect, at_stream_start, true)
                .map_err(|fault| quote_error(&start, fault))?;
            if walk.open.is_none() || exhausted {
                break walk;
            }
            exhausted = !self.frame(&mut raw)?;
        };
        if let Some(fault) = walk.open
            && !self.dialect.lazy_quotes
        {
            return Err(quote_error(&start, fault));
        }

        record.clear();
        for (i, field) in walk.fields.iter().enumerate() {
            let field =
                std::str::from_utf8(field).map_err(|_| ParseError::utf8(start.line(), i))?;
            record.push_field(field);
        }
        record.set_position(Some(start.clone()));
        self.check_field_count(start.line(), record.len())?;
        Ok(true)
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    fn read_record(&mut self, record: &mut StringRecord) -> Result<bool> {
        if let Some(ref reason) = self.invalid {
            return Err(ScanError::InvalidDialect(reason.clone()));
        }

        let at_stream_start = self.reader.get_ref().at_stream_start();
        let base = self.reader.position().clone();
        if self.dialect.trim_leading_space {
            self.read_trimmed(record, base, at_stream_start)
        } else {
            self.read_split(record, base, at_stream_start)
        }
    }
}

fn quote_error(start: &Position, fault: QuoteFault) -> ScanError {
    ScanError::Parse(ParseError {
        start_line: start.line(),
        line: start.line() + fault.line_offset,
        column: fault.column,
        field: fault.field,
        kind: fault.kind,
    })
}

/// Point a reader parse error at the record's first line.
fn relocate(err: ScanError, line: u64) -> ScanError {
    match err {
        ScanError::Parse(mut parse) => {
            parse.start_line = line;
            parse.line = line;
            ScanError::Parse(parse)
        }
        other => other,
    }
}

fn strip_bom(record: &mut StringRecord) {
    let Some(first) = record.get(0) else {
        return;
    };
    let Some(stripped) = first.strip_prefix('\u{feff}') else {
        return;
    };
    let mut fields = StringRecord::new();
    fields.push_field(stripped);
    for field in record.iter().skip(1) {
        fields.push_field(field);
    }
    *record = fields;
}
