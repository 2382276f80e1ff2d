//! The scan-then-inspect cursor over a record source.

use std::io::Read;

use csv::{Position, StringRecord};
use tracing::debug;

use crate::error::ScanError;
use crate::options::ScannerBuilder;
use crate::source::{CsvSource, RecordSource};

/// Cursor over the records of one input.
///
/// [`scan`](Scanner::scan) advances to the next record;
/// [`record`](Scanner::record) and [`error`](Scanner::error) describe the
/// outcome. A `false` from `scan` means either clean end of input
/// (`error()` is `None`) or a stop caused by an error.
///
/// ```
/// use csv_scan::Scanner;
///
/// let mut scanner = Scanner::new("a,b\n1,2\n".as_bytes());
/// let mut count = 0;
/// while scanner.scan() {
///     assert_eq!(scanner.record().len(), 2);
///     count += 1;
/// }
/// assert!(scanner.error().is_none());
/// assert_eq!(count, 2);
/// ```
#[derive(Debug)]
pub struct Scanner<S> {
    source: S,
    continue_on_error: bool,
    reuse_record: bool,
    record: StringRecord,
    error: Option<ScanError>,
    /// Set once an error has stopped scanning for good.
    halted: bool,
}

impl<R: Read> Scanner<CsvSource<R>> {
    /// Scan `rdr` with the default options.
    pub fn new(rdr: R) -> Self {
        ScannerBuilder::new().from_reader(rdr)
    }
}

impl<S> Scanner<S> {
    /// Returns the current record.
    ///
    /// Only meaningful after [`scan`](Scanner::scan) returned true. After a
    /// false return it still holds the last record scanned, unless records
    /// are reused, in which case the reader may have overwritten it.
    pub fn record(&self) -> &StringRecord {
        &self.record
    }

    /// Moves the current record out, leaving an empty one in its place.
    pub fn take_record(&mut self) -> StringRecord {
        std::mem::take(&mut self.record)
    }

    /// Returns the error from the last call to [`scan`](Scanner::scan).
    ///
    /// `None` after a successful advance and at clean end of input.
    pub fn error(&self) -> Option<&ScanError> {
        self.error.as_ref()
    }

    /// Moves the last error out.
    pub fn take_error(&mut self) -> Option<ScanError> {
        self.error.take()
    }

    /// Returns where the current record starts, when the source knows.
    pub fn position(&self) -> Option<&Position> {
        self.record.position()
    }

    /// Returns true once an error has stopped scanning. Every later
    /// [`scan`](Scanner::scan) returns false without reading.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Returns the record source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Unwrap the record source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: RecordSource> Scanner<S> {
    /// Wrap `source` with an explicit policy. No records are skipped.
    pub fn with_policy(source: S, continue_on_error: bool, reuse_record: bool) -> Self {
        Self {
            source,
            continue_on_error,
            reuse_record,
            record: StringRecord::new(),
            error: None,
            halted: false,
        }
    }

    /// Advance to the next record.
    ///
    /// Returns true when a record is available through
    /// [`record`](Scanner::record). With `continue_on_error` a malformed
    /// record also returns true, so check [`error`](Scanner::error) before
    /// trusting the record. Returns false at end of input or when an error
    /// stops scanning.
    pub fn scan(&mut self) -> bool {
        if self.halted {
            return false;
        }

        let mut fresh = StringRecord::new();
        let target = if self.reuse_record {
            &mut self.record
        } else {
            &mut fresh
        };

        match self.source.read_record(target) {
            Ok(true) => {
                self.accept(fresh);
                self.error = None;
                true
            }
            Ok(false) => {
                self.error = None;
                false
            }
            Err(err) if self.continue_on_error && !err.is_fatal() => {
                debug!(error = %err, "continuing past malformed record");
                self.accept(fresh);
                self.error = Some(err);
                true
            }
            Err(err) => {
                debug!(error = %err, "scanning stopped");
                self.error = Some(err);
                self.halted = true;
                false
            }
        }
    }

    fn accept(&mut self, fresh: StringRecord) {
        if !self.reuse_record {
            self.record = fresh;
        }
    }

    /// Iterate over the remaining records.
    ///
    /// ```
    /// use csv_scan::Scanner;
    ///
    /// let mut scanner = Scanner::new("a,b\nc,d\n".as_bytes());
    /// let records = scanner.records().collect::<Result<Vec<_>, _>>().unwrap();
    /// assert_eq!(records.len(), 2);
    /// ```
    pub fn records(&mut self) -> Records<'_, S> {
        Records { scanner: self }
    }

    /// Advance `count` times, discarding the records.
    pub(crate) fn skip(&mut self, count: usize) {
        let mut skipped = 0;
        while skipped < count && self.scan() {
            skipped += 1;
        }
        if count > 0 {
            debug!(requested = count, skipped, "skipped leading records");
        }
    }
}

/// Iterator over the records of a [`Scanner`], created by
/// [`Scanner::records`].
///
/// Yields each record as an owned value, following the scanner's error
/// policy: with `continue_on_error` a malformed record yields `Err` and
/// iteration goes on, otherwise the first `Err` ends it.
#[derive(Debug)]
pub struct Records<'s, S> {
    scanner: &'s mut Scanner<S>,
}

impl<S: RecordSource> Iterator for Records<'_, S> {
    type Item = Result<StringRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let scanner = &mut *self.scanner;
        if scanner.scan() {
            return Some(match scanner.error.take() {
                Some(err) => Err(err),
                None if scanner.reuse_record => Ok(scanner.record.clone()),
                None => Ok(scanner.take_record()),
            });
        }
        scanner.error.take().map(Err)
    }
}
