use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dialect::{Dialect, FieldsPerRecord};
use crate::error::Result;
use crate::scanner::Scanner;
use crate::source::{CsvSource, RecordSource};

/// Everything a scanner is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOptions {
    /// Parsing rules for the reader.
    pub dialect: Dialect,
    /// Read every record into the same buffer.
    pub reuse_record: bool,
    /// Keep scanning after a malformed record.
    pub continue_on_error: bool,
    /// Records consumed and discarded while the scanner is built.
    pub skip_records: usize,
}

/// Builds a [`Scanner`].
///
/// Each method sets one option; calling it again overwrites the previous
/// value. Nothing is read until a `from_*` method is called, and every
/// option is in effect before the first record is read.
///
/// # Example
///
/// ```
/// use csv_scan::ScannerBuilder;
///
/// let data = "name;age\nAlice;30\nBob;25\n";
/// let mut scanner = ScannerBuilder::new()
///     .comma(b';')
///     .skip_header_record()
///     .from_reader(data.as_bytes());
///
/// let mut names = Vec::new();
/// while scanner.scan() {
///     names.push(scanner.record()[0].to_string());
/// }
/// assert!(scanner.error().is_none());
/// assert_eq!(names, ["Alice", "Bob"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScannerBuilder {
    options: ScanOptions,
}

impl ScannerBuilder {
    /// Create a builder with default options: comma-delimited, no
    /// comments, the first record fixing the field count, strict quotes,
    /// no trimming, no record reuse, stop on the first error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of options.
    pub fn from_options(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Returns the options collected so far.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Keep scanning after an error instead of stopping.
    ///
    /// When false (the default) the first error makes [`Scanner::scan`]
    /// return false from then on. When true, `scan` returns true for a
    /// malformed record and [`Scanner::error`] describes it; scanning goes on
    /// until the end of input.
    pub fn continue_on_error(&mut self, yes: bool) -> &mut Self {
        self.options.continue_on_error = yes;
        self
    }

    /// Set the field delimiter. Must be ASCII and not `"`, `\r`, `\n` or NUL.
    pub fn comma(&mut self, comma: u8) -> &mut Self {
        self.options.dialect.comma = comma;
        self
    }

    /// Set the comment character. Records starting with it are skipped.
    pub fn comment(&mut self, comment: Option<u8>) -> &mut Self {
        self.options.dialect.comment = comment;
        self
    }

    /// Set field-count enforcement. Accepts a [`FieldsPerRecord`] or an
    /// integer: negative disables the check, zero lets the first record
    /// decide, positive requires exactly that many fields.
    pub fn fields_per_record<F: Into<FieldsPerRecord>>(&mut self, fields: F) -> &mut Self {
        self.options.dialect.fields_per_record = fields.into();
        self
    }

    /// Accept quotes inside unquoted fields and stray quotes inside quoted
    /// fields.
    pub fn lazy_quotes(&mut self, yes: bool) -> &mut Self {
        self.options.dialect.lazy_quotes = yes;
        self
    }

    /// Read every record into the same buffer.
    ///
    /// Saves an allocation per record. [`Scanner::record`] borrows the
    /// buffer, so the previous record cannot be held across a `scan`; use
    /// [`Scanner::take_record`] to keep one.
    pub fn reuse_record(&mut self, yes: bool) -> &mut Self {
        self.options.reuse_record = yes;
        self
    }

    /// Trim leading whitespace from every field, including whitespace in
    /// front of a quoted field's opening quote.
    pub fn trim_leading_space(&mut self, yes: bool) -> &mut Self {
        self.options.dialect.trim_leading_space = yes;
        self
    }

    /// Discard the first record. Same as `skip_records(1)`.
    pub fn skip_header_record(&mut self) -> &mut Self {
        self.skip_records(1)
    }

    /// Discard `count` more records when the scanner is built.
    ///
    /// Skipping is done with [`Scanner::scan`], so an error hit while
    /// skipping is recorded (and may stop the scanner) exactly as it would be
    /// later on.
    pub fn skip_records(&mut self, count: usize) -> &mut Self {
        self.options.skip_records = self.options.skip_records.saturating_add(count);
        self
    }

    /// Build a scanner over any [`Read`] stream.
    pub fn from_reader<R: Read>(&self, rdr: R) -> Scanner<CsvSource<R>> {
        self.from_source(CsvSource::new(rdr, self.options.dialect))
    }

    /// Build a scanner over the file at `path`.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Scanner<CsvSource<File>>> {
        let file = File::open(path.as_ref())?;
        Ok(self.from_reader(file))
    }

    /// Build a scanner over a custom record source.
    ///
    /// Dialect options do not apply; the source parses however it likes.
    pub fn from_source<S: RecordSource>(&self, source: S) -> Scanner<S> {
        let mut scanner = Scanner::with_policy(
            source,
            self.options.continue_on_error,
            self.options.reuse_record,
        );
        scanner.skip(self.options.skip_records);
        scanner
    }
}
