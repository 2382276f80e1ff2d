//! csv-scan: a scan-style cursor over the `csv` crate
//!
//! Wraps a CSV record reader in an "advance, then inspect" interface with a
//! configurable parsing dialect and error policy.
//!
//! # Quick Start
//!
//! ```
//! use csv_scan::Scanner;
//!
//! let data = "name,age\nAlice,30\nBob,25\n";
//! let mut scanner = Scanner::new(data.as_bytes());
//!
//! while scanner.scan() {
//!     println!("{:?}", scanner.record());
//! }
//! if let Some(err) = scanner.error() {
//!     eprintln!("stopped: {err}");
//! }
//! ```
//!
//! # Configuration
//!
//! Options are set on a [`ScannerBuilder`]. Setting an option twice keeps
//! the last value.
//!
//! ```
//! use csv_scan::{ParseErrorKind, ScannerBuilder};
//!
//! let data = "# exported 2024-01-01\nid;name\n1;a\n2\n3;c\n";
//! let mut scanner = ScannerBuilder::new()
//!     .comma(b';')
//!     .comment(Some(b'#'))
//!     .continue_on_error(true)
//!     .skip_header_record()
//!     .from_reader(data.as_bytes());
//!
//! let mut ids = Vec::new();
//! while scanner.scan() {
//!     match scanner.error().and_then(|e| e.as_parse()) {
//!         Some(err) => assert!(matches!(err.kind, ParseErrorKind::FieldCount { .. })),
//!         None => ids.push(scanner.record()[0].to_string()),
//!     }
//! }
//! assert_eq!(ids, ["1", "3"]);
//! ```
//!
//! # Errors
//!
//! `scan` never panics on bad input. A `false` return with
//! [`Scanner::error`] set means scanning stopped on that error; a `false`
//! return with no error is the end of input. Under the default policy the
//! first error stops the scanner for good.

mod dialect;
mod encoding;
mod error;
mod options;
mod quotes;
mod scanner;
mod source;

pub use dialect::{Dialect, FieldsPerRecord};
pub use error::{ParseError, ParseErrorKind, Result, ScanError};
pub use options::{ScanOptions, ScannerBuilder};
pub use scanner::{Records, Scanner};
pub use source::{CsvSource, RecordSource};

// Re-export for decoding input before scanning
pub use encoding::{Decoded, decode_to_utf8, is_utf8};
