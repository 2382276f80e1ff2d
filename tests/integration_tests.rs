//! Integration tests for csv-scan

use csv_scan::{
    FieldsPerRecord, ParseErrorKind, RecordSource, ScanError, Scanner, ScannerBuilder,
    decode_to_utf8,
};
use std::io::{self, Read, Write};
use tempfile::NamedTempFile;

fn fields<S>(scanner: &Scanner<S>) -> Vec<&str> {
    scanner.record().iter().collect()
}

/// Scan to the end, collecting records and the errors seen along the way.
fn drain<S: RecordSource>(scanner: &mut Scanner<S>) -> (Vec<Vec<String>>, Vec<ParseErrorKind>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    while scanner.scan() {
        match scanner.error() {
            Some(err) => errors.push(err.as_parse().expect("parse error").kind),
            None => records.push(fields(scanner).iter().map(|f| f.to_string()).collect()),
        }
    }
    (records, errors)
}

#[test]
fn test_well_formed_input_scans_every_record() {
    let data = "name,age,city\nAlice,30,New York\nBob,25,Los Angeles\nCharlie,35,Chicago\n";
    let mut scanner = Scanner::new(data.as_bytes());

    let mut trues = 0;
    while scanner.scan() {
        trues += 1;
    }

    assert_eq!(trues, 4);
    assert!(scanner.error().is_none());
    assert!(!scanner.is_halted());
}

#[test]
fn test_stop_on_malformed_record() {
    let data = "a,b\nc,d\ne\"f,g\nh,i\n";
    let mut scanner = Scanner::new(data.as_bytes());

    assert!(scanner.scan());
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["c", "d"]);

    assert!(!scanner.scan());
    let err = scanner.error().and_then(ScanError::as_parse).unwrap();
    assert_eq!(err.kind, ParseErrorKind::BareQuote);
    assert_eq!(err.line, 3);

    // Record 4 is never observed.
    assert!(!scanner.scan());
    assert!(scanner.error().is_some());
    assert_eq!(fields(&scanner), ["c", "d"]);
}

#[test]
fn test_continue_past_malformed_record() {
    let data = "a,b\nc,d\ne\"f,g\nh,i\n";
    let mut scanner = ScannerBuilder::new()
        .continue_on_error(true)
        .from_reader(data.as_bytes());

    assert!(scanner.scan());
    assert!(scanner.scan());
    assert!(scanner.scan());
    assert!(matches!(
        scanner.error().and_then(ScanError::as_parse).map(|e| e.kind),
        Some(ParseErrorKind::BareQuote)
    ));
    assert!(scanner.scan());
    assert!(scanner.error().is_none());
    assert_eq!(fields(&scanner), ["h", "i"]);

    assert!(!scanner.scan());
    assert!(scanner.error().is_none());
}

#[test]
fn test_skip_records_matches_manual_scans() {
    let data = "h1,h2\n1,2\n3,4\n5,6\n";

    let mut skipped = ScannerBuilder::new()
        .skip_records(2)
        .from_reader(data.as_bytes());

    let mut manual = Scanner::new(data.as_bytes());
    manual.scan();
    manual.scan();

    let (skipped_records, _) = drain(&mut skipped);
    let (manual_records, _) = drain(&mut manual);
    assert_eq!(skipped_records, manual_records);
    assert_eq!(skipped_records, [["3", "4"], ["5", "6"]]);
}

#[test]
fn test_skip_header_record_is_skip_one() {
    let data = "id,name\n1,a\n2,b\n";

    let mut header = ScannerBuilder::new()
        .skip_header_record()
        .from_reader(data.as_bytes());
    let mut one = ScannerBuilder::new()
        .skip_records(1)
        .from_reader(data.as_bytes());

    assert_eq!(drain(&mut header), drain(&mut one));
}

#[test]
fn test_skip_propagates_errors() {
    let data = "a,\"b\nc,d\n";
    let mut scanner = ScannerBuilder::new()
        .skip_header_record()
        .from_reader(data.as_bytes());

    assert!(scanner.is_halted());
    assert!(!scanner.scan());
    let err = scanner.error().and_then(ScanError::as_parse).unwrap();
    assert_eq!(err.kind, ParseErrorKind::Quote);
}

#[test]
fn test_skip_past_end_of_input() {
    let mut scanner = ScannerBuilder::new()
        .skip_records(5)
        .from_reader(&b"a\nb\n"[..]);

    assert!(!scanner.scan());
    assert!(scanner.error().is_none());
}

#[test]
fn test_custom_delimiter() {
    let mut scanner = ScannerBuilder::new()
        .comma(b';')
        .from_reader(&b"a;b;c\n"[..]);
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["a", "b", "c"]);

    let mut scanner = Scanner::new(&b"a;b;c\n"[..]);
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["a;b;c"]);
}

#[test]
fn test_first_record_sets_field_count() {
    let data = "a,b,c\n1,2\n3,4,5\n";

    let mut scanner = Scanner::new(data.as_bytes());
    assert!(scanner.scan());
    assert!(!scanner.scan());
    let err = scanner.error().and_then(ScanError::as_parse).unwrap();
    assert_eq!(err.kind, ParseErrorKind::FieldCount { expected: 3, found: 2 });
    assert_eq!(err.line, 2);

    let mut scanner = ScannerBuilder::new()
        .continue_on_error(true)
        .from_reader(data.as_bytes());
    assert!(scanner.scan());
    assert!(scanner.scan());
    assert!(scanner.error().is_some());
    // The mismatched record is still readable.
    assert_eq!(fields(&scanner), ["1", "2"]);
    assert!(scanner.scan());
    assert!(scanner.error().is_none());
}

#[test]
fn test_exact_and_unchecked_field_counts() {
    let data = "a,b\n1,2,3\n4\n";

    let mut scanner = ScannerBuilder::new()
        .fields_per_record(3)
        .continue_on_error(true)
        .from_reader(data.as_bytes());
    let (records, errors) = drain(&mut scanner);
    assert_eq!(records, [["1", "2", "3"]]);
    assert_eq!(errors.len(), 2);

    let mut scanner = ScannerBuilder::new()
        .fields_per_record(FieldsPerRecord::Unchecked)
        .from_reader(data.as_bytes());
    let (records, errors) = drain(&mut scanner);
    assert_eq!(records.len(), 3);
    assert!(errors.is_empty());
    assert!(scanner.error().is_none());
}

#[test]
fn test_reuse_record_reads_into_same_buffer() {
    let mut scanner = ScannerBuilder::new()
        .reuse_record(true)
        .from_reader(&b"abc,def\nghi,jkl\n"[..]);

    assert!(scanner.scan());
    let before = scanner.record().as_slice().as_ptr();
    assert!(scanner.scan());
    let after = scanner.record().as_slice().as_ptr();

    assert_eq!(before, after);
    assert_eq!(fields(&scanner), ["ghi", "jkl"]);
}

#[test]
fn test_take_record_keeps_an_owned_copy() {
    let mut scanner = ScannerBuilder::new()
        .reuse_record(true)
        .from_reader(&b"a,b\nc,d\n"[..]);

    assert!(scanner.scan());
    let first = scanner.take_record();
    assert!(scanner.scan());

    assert_eq!(first.iter().collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(fields(&scanner), ["c", "d"]);
}

#[test]
fn test_comment_lines() {
    let data = "# generated\na,b\n# mid\nc,d\n";
    let mut scanner = ScannerBuilder::new()
        .comment(Some(b'#'))
        .from_reader(data.as_bytes());

    let (records, errors) = drain(&mut scanner);
    assert_eq!(records, [["a", "b"], ["c", "d"]]);
    assert!(errors.is_empty());
}

#[test]
fn test_lazy_quotes() {
    let data = "a\"b,c\n\"d\"e,f\n";

    let mut strict = Scanner::new(data.as_bytes());
    assert!(!strict.scan());
    assert!(strict.error().is_some());

    let mut lazy = ScannerBuilder::new()
        .lazy_quotes(true)
        .from_reader(data.as_bytes());
    assert!(lazy.scan());
    assert_eq!(fields(&lazy), ["a\"b", "c"]);
    assert!(lazy.scan());
    assert_eq!(fields(&lazy)[1], "f");
    assert!(!lazy.scan());
    assert!(lazy.error().is_none());
}

#[test]
fn test_trim_leading_space() {
    let data = "  a,  b\n c, \"d\"\n";

    let mut scanner = ScannerBuilder::new()
        .trim_leading_space(true)
        .from_reader(data.as_bytes());
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["a", "b"]);
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["c", "d"]);

    let mut untrimmed = Scanner::new(&b"  a,  b\n"[..]);
    assert!(untrimmed.scan());
    assert_eq!(fields(&untrimmed), ["  a", "  b"]);
}

#[test]
fn test_trim_leaves_quoted_contents_alone() {
    let mut scanner = ScannerBuilder::new()
        .trim_leading_space(true)
        .from_reader(&b"\"  a\",b\n  \"  c\", d\n"[..]);

    let (records, errors) = drain(&mut scanner);
    assert_eq!(records, [["  a", "b"], ["  c", "d"]]);
    assert!(errors.is_empty());
    assert!(scanner.error().is_none());
}

#[test]
fn test_trim_before_quoted_field_with_delimiter() {
    let data = "x,y\na, \"b,c\"\nd, \"e\nf\"\n";
    let mut scanner = ScannerBuilder::new()
        .trim_leading_space(true)
        .from_reader(data.as_bytes());

    let (records, errors) = drain(&mut scanner);
    assert_eq!(records, [["x", "y"], ["a", "b,c"], ["d", "e\nf"]]);
    assert!(errors.is_empty());
    assert!(scanner.error().is_none());
}

#[test]
fn test_trim_unicode_space_before_quote() {
    let data = "a,\u{a0}\"b\"\n";

    let mut trimmed = ScannerBuilder::new()
        .trim_leading_space(true)
        .from_reader(data.as_bytes());
    assert!(trimmed.scan());
    assert_eq!(fields(&trimmed), ["a", "b"]);

    let mut strict = Scanner::new(data.as_bytes());
    assert!(!strict.scan());
    assert!(matches!(
        strict.error().and_then(ScanError::as_parse).map(|e| e.kind),
        Some(ParseErrorKind::BareQuote)
    ));
}

#[test]
fn test_crlf_error_location() {
    let mut scanner = Scanner::new(&b"a,b\r\nc,d\"e\r\n"[..]);

    assert!(scanner.scan());
    assert!(!scanner.scan());
    let err = scanner.error().and_then(ScanError::as_parse).unwrap();
    assert_eq!(err.start_line, 2);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 4);
    assert_eq!(
        err.to_string(),
        "parse error on line 2, column 4: bare \" in non-quoted-field"
    );
}

#[test]
fn test_crlf_field_count_location() {
    let mut scanner = Scanner::new(&b"a,b\r\nc\r\n"[..]);

    assert!(scanner.scan());
    assert!(!scanner.scan());
    let err = scanner.error().and_then(ScanError::as_parse).unwrap();
    assert_eq!(err.kind, ParseErrorKind::FieldCount { expected: 2, found: 1 });
    assert_eq!(err.line, 2);
}

#[test]
fn test_first_clean_record_sets_field_count() {
    // The first record fails its quote check, so the second one fixes the
    // expected count.
    let data = "\"a\"x,b,c\n1,2\n3,4\n5,6,7\n";
    let mut scanner = ScannerBuilder::new()
        .continue_on_error(true)
        .from_reader(data.as_bytes());

    let (records, errors) = drain(&mut scanner);
    assert_eq!(records, [["1", "2"], ["3", "4"]]);
    assert_eq!(
        errors,
        [
            ParseErrorKind::Quote,
            ParseErrorKind::FieldCount { expected: 2, found: 3 }
        ]
    );
}

#[test]
fn test_multiline_quoted_field() {
    let data = "id,note\n1,\"line one\nline two\"\n2,plain\n";
    let mut scanner = Scanner::new(data.as_bytes());

    assert!(scanner.scan());
    assert!(scanner.scan());
    assert_eq!(fields(&scanner), ["1", "line one\nline two"]);
    assert_eq!(scanner.position().map(|p| p.line()), Some(2));
    assert!(scanner.scan());
    assert_eq!(scanner.position().map(|p| p.line()), Some(4));
}

#[test]
fn test_invalid_dialect_is_fatal() {
    let mut scanner = ScannerBuilder::new()
        .comma(b'"')
        .continue_on_error(true)
        .from_reader(&b"a,b\n"[..]);

    assert!(!scanner.scan());
    assert!(matches!(scanner.error(), Some(ScanError::InvalidDialect(_))));
    assert!(scanner.is_halted());
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "stream reset"))
    }
}

#[test]
fn test_io_failure_passthrough() {
    let mut scanner = Scanner::new(FailingReader);
    assert!(!scanner.scan());
    match scanner.error() {
        Some(ScanError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("expected IO error, got {other:?}"),
    }

    let mut scanner = ScannerBuilder::new()
        .continue_on_error(true)
        .from_reader(FailingReader);
    assert!(scanner.scan());
    assert!(matches!(scanner.error(), Some(ScanError::Io(_))));
}

#[test]
fn test_records_iterator_collects_owned_records() {
    let mut scanner = Scanner::new(&b"a,b\nc,d\n"[..]);
    let records: Result<Vec<_>, _> = scanner.records().collect();
    let records = records.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[1][0], "c");

    let mut scanner = Scanner::new(&b"a,b\nc\nd,e\n"[..]);
    let results: Vec<_> = scanner.records().collect();
    assert_eq!(results.len(), 2);
    assert!(results[1].is_err());
    assert!(!scanner.scan());
}

#[test]
fn test_scan_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "name,age,city").unwrap();
    writeln!(temp_file, "Alice,30,NYC").unwrap();
    writeln!(temp_file, "Bob,25,LA").unwrap();
    temp_file.flush().unwrap();

    let mut scanner = ScannerBuilder::new()
        .skip_header_record()
        .from_path(temp_file.path())
        .unwrap();
    let (records, errors) = drain(&mut scanner);

    assert_eq!(records, [["Alice", "30", "NYC"], ["Bob", "25", "LA"]]);
    assert!(errors.is_empty());
}

#[test]
fn test_missing_file() {
    let result = ScannerBuilder::new().from_path("/definitely/not/here.csv");
    assert!(matches!(result, Err(ScanError::Io(_))));
}

#[test]
fn test_into_inner_hands_back_stream() {
    let data = b"a,b\n";
    let mut scanner = Scanner::new(&data[..]);
    assert!(scanner.scan());
    let rest: &[u8] = scanner.into_inner().into_inner();
    assert!(rest.is_empty());
}

#[test]
fn test_transcoded_input() {
    // "имя;город" in Windows-1251
    let data: &[u8] = &[0xE8, 0xEC, 0xFF, b';', 0xE3, 0xEE, 0xF0, 0xEE, 0xE4, b'\n'];

    let mut raw = ScannerBuilder::new().comma(b';').from_reader(data);
    assert!(!raw.scan());
    assert!(matches!(
        raw.error().and_then(ScanError::as_parse).map(|e| e.kind),
        Some(ParseErrorKind::Utf8 { .. })
    ));

    let decoded = decode_to_utf8(data);
    let mut scanner = ScannerBuilder::new().comma(b';').from_reader(&decoded.bytes[..]);
    assert!(scanner.scan());
    assert_eq!(scanner.record().len(), 2);
}
