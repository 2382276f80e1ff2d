//! csv-scan CLI - scan CSV files record by record

use clap::Parser;
use csv_scan::{RecordSource, ScanError, Scanner, ScannerBuilder, decode_to_utf8};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

/// Scan CSV files record by record.
///
/// Prints every record, or re-emits the records as CSV, or counts them.
/// Malformed records are reported on stderr.
#[derive(Parser, Debug)]
#[command(name = "csv-scan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file(s) to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Field delimiter (single ASCII character)
    #[arg(short = 'd', long, default_value = ",")]
    delimiter: char,

    /// Comment character; records starting with it are skipped
    #[arg(short = 'c', long)]
    comment: Option<char>,

    /// Required fields per record: negative for any, 0 to follow the first record
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    fields_per_record: isize,

    /// Accept stray quotes instead of reporting them
    #[arg(long)]
    lazy_quotes: bool,

    /// Trim leading whitespace from every field
    #[arg(long)]
    trim_leading_space: bool,

    /// Read every record into the same buffer
    #[arg(long)]
    reuse_record: bool,

    /// Keep going after a malformed record
    #[arg(short = 'k', long)]
    continue_on_error: bool,

    /// Number of leading records to discard
    #[arg(short = 's', long, default_value = "0")]
    skip: usize,

    /// Discard the first record
    #[arg(long)]
    skip_header: bool,

    /// Decode non-UTF-8 input (UTF-16, Windows-125x, ...) before scanning
    #[arg(short = 't', long)]
    transcode: bool,

    /// Output format: text (default), csv, or count
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Count,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let builder = match build_options(&args) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut exit_code = ExitCode::SUCCESS;

    for file in &args.files {
        match scan_file(file, &builder, &args) {
            Ok(0) => {}
            Ok(errors) => {
                warn!(file = %file.display(), errors, "malformed records found");
                exit_code = ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", file.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn build_options(args: &Args) -> Result<ScannerBuilder, String> {
    let mut builder = ScannerBuilder::new();
    builder
        .comma(ascii_byte(args.delimiter, "delimiter")?)
        .fields_per_record(args.fields_per_record)
        .lazy_quotes(args.lazy_quotes)
        .trim_leading_space(args.trim_leading_space)
        .reuse_record(args.reuse_record)
        .continue_on_error(args.continue_on_error)
        .skip_records(args.skip);

    if let Some(c) = args.comment {
        builder.comment(Some(ascii_byte(c, "comment character")?));
    }
    if args.skip_header {
        builder.skip_header_record();
    }

    Ok(builder)
}

fn ascii_byte(c: char, what: &str) -> Result<u8, String> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(format!("{what} must be a single ASCII character, got {c:?}"))
    }
}

/// Scan one file, returning the number of malformed records reported.
fn scan_file(
    path: &Path,
    builder: &ScannerBuilder,
    args: &Args,
) -> Result<usize, Box<dyn std::error::Error>> {
    if args.transcode {
        let data = fs::read(path)?;
        let decoded = decode_to_utf8(&data);
        if decoded.was_transcoded() {
            info!(file = %path.display(), encoding = decoded.encoding.name(), "transcoded to UTF-8");
        }
        let scanner = builder.from_reader(&decoded.bytes[..]);
        return emit(path, scanner, args.format);
    }

    let scanner = builder.from_path(path)?;
    emit(path, scanner, args.format)
}

fn emit<S: RecordSource>(
    path: &Path,
    mut scanner: Scanner<S>,
    format: OutputFormat,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    let mut csv_out = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(io::stdout());
    let mut records = 0usize;
    let mut errors = 0usize;

    while scanner.scan() {
        if let Some(err) = scanner.error() {
            report(path, err);
            errors += 1;
            continue;
        }
        records += 1;
        match format {
            OutputFormat::Text => {
                let fields: Vec<&str> = scanner.record().iter().collect();
                writeln!(stdout, "{records}: {fields:?}")?;
            }
            OutputFormat::Csv => csv_out.write_record(scanner.record())?,
            OutputFormat::Count => {}
        }
    }

    // A false return with an error set means scanning stopped on it.
    if let Some(err) = scanner.error() {
        report(path, err);
        errors += 1;
    }

    csv_out.flush()?;
    if format == OutputFormat::Count {
        writeln!(stdout, "{}: {records}", path.display())?;
    }
    stdout.flush()?;

    Ok(errors)
}

fn report(path: &Path, err: &ScanError) {
    eprintln!("{}: {err}", path.display());
}
