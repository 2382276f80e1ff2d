//! Input decoding using chardetng and `encoding_rs`.
//!
//! The reader only yields UTF-8 fields. Input in another encoding can be
//! decoded up front with [`decode_to_utf8`] before it is scanned.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use simdutf8::basic::from_utf8;

/// Check if the given bytes are valid UTF-8.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (EF BB BF).
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(&[0xEF, 0xBB, 0xBF])
}

/// Skip the UTF-8 BOM if present and return the remaining data.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    if has_utf8_bom(data) { &data[3..] } else { data }
}

/// Input converted to UTF-8.
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    /// UTF-8 bytes, borrowed when no conversion was needed.
    pub bytes: Cow<'a, [u8]>,
    /// The encoding the input was read as.
    pub encoding: &'static Encoding,
}

impl Decoded<'_> {
    /// Returns true if the input had to be converted.
    pub fn was_transcoded(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }
}

/// Detect the encoding of `data` and decode it to UTF-8 if necessary.
///
/// UTF-16 is recognised by its BOM. Other encodings (Windows-1251,
/// Windows-1250, ISO-8859 variants, GBK, ...) are guessed by chardetng.
/// Valid UTF-8 is returned as-is.
pub fn decode_to_utf8(data: &[u8]) -> Decoded<'_> {
    if let Some((encoding, _)) = Encoding::for_bom(data)
        && (encoding == UTF_16LE || encoding == UTF_16BE)
    {
        return transcode(data, encoding);
    }

    if is_utf8(data) {
        return Decoded {
            bytes: Cow::Borrowed(data),
            encoding: UTF_8,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);

    // A UTF-8 guess for invalid UTF-8 leaves the bytes for the reader to reject.
    if encoding == UTF_8 {
        return Decoded {
            bytes: Cow::Borrowed(data),
            encoding,
        };
    }

    transcode(data, encoding)
}

fn transcode<'a>(data: &'a [u8], encoding: &'static Encoding) -> Decoded<'a> {
    let (decoded, _, _) = encoding.decode(data);
    Decoded {
        bytes: Cow::Owned(decoded.into_owned().into_bytes()),
        encoding,
    }
}
