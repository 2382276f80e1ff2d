use std::fmt;

/// Quote character recognised by the reader.
pub(crate) const QUOTE: u8 = b'"';

/// Parsing rules handed to the CSV reader.
///
/// A dialect is fixed once a scanner is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter.
    pub comma: u8,
    /// Records starting with this byte are skipped entirely.
    pub comment: Option<u8>,
    /// Field-count enforcement.
    pub fields_per_record: FieldsPerRecord,
    /// Accept quotes that strict quoting would reject.
    pub lazy_quotes: bool,
    /// Trim leading whitespace from every field.
    pub trim_leading_space: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            comma: b',',
            comment: None,
            fields_per_record: FieldsPerRecord::FirstRecord,
            lazy_quotes: false,
            trim_leading_space: false,
        }
    }
}

impl Dialect {
    /// Check that the reader can use this dialect.
    ///
    /// Returns a description of the problem if it cannot.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_delimiter(self.comma) {
            return Err(format!("invalid delimiter {:?}", self.comma as char));
        }
        if let Some(comment) = self.comment {
            if !is_valid_delimiter(comment) {
                return Err(format!("invalid comment character {:?}", comment as char));
            }
            if comment == self.comma {
                return Err(format!(
                    "comment character and delimiter are both {:?}",
                    comment as char
                ));
            }
        }
        Ok(())
    }
}

fn is_valid_delimiter(b: u8) -> bool {
    b.is_ascii() && !matches!(b, 0 | QUOTE | b'\r' | b'\n')
}

/// How many fields each record must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldsPerRecord {
    /// Records may have any number of fields.
    Unchecked,
    /// Every record must match the field count of the first record read
    /// without a quoting or encoding error.
    #[default]
    FirstRecord,
    /// Every record must have exactly this many fields.
    Exactly(usize),
}

impl FieldsPerRecord {
    /// Returns the fixed field count, if there is one.
    pub fn exact(&self) -> Option<usize> {
        match self {
            FieldsPerRecord::Exactly(n) => Some(*n),
            _ => None,
        }
    }
}

/// Negative means unchecked, zero means the first record decides, and a
/// positive count is enforced exactly.
impl From<isize> for FieldsPerRecord {
    fn from(n: isize) -> Self {
        match n {
            n if n < 0 => FieldsPerRecord::Unchecked,
            0 => FieldsPerRecord::FirstRecord,
            n => FieldsPerRecord::Exactly(n.unsigned_abs()),
        }
    }
}

impl From<i32> for FieldsPerRecord {
    fn from(n: i32) -> Self {
        FieldsPerRecord::from(n as isize)
    }
}

impl fmt::Display for FieldsPerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldsPerRecord::Unchecked => write!(f, "unchecked"),
            FieldsPerRecord::FirstRecord => write!(f, "first record"),
            FieldsPerRecord::Exactly(n) => write!(f, "exactly {n}"),
        }
    }
}
