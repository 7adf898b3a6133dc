use thiserror::Error;

/// Fatal decode/encode failures. Anything recoverable is reported as a
/// [`DecodeWarning`] instead.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid LAS signature {found:?}, expected \"LASF\"")]
    BadSignature { found: [u8; 4] },

    #[error("buffer truncated reading {context}: need {needed} bytes, {available} available")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("unsupported LAS version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("malformed header: {0}")]
    InvalidHeader(String),

    #[error("unsupported point record format {0}")]
    UnsupportedFormat(u8),

    #[error(
        "point record length {found} is smaller than the {expected}-byte layout of format {format}"
    )]
    RecordLengthMismatch { format: u8, expected: u16, found: u16 },

    #[error("point format {0} cannot be written")]
    UnwritableFormat(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A non-fatal problem encountered while decoding. Warnings are returned in
/// file order alongside the successful result; the caller decides whether to
/// surface them.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeWarning {
    /// Index of the offending point record, if the warning concerns one.
    pub record_index: Option<u64>,
    pub message: String,
}

impl DecodeWarning {
    pub fn file_level(message: impl Into<String>) -> Self {
        DecodeWarning {
            record_index: None,
            message: message.into(),
        }
    }

    pub fn for_record(index: u64, message: impl Into<String>) -> Self {
        DecodeWarning {
            record_index: Some(index),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.record_index {
            Some(index) => write!(f, "record {}: {}", index, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
