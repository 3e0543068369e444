use thiserror::Error;

/// Fatal errors from an encode call. No buffer is returned when one of these occurs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// File missing, unreadable, or a structured file with no usable records
    #[error("cannot open waveform file: {0}")]
    FileOpen(String),

    /// Text line that is not 2 or 4 numeric fields (line numbers are 1-based)
    #[error("unsupported line format at line {line}: {reason}")]
    UnsupportedLineFormat { line: usize, reason: String },

    /// Vectors of unequal length, or a record that is not a double vector
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Record count / complexity combination with no channel mapping
    #[error("unsupported vector layout: {0}")]
    UnsupportedLayout(String),

    #[error("cannot allocate {bytes} byte sample buffer")]
    AllocationFailure { bytes: usize },

    #[error("encode cancelled")]
    Cancelled,
}

impl EncodeError {
    pub(crate) fn line(line: usize, reason: impl Into<String>) -> Self {
        EncodeError::UnsupportedLineFormat {
            line,
            reason: reason.into(),
        }
    }
}

/// Non-fatal amplitude diagnostics. Encoding continues and the buffer is still produced.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AmplitudeOutOfRange {
    #[error("DAC waveform samples exceed full scale (max |x| = {max_abs})")]
    ExceedsFullScale { max_abs: f64 },

    /// Autoscale has nothing to scale against; unity scale is used instead
    #[error("DAC waveform is all zero, autoscale undefined")]
    AllZero,

    /// Peak is too small for a finite autoscale factor; unity scale is used instead
    #[error("DAC waveform peak {max_abs} is too small to autoscale")]
    Underflow { max_abs: f64 },
}
