pub mod matlab;
pub mod text;

pub use matlab::{read_vectors, ElementClass, MatSource, MemorySource, VectorDescriptor, VectorSet, VectorSource};
pub use text::{parse_text, TextWaveform};

use std::str::FromStr;

/// DAC output path width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMode {
    /// One channel, 32-bit word per sample: I in the low lane, Q in the high lane
    #[default]
    Mono,
    /// Two channels, 64-bit word per sample: I1, Q1, I2, Q2 from low to high
    Dual,
}

impl ChannelMode {
    pub fn word_bytes(&self) -> usize {
        match self {
            ChannelMode::Mono => 4,
            ChannelMode::Dual => 8,
        }
    }

    /// 16-bit lanes per sample word
    pub fn lanes(&self) -> usize {
        self.word_bytes() / 2
    }

    /// Maximum number of structured records read for this mode
    pub fn record_limit(&self) -> usize {
        match self {
            ChannelMode::Mono => 1,
            ChannelMode::Dual => 4,
        }
    }
}

impl FromStr for ChannelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mono" | "1" => Ok(ChannelMode::Mono),
            "dual" | "2" => Ok(ChannelMode::Dual),
            _ => Err(format!("Invalid channel mode '{}'. Use: mono, dual", s)),
        }
    }
}

/// One data line of a text waveform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleLine {
    /// `I,Q`
    Pair([f64; 2]),
    /// `I1,Q1,I2,Q2`
    Quad([f64; 4]),
}

impl SampleLine {
    pub fn values(&self) -> &[f64] {
        match self {
            SampleLine::Pair(v) => v,
            SampleLine::Quad(v) => v,
        }
    }

    /// Lane values `[I1, Q1, I2, Q2]`; a pair is broadcast to both channels
    pub fn channels(&self) -> [f64; 4] {
        match *self {
            SampleLine::Pair([i, q]) => [i, q, i, q],
            SampleLine::Quad(v) => v,
        }
    }
}

/// One named 1-D vector read from a structured file
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub name: String,
    pub length: usize,
    pub is_complex: bool,
    pub real: Vec<f64>,
    pub imag: Option<Vec<f64>>,
}

impl VectorRecord {
    pub fn real(name: impl Into<String>, real: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            length: real.len(),
            is_complex: false,
            real,
            imag: None,
        }
    }

    pub fn complex(name: impl Into<String>, real: Vec<f64>, imag: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            length: real.len(),
            is_complex: true,
            real,
            imag: Some(imag),
        }
    }

    /// Every real and imaginary sample
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.real
            .iter()
            .chain(self.imag.iter().flatten())
            .copied()
    }
}

/// Parsed waveform, decided once by the format router
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformSource {
    Text(TextWaveform),
    Structured { vectors: Vec<VectorRecord> },
}
