use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::amplitude::{analyze, PeakTracker, ScaleContext, ScalePolicy, UNSCALED_GAIN};
use crate::cancel::CancelFlag;
use crate::error::{AmplitudeOutOfRange, EncodeError};
use crate::input::text::TEXT_TAG;
use crate::input::{parse_text, read_vectors, ChannelMode, MatSource, VectorRecord, VectorSource, WaveformSource};
use crate::layout::resolve;
use crate::packer::{pack, pack_text, PackedBuffer};

/// Settings for one encode call
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub mode: ChannelMode,
    /// Raise to abort a running encode with `EncodeError::Cancelled`
    pub cancel: CancelFlag,
}

impl EncodeOptions {
    pub fn new(mode: ChannelMode) -> Self {
        Self {
            mode,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Successful encode: the packed buffer plus what was learned on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub buffer: PackedBuffer,
    pub scale: ScaleContext,
    pub warnings: Vec<AmplitudeOutOfRange>,
}

impl Encoded {
    pub fn byte_count(&self) -> usize {
        self.buffer.len()
    }
}

/// Encode a text or MAT waveform file into DAC sample words
pub fn encode<P: AsRef<Path>>(path: P, mode: ChannelMode) -> Result<Encoded, EncodeError> {
    encode_with(path, &EncodeOptions::new(mode))
}

/// Encode with explicit options
pub fn encode_with<P: AsRef<Path>>(path: P, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EncodeError::FileOpen(format!("{}: {}", path.display(), e)))?;
    let mut reader = BufReader::new(file);

    let is_text = {
        let head = reader
            .fill_buf()
            .map_err(|e| EncodeError::FileOpen(format!("{}: {}", path.display(), e)))?;
        if head.is_empty() {
            return Err(EncodeError::line(1, "empty file"));
        }
        head.starts_with(TEXT_TAG)
    };

    if is_text {
        debug!("{}: text waveform", path.display());
        encode_text(reader, options)
    } else {
        debug!("{}: trying MAT file", path.display());
        let mut source = MatSource::from_reader(reader)?;
        encode_structured(&mut source, options)
    }
}

/// Encode a text waveform from any buffered reader
pub fn encode_text<R: BufRead>(reader: R, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let waveform = parse_text(reader, &options.cancel)?;
    encode_source(&WaveformSource::Text(waveform), options)
}

/// Encode vectors from a structured source
pub fn encode_structured<S: VectorSource>(source: &mut S, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let set = read_vectors(source, options.mode.record_limit(), &options.cancel)?;
    debug!("Read {} vector(s), max |x| = {}", set.vectors.len(), set.max_abs);
    encode_vectors(&set.vectors, set.max_abs, options)
}

/// Scale and pack an already parsed waveform
pub fn encode_source(source: &WaveformSource, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    match source {
        WaveformSource::Text(waveform) => {
            let policy = if waveform.unscaled {
                ScalePolicy::Fixed(UNSCALED_GAIN)
            } else {
                ScalePolicy::Autoscale
            };
            let analysis = analyze(policy, waveform.max_abs);
            let buffer = pack_text(waveform, analysis.context.scale, options.mode, &options.cancel)?;
            Ok(Encoded {
                buffer,
                scale: analysis.context,
                warnings: analysis.warnings,
            })
        }
        WaveformSource::Structured { vectors } => {
            let mut peak = PeakTracker::new();
            for v in vectors {
                peak.observe_all(v.samples());
            }
            encode_vectors(vectors, peak.max_abs(), options)
        }
    }
}

fn encode_vectors(vectors: &[VectorRecord], max_abs: f64, options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    // Layout and lengths are checked before anything is allocated
    let channels = resolve(vectors)?;
    let analysis = analyze(ScalePolicy::AutoscaleFloored, max_abs);
    let buffer = pack(&channels, analysis.context.scale, options.mode, &options.cancel)?;
    Ok(Encoded {
        buffer,
        scale: analysis.context,
        warnings: analysis.warnings,
    })
}
