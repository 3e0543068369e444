use crate::cancel::CancelFlag;
use crate::error::EncodeError;
use crate::input::{ChannelMode, TextWaveform};
use crate::layout::ResolvedChannels;

/// Samples packed between cancellation checks
const CHUNK_SAMPLES: usize = 4096;

const LANE_MASK: u64 = 0xffff;

/// Quantize to a 16-bit two's complement lane: `round(v * scale)` modulo 2^16.
/// Out-of-range values wrap rather than clamp; NaN maps to 0.
pub fn quantize(scale: f64, v: f64) -> u16 {
    (v * scale).round().rem_euclid(65536.0) as u16
}

/// `(Q << 16) | I`
pub fn compose_mono(i: u16, q: u16) -> u32 {
    ((q as u32) << 16) | i as u32
}

/// `(Q2 << 48) | (I2 << 32) | (Q1 << 16) | I1`
pub fn compose_dual(i1: u16, q1: u16, i2: u16, q2: u16) -> u64 {
    ((q2 as u64) << 48) | ((i2 as u64) << 32) | ((q1 as u64) << 16) | i1 as u64
}

/// Extract lane `index` (0 = lowest) from a sample word
pub fn lane(word: u64, index: usize) -> u16 {
    ((word >> (16 * index)) & LANE_MASK) as u16
}

/// Little-endian DAC sample words, ready for a device buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedBuffer {
    bytes: Vec<u8>,
}

impl PackedBuffer {
    /// Reserve the whole buffer up front so a failed allocation leaves nothing behind
    pub fn with_capacity(bytes: usize) -> Result<Self, EncodeError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes)
            .map_err(|_| EncodeError::AllocationFailure { bytes })?;
        Ok(Self { bytes: buf })
    }

    /// Byte count
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Sample words widened to u64
    pub fn words(&self, mode: ChannelMode) -> impl Iterator<Item = u64> + '_ {
        self.bytes.chunks_exact(mode.word_bytes()).map(|chunk| {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            u64::from_le_bytes(word)
        })
    }

    /// Lanes of every word as signed values, lowest lane first
    pub fn lanes(&self, mode: ChannelMode) -> impl Iterator<Item = i16> + '_ {
        self.words(mode)
            .flat_map(move |w| (0..mode.lanes()).map(move |n| lane(w, n) as i16))
    }

    /// Append one sample word built from `[I1, Q1, I2, Q2]`; Mono ignores channel 2
    fn push(&mut self, mode: ChannelMode, scale: f64, v: [f64; 4]) {
        match mode {
            ChannelMode::Mono => {
                let word = compose_mono(quantize(scale, v[0]), quantize(scale, v[1]));
                self.bytes.extend_from_slice(&word.to_le_bytes());
            }
            ChannelMode::Dual => {
                let word = compose_dual(
                    quantize(scale, v[0]),
                    quantize(scale, v[1]),
                    quantize(scale, v[2]),
                    quantize(scale, v[3]),
                );
                self.bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
    }
}

fn buffer_size(samples: usize, mode: ChannelMode) -> Result<usize, EncodeError> {
    samples
        .checked_mul(mode.word_bytes())
        .ok_or(EncodeError::AllocationFailure { bytes: usize::MAX })
}

/// Pack resolved channel streams into `len * word_bytes` bytes
pub fn pack(channels: &ResolvedChannels<'_>, scale: f64, mode: ChannelMode, cancel: &CancelFlag) -> Result<PackedBuffer, EncodeError> {
    let n = channels.len();
    let mut buf = PackedBuffer::with_capacity(buffer_size(n, mode)?)?;

    for i in 0..n {
        if i % CHUNK_SAMPLES == 0 {
            cancel.check()?;
        }
        buf.push(
            mode,
            scale,
            [channels.re1[i], channels.im1[i], channels.re2[i], channels.im2[i]],
        );
    }

    Ok(buf)
}

/// Pack text lines, each emitted `repeat` times in a row.
/// In Dual mode a two-field line fills both channels with the same pair.
pub fn pack_text(waveform: &TextWaveform, scale: f64, mode: ChannelMode, cancel: &CancelFlag) -> Result<PackedBuffer, EncodeError> {
    let bytes = waveform
        .byte_count(mode.word_bytes())
        .ok_or(EncodeError::AllocationFailure { bytes: usize::MAX })?;
    let mut buf = PackedBuffer::with_capacity(bytes)?;

    let mut emitted = 0usize;
    for line in &waveform.lines {
        let values = line.channels();
        for _ in 0..waveform.repeat {
            if emitted % CHUNK_SAMPLES == 0 {
                cancel.check()?;
            }
            buf.push(mode, scale, values);
            emitted += 1;
        }
    }

    Ok(buf)
}
