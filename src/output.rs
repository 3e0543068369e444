use hound::{WavWriter, WavSpec, SampleFormat};
use std::path::Path;
use chrono::{DateTime, Local};

use crate::input::ChannelMode;
use crate::packer::PackedBuffer;

/// Write the packed sample words as-is, ready to load into a DAC buffer
pub fn write_raw<P: AsRef<Path>>(path: P, buffer: &PackedBuffer) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, buffer.as_bytes())?;
    Ok(())
}

/// Write the quantized lanes as 16-bit PCM WAV for inspection.
/// One WAV channel per lane: I, Q for mono; I1, Q1, I2, Q2 for dual.
pub fn write_preview_wav<P: AsRef<Path>>(
    path: P,
    buffer: &PackedBuffer,
    mode: ChannelMode,
    sample_rate: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = WavSpec {
        channels: mode.lanes() as u16,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for lane in buffer.lanes(mode) {
        writer.write_sample(lane)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Generate output filename for an encoded waveform
pub fn generate_filename(stem: &str, mode: ChannelMode, time: DateTime<Local>) -> String {
    let tag = match mode {
        ChannelMode::Mono => "mono",
        ChannelMode::Dual => "dual",
    };

    format!(
        "{}_{}_{}.bin",
        stem,
        tag,
        time.format("%Y-%m-%d_%H-%M-%S")
    )
}
