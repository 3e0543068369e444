use std::io::{BufRead, Read};

use log::debug;

use super::SampleLine;
use crate::amplitude::PeakTracker;
use crate::cancel::CancelFlag;
use crate::error::EncodeError;

/// Tag that identifies the text format on the first line
pub const TEXT_TAG: &[u8] = b"TEXT";

/// Longest accepted line in bytes, excluding the line terminator
pub const MAX_LINE_LEN: usize = 256;

const SEPARATORS: &[char] = &[',', ' ', '\t', '\r'];

/// Parsed `TEXT[U] [REPEAT n]` waveform
#[derive(Debug, Clone, PartialEq)]
pub struct TextWaveform {
    /// `TEXTU`: samples are pre-scaled to +/- 2047 and get a fixed gain
    pub unscaled: bool,
    /// Consecutive emissions of every data line
    pub repeat: u32,
    pub lines: Vec<SampleLine>,
    /// Largest |value| over every field of every line
    pub max_abs: f64,
}

impl TextWaveform {
    /// Packed size in bytes for a given word size
    pub fn byte_count(&self, word_bytes: usize) -> Option<usize> {
        self.lines
            .len()
            .checked_mul(word_bytes)?
            .checked_mul(self.repeat as usize)
    }
}

/// Parse a text waveform in a single forward pass.
/// Every data line is validated; the first bad line aborts the whole parse.
pub fn parse_text<R: BufRead>(mut reader: R, cancel: &CancelFlag) -> Result<TextWaveform, EncodeError> {
    let mut buf = Vec::new();

    let header = match read_line(&mut reader, &mut buf, 1)? {
        Some(line) => line,
        None => return Err(EncodeError::line(1, "empty file")),
    };
    let (unscaled, repeat) = parse_header(&header)?;
    debug!("Text waveform header: unscaled={}, repeat={}", unscaled, repeat);

    let mut lines = Vec::new();
    let mut peak = PeakTracker::new();
    let mut line_no = 1;

    loop {
        cancel.check()?;
        line_no += 1;
        let line = match read_line(&mut reader, &mut buf, line_no)? {
            Some(line) => line,
            None => break,
        };
        let sample = parse_sample_line(&line, line_no)?;
        peak.observe_all(sample.values().iter().copied());
        lines.push(sample);
    }

    if lines.is_empty() {
        return Err(EncodeError::line(2, "no sample lines after header"));
    }

    debug!("Parsed {} sample line(s), max |x| = {}", lines.len(), peak.max_abs());

    Ok(TextWaveform {
        unscaled,
        repeat,
        lines,
        max_abs: peak.max_abs(),
    })
}

/// Read one line without its terminator. Returns None at end of input.
/// At most `MAX_LINE_LEN + 2` bytes are consumed per call.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, line_no: usize) -> Result<Option<String>, EncodeError> {
    buf.clear();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64 + 2)
        .read_until(b'\n', buf)
        .map_err(|e| EncodeError::FileOpen(e.to_string()))?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.len() > MAX_LINE_LEN {
        return Err(EncodeError::line(
            line_no,
            format!("line is {} bytes, limit is {}", buf.len(), MAX_LINE_LEN),
        ));
    }

    match std::str::from_utf8(buf) {
        Ok(s) => Ok(Some(s.to_string())),
        Err(_) => Err(EncodeError::line(line_no, "line is not valid UTF-8")),
    }
}

/// Parse `TEXT[U] [REPEAT <n>]` into (unscaled, repeat)
fn parse_header(line: &str) -> Result<(bool, u32), EncodeError> {
    let rest = match line.strip_prefix("TEXT") {
        Some(rest) => rest,
        None => return Err(EncodeError::line(1, "missing TEXT tag")),
    };
    let (unscaled, rest) = match rest.strip_prefix('U') {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(EncodeError::line(1, format!("unknown header tag 'TEXT{}'", line[4..].trim_end())));
    }

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let repeat = match tokens.as_slice() {
        [] => 1,
        ["REPEAT", n] => match n.parse::<u32>() {
            Ok(0) => return Err(EncodeError::line(1, "REPEAT count must be at least 1")),
            Ok(n) => n,
            Err(_) => return Err(EncodeError::line(1, format!("invalid REPEAT count '{}'", n))),
        },
        _ => return Err(EncodeError::line(1, format!("unexpected header '{}'", rest.trim()))),
    };

    Ok((unscaled, repeat))
}

/// Parse `I1,Q1[,I2,Q2]`; fields are separated by runs of comma, space or tab
fn parse_sample_line(line: &str, line_no: usize) -> Result<SampleLine, EncodeError> {
    let mut values = [0.0f64; 4];
    let mut count = 0;

    for token in line.split(SEPARATORS).filter(|t| !t.is_empty()) {
        if count == values.len() {
            return Err(EncodeError::line(line_no, "more than 4 fields"));
        }
        match token.parse::<f64>() {
            Ok(v) if v.is_finite() => values[count] = v,
            _ => return Err(EncodeError::line(line_no, format!("'{}' is not a finite number", token))),
        }
        count += 1;
    }

    match count {
        2 => Ok(SampleLine::Pair([values[0], values[1]])),
        4 => Ok(SampleLine::Quad(values)),
        n => Err(EncodeError::line(line_no, format!("expected 2 or 4 fields, found {}", n))),
    }
}
