//! # dac-waveform
//!
//! Encode waveform files into fixed-point sample buffers for a 1- or
//! 2-channel DAC.
//!
//! Two input formats are accepted:
//!
//! ```text
//! TEXT[U] [REPEAT <n>]
//! <I1>,<Q1>[,<I2>,<Q2>]
//! ...
//! ```
//!
//! and MATLAB level-5 `.mat` files holding 1, 2 or 4 double vectors
//! (real or complex). Samples are scaled into 16-bit lanes and packed as
//! little-endian 32-bit (mono) or 64-bit (dual) words.
//!
//! ```text
//! encoder ── input::text ───────────────┐
//!        └── input::matlab ── layout ───┤
//!                                       ├── amplitude ── packer ── PackedBuffer
//! ```

pub mod amplitude;
pub mod cancel;
pub mod encoder;
pub mod error;
pub mod input;
pub mod layout;
pub mod output;
pub mod packer;

pub use amplitude::{ScaleContext, ScalePolicy};
pub use cancel::CancelFlag;
pub use encoder::{encode, encode_source, encode_structured, encode_text, encode_with, EncodeOptions, Encoded};
pub use error::{AmplitudeOutOfRange, EncodeError};
pub use input::{ChannelMode, SampleLine, TextWaveform, VectorRecord, WaveformSource};
pub use layout::ResolvedChannels;
pub use packer::{quantize, PackedBuffer};
