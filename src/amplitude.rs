use log::{debug, warn};

use crate::error::AmplitudeOutOfRange;

/// Largest magnitude representable in a signed 16-bit lane
pub const FULL_SCALE: f64 = 32767.0;

/// Gain for `TEXTU` files, whose samples are already within +/- 2047
pub const UNSCALED_GAIN: f64 = 16.0;

/// Scale used when autoscale has no amplitude to work with
pub const UNITY_SCALE: f64 = 1.0;

/// Running maximum of |x| over a stream of samples
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTracker {
    max_abs: f64,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite values are ignored
    pub fn observe(&mut self, v: f64) {
        let a = v.abs();
        if a.is_finite() && a > self.max_abs {
            self.max_abs = a;
        }
    }

    pub fn observe_all<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for v in values {
            self.observe(v);
        }
    }

    pub fn max_abs(&self) -> f64 {
        self.max_abs
    }
}

/// How the quantization scale is derived from the peak amplitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalePolicy {
    /// Constant gain regardless of amplitude
    Fixed(f64),
    /// `FULL_SCALE / max_abs`; an all-zero or vanishingly small waveform falls back to unity
    Autoscale,
    /// `FULL_SCALE / max(max_abs, 1.0)`
    AutoscaleFloored,
}

/// Resolved amplitude and quantization scale. `scale` is always > 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    pub max_abs: f64,
    pub scale: f64,
}

/// Result of amplitude analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleAnalysis {
    pub context: ScaleContext,
    pub warnings: Vec<AmplitudeOutOfRange>,
}

/// Derive the scale for a waveform whose peak magnitude is `max_abs`.
///
/// The full-scale warning compares the raw, pre-scale peak against
/// `FULL_SCALE` for every policy, fixed gain included.
pub fn analyze(policy: ScalePolicy, max_abs: f64) -> ScaleAnalysis {
    let mut warnings = Vec::new();

    let scale = match policy {
        ScalePolicy::Fixed(gain) => gain,
        ScalePolicy::Autoscale => {
            let scale = FULL_SCALE / max_abs;
            if max_abs <= 0.0 {
                warnings.push(AmplitudeOutOfRange::AllZero);
                UNITY_SCALE
            } else if !scale.is_finite() {
                // Peak so small that FULL_SCALE / max_abs overflows
                warnings.push(AmplitudeOutOfRange::Underflow { max_abs });
                UNITY_SCALE
            } else {
                scale
            }
        }
        ScalePolicy::AutoscaleFloored => FULL_SCALE / max_abs.max(1.0),
    };

    if max_abs > FULL_SCALE {
        warnings.push(AmplitudeOutOfRange::ExceedsFullScale { max_abs });
    }

    for w in &warnings {
        warn!("{}", w);
    }
    debug!("Scale: max_abs={}, scale={}", max_abs, scale);

    ScaleAnalysis {
        context: ScaleContext { max_abs, scale },
        warnings,
    }
}
