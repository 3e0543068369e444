use crate::error::EncodeError;
use crate::input::VectorRecord;

/// The four logical streams the packer consumes, all of equal length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedChannels<'a> {
    pub re1: &'a [f64],
    pub im1: &'a [f64],
    pub re2: &'a [f64],
    pub im2: &'a [f64],
}

impl<'a> ResolvedChannels<'a> {
    pub fn len(&self) -> usize {
        self.re1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.re1.is_empty()
    }
}

/// Split a record into (real, imag) views; imag is None for real records
fn split_parts(v: &VectorRecord) -> (&[f64], Option<&[f64]>) {
    (v.real.as_slice(), v.imag.as_deref())
}

/// Map 1, 2 or 4 vectors onto (re1, im1, re2, im2).
///
/// | records       | re1   | im1   | re2   | im2   |
/// |---------------|-------|-------|-------|-------|
/// | 1 complex     | Re v0 | Im v0 | Re v0 | Im v0 |
/// | 2 complex     | Re v0 | Im v0 | Re v1 | Im v1 |
/// | 2 real        | v0    | v1    | v0    | v1    |
/// | 4 real        | v0    | v1    | v2    | v3    |
pub fn resolve(vectors: &[VectorRecord]) -> Result<ResolvedChannels<'_>, EncodeError> {
    check_lengths(vectors)?;

    let parts: Vec<_> = vectors.iter().map(split_parts).collect();
    let (re1, im1, re2, im2) = match parts.as_slice() {
        [(r0, Some(i0))] => (*r0, *i0, *r0, *i0),
        [(r0, Some(i0)), (r1, Some(i1))] => (*r0, *i0, *r1, *i1),
        [(v0, None), (v1, None)] => (*v0, *v1, *v0, *v1),
        [(v0, None), (v1, None), (v2, None), (v3, None)] => (*v0, *v1, *v2, *v3),
        _ => return Err(EncodeError::UnsupportedLayout(describe(vectors))),
    };

    Ok(ResolvedChannels { re1, im1, re2, im2 })
}

/// Every vector, real and imaginary parts included, must share one length
fn check_lengths(vectors: &[VectorRecord]) -> Result<(), EncodeError> {
    let first = match vectors.first() {
        Some(v) => v,
        None => return Err(EncodeError::UnsupportedLayout("no vectors".into())),
    };

    for v in vectors {
        let imag_len = v.imag.as_ref().map_or(v.real.len(), Vec::len);
        if v.length != first.length || v.real.len() != first.length || imag_len != first.length {
            return Err(EncodeError::DimensionMismatch(format!(
                "'{}' has {} samples, '{}' has {}",
                first.name, first.length, v.name, v.length
            )));
        }
    }
    Ok(())
}

fn describe(vectors: &[VectorRecord]) -> String {
    let kinds: Vec<&str> = vectors
        .iter()
        .map(|v| if v.is_complex { "complex" } else { "real" })
        .collect();
    format!("{} vector(s): [{}]", vectors.len(), kinds.join(", "))
}
