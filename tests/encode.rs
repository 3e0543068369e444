use std::path::PathBuf;

use approx::assert_relative_eq;
use dac_waveform::packer::{compose_dual, compose_mono};
use dac_waveform::{encode, encode_with, quantize, AmplitudeOutOfRange, CancelFlag, ChannelMode, EncodeError, EncodeOptions};

fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("dac-waveform-it-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

/// Minimal MATLAB level-5 writer: uncompressed double arrays only
mod mat5 {
    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;
    const COMPLEX_FLAG: u32 = 0x0800;

    pub struct Var<'a> {
        pub name: &'a str,
        pub dims: [i32; 2],
        pub real: &'a [f64],
        pub imag: Option<&'a [f64]>,
    }

    fn element(out: &mut Vec<u8>, ty: u32, data: &[u8]) {
        out.extend_from_slice(&ty.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        while out.len() % 8 != 0 {
            out.push(0);
        }
    }

    fn doubles(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn file(vars: &[Var]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut text = b"MATLAB 5.0 MAT-file, written by dac-waveform tests".to_vec();
        text.resize(116, b' ');
        out.extend_from_slice(&text);
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&0x0100u16.to_le_bytes());
        out.extend_from_slice(b"IM");

        for var in vars {
            let mut body = Vec::new();
            let flags = MX_DOUBLE_CLASS | if var.imag.is_some() { COMPLEX_FLAG } else { 0 };
            let mut flag_bytes = flags.to_le_bytes().to_vec();
            flag_bytes.extend_from_slice(&0u32.to_le_bytes());
            element(&mut body, MI_UINT32, &flag_bytes);

            let dims: Vec<u8> = var.dims.iter().flat_map(|d| d.to_le_bytes()).collect();
            element(&mut body, MI_INT32, &dims);
            element(&mut body, MI_INT8, var.name.as_bytes());
            element(&mut body, MI_DOUBLE, &doubles(var.real));
            if let Some(imag) = var.imag {
                element(&mut body, MI_DOUBLE, &doubles(imag));
            }

            element(&mut out, MI_MATRIX, &body);
        }
        out
    }

    pub fn real<'a>(name: &'a str, data: &'a [f64]) -> Var<'a> {
        Var { name, dims: [1, data.len() as i32], real: data, imag: None }
    }

    pub fn complex<'a>(name: &'a str, re: &'a [f64], im: &'a [f64]) -> Var<'a> {
        Var { name, dims: [re.len() as i32, 1], real: re, imag: Some(im) }
    }
}

#[test]
fn text_repeat_mono() {
    let path = temp_file("repeat.txt", b"TEXT REPEAT 2\n100,200\n");
    let enc = encode(&path, ChannelMode::Mono).unwrap();

    let scale = 32767.0 / 200.0;
    assert_eq!(enc.byte_count(), 8);
    assert_relative_eq!(enc.scale.scale, scale);
    let word = compose_mono(quantize(scale, 100.0), quantize(scale, 200.0)).to_le_bytes();
    assert_eq!(&enc.buffer.as_bytes()[..4], &word);
    assert_eq!(&enc.buffer.as_bytes()[4..], &word);
}

#[test]
fn text_unscaled_dual() {
    let path = temp_file("unscaled.txt", b"TEXTU\n1,-1,2047,-2047\n3 4\n");
    let enc = encode(&path, ChannelMode::Dual).unwrap();

    assert_eq!(enc.scale.scale, 16.0);
    assert_eq!(enc.byte_count(), 16);
    let lanes: Vec<i16> = enc.buffer.lanes(ChannelMode::Dual).collect();
    assert_eq!(lanes, vec![16, -16, 32752, -32752, 48, 64, 48, 64]);
}

#[test]
fn text_bad_line_fails_whole_file() {
    let path = temp_file("bad.txt", b"TEXT\n1,2\n1,2,3\n4,5\n");
    let err = encode(&path, ChannelMode::Mono).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedLineFormat { line: 3, .. }));
}

#[test]
fn text_over_range_warns() {
    let path = temp_file("loud.txt", b"TEXT\n50000,0\n");
    let enc = encode(&path, ChannelMode::Mono).unwrap();
    assert_eq!(enc.warnings, vec![AmplitudeOutOfRange::ExceedsFullScale { max_abs: 50000.0 }]);
    assert_eq!(enc.buffer.lanes(ChannelMode::Mono).next(), Some(32767));
}

#[test]
fn missing_file() {
    let err = encode("/nonexistent/dac-waveform/input.txt", ChannelMode::Mono).unwrap_err();
    assert!(matches!(err, EncodeError::FileOpen(_)));
}

#[test]
fn empty_file() {
    let path = temp_file("empty.txt", b"");
    let err = encode(&path, ChannelMode::Mono).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedLineFormat { line: 1, .. }));
}

#[test]
fn unknown_binary_is_open_error() {
    let path = temp_file("junk.bin", &[0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]);
    let err = encode(&path, ChannelMode::Dual).unwrap_err();
    assert!(matches!(err, EncodeError::FileOpen(_)));
}

#[test]
fn cancelled_encode() {
    let path = temp_file("cancel.txt", b"TEXT\n1,2\n");
    let cancel = CancelFlag::new();
    cancel.cancel();
    let options = EncodeOptions::new(ChannelMode::Mono).with_cancel(cancel);
    assert_eq!(encode_with(&path, &options).unwrap_err(), EncodeError::Cancelled);
}

#[test]
fn mat_one_complex_broadcasts() {
    let re = [1.0, -0.5, 0.25];
    let im = [0.0, 0.5, -1.0];
    let path = temp_file("complex.mat", &mat5::file(&[mat5::complex("z", &re, &im)]));

    let enc = encode(&path, ChannelMode::Dual).unwrap();
    assert_eq!(enc.scale.scale, 32767.0);
    assert_eq!(enc.byte_count(), 3 * 8);

    for (n, word) in enc.buffer.words(ChannelMode::Dual).enumerate() {
        let i = quantize(32767.0, re[n]);
        let q = quantize(32767.0, im[n]);
        assert_eq!(word, compose_dual(i, q, i, q));
    }
}

#[test]
fn mat_one_complex_mono() {
    let re = [2.0, -4.0];
    let im = [1.0, 0.0];
    let path = temp_file("complex-mono.mat", &mat5::file(&[mat5::complex("z", &re, &im)]));

    let enc = encode(&path, ChannelMode::Mono).unwrap();
    assert_eq!(enc.byte_count(), 8);
    let lanes: Vec<i16> = enc.buffer.lanes(ChannelMode::Mono).collect();
    assert_eq!(lanes, vec![16384, 8192, -32767, 0]);
}

#[test]
fn mat_two_real_is_i_and_q() {
    let i = [100.0, 0.0];
    let q = [0.0, -100.0];
    let path = temp_file("iq.mat", &mat5::file(&[mat5::real("i", &i), mat5::real("q", &q)]));

    let enc = encode(&path, ChannelMode::Dual).unwrap();
    let lanes: Vec<i16> = enc.buffer.lanes(ChannelMode::Dual).collect();
    assert_eq!(lanes, vec![32767, 0, 32767, 0, 0, -32767, 0, -32767]);
}

#[test]
fn mat_four_real() {
    let v: Vec<[f64; 1]> = vec![[1.0], [2.0], [3.0], [4.0]];
    let names = ["i1", "q1", "i2", "q2"];
    let vars: Vec<_> = names
        .iter()
        .zip(&v)
        .map(|(name, data)| mat5::real(name, data))
        .collect();
    let path = temp_file("quad.mat", &mat5::file(&vars));

    let enc = encode(&path, ChannelMode::Dual).unwrap();
    let scale = 32767.0 / 4.0;
    let lanes: Vec<u16> = enc.buffer.lanes(ChannelMode::Dual).map(|l| l as u16).collect();
    assert_eq!(
        lanes,
        vec![quantize(scale, 1.0), quantize(scale, 2.0), quantize(scale, 3.0), quantize(scale, 4.0)]
    );
}

#[test]
fn mat_length_mismatch() {
    let a = [0.0; 10];
    let b = [0.0; 12];
    let path = temp_file("mismatch.mat", &mat5::file(&[mat5::real("i", &a), mat5::real("q", &b)]));
    let err = encode(&path, ChannelMode::Dual).unwrap_err();
    assert!(matches!(err, EncodeError::DimensionMismatch(_)));
}

#[test]
fn mat_matrix_rejected() {
    let data = [0.0; 6];
    let var = mat5::Var { name: "m", dims: [2, 3], real: &data, imag: None };
    let path = temp_file("matrix.mat", &mat5::file(&[var]));
    let err = encode(&path, ChannelMode::Dual).unwrap_err();
    assert!(matches!(err, EncodeError::DimensionMismatch(_)));
}

#[test]
fn mat_three_real_unsupported() {
    let d = [1.0, 2.0];
    let path = temp_file(
        "three.mat",
        &mat5::file(&[mat5::real("a", &d), mat5::real("b", &d), mat5::real("c", &d)]),
    );
    let err = encode(&path, ChannelMode::Dual).unwrap_err();
    assert!(matches!(err, EncodeError::UnsupportedLayout(_)));
}
