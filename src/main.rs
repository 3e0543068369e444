use clap::Parser;
use std::path::PathBuf;

use chrono::Local;
use dac_waveform::output::{generate_filename, write_preview_wav, write_raw};
use dac_waveform::{encode, ChannelMode};

/// Encode a TEXT or MATLAB waveform file into DAC sample words
#[derive(Parser, Debug)]
#[command(name = "dac-waveform")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input waveform file (TEXT or .mat)
    #[arg(value_name = "INPUT")]
    input_file: PathBuf,

    /// DAC channel mode: mono (32-bit words) or dual (64-bit words)
    #[arg(short, long, default_value = "mono")]
    mode: String,

    /// Output file for the packed sample words (default: timestamped name in the current directory)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also write a 16-bit WAV preview of the quantized lanes
    #[arg(long, value_name = "FILE")]
    wav: Option<PathBuf>,

    /// Sample rate recorded in the WAV preview (Hz)
    #[arg(short, long, default_value = "48000")]
    rate: u32,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    let mode: ChannelMode = match args.mode.parse() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("Encoding {} ({:?})", args.input_file.display(), mode);
    }

    let encoded = encode(&args.input_file, mode)?;

    for warning in &encoded.warnings {
        eprintln!("Warning: {}", warning);
    }

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => {
            let stem = args
                .input_file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "waveform".to_string());
            PathBuf::from(generate_filename(&stem, mode, Local::now()))
        }
    };

    write_raw(&output_path, &encoded.buffer)?;

    if let Some(wav_path) = &args.wav {
        write_preview_wav(wav_path, &encoded.buffer, mode, args.rate)?;
        if args.verbose {
            println!("Wrote preview: {}", wav_path.display());
        }
    }

    if args.verbose {
        println!(
            "Scale {:.4} (max |x| = {})",
            encoded.scale.scale, encoded.scale.max_abs
        );
    }

    println!(
        "Saved {} sample(s), {} bytes to {}",
        encoded.byte_count() / mode.word_bytes(),
        encoded.byte_count(),
        output_path.display()
    );

    Ok(())
}
