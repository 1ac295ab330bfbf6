use clap::{Parser, Subcommand};
use sqsh::error::SqshError;
use sqsh::frame::ChecksumMode;
use sqsh::{codec::CodecId, pipeline};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sqsh", version = "1.0.0", about = "A lossless byte-stream compressor/decompressor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress input into a SQSH stream
    Enc {
        /// Codec pipeline, e.g. RLE-HUFFMAN. Applied left-to-right on encode.
        #[arg(short = 'c', long = "codec")]
        codec: String,
        /// Block size, e.g. 256KiB, 1MiB, 4096B, 64KB (default 1MiB)
        #[arg(long = "blocksize", default_value = "1MiB")]
        blocksize: String,
        /// Checksum mode: "" (none), "u" (uncompressed), "c" (compressed), "uc" (both)
        #[arg(long = "checksum", default_value = "")]
        checksum: String,
        /// Output path, or "-" for stdout
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: String,
        /// Print a per-block trace line (codec chain, sizes) to stderr
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
        /// Input path, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Decompress a SQSH stream into the original bytes
    Dec {
        /// Output path, or "-" for stdout
        #[arg(short = 'o', long = "output", default_value = "-")]
        output: String,
        /// Print a per-block trace line (codec chain, sizes) to stderr
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
        /// Input path, or "-" for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

/// Go's `flag` package accepts single-dash long options (`-codec`, not
/// `--codec`); clap only parses those as double-dash. Rewrite argv so the
/// known long option names are accepted with either one or two dashes.
fn normalize_args(args: Vec<String>) -> Vec<String> {
    const LONG_FLAGS: &[&str] = &["codec", "blocksize", "checksum", "output", "verbose"];
    args.into_iter()
        .map(|arg| {
            for &flag in LONG_FLAGS {
                if arg == format!("-{flag}") {
                    return format!("--{flag}");
                }
            }
            arg
        })
        .collect()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            eprintln!("sqsh: {err}");
            let code = err.exit_code();
            ExitCode::from(code as u8)
        }
    }
}

fn run() -> sqsh::Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args().collect()));
    match cli.command {
        Commands::Enc {
            codec,
            blocksize,
            checksum,
            output,
            verbose,
            input,
        } => run_enc(&codec, &blocksize, &checksum, &output, verbose, &input),
        Commands::Dec { output, verbose, input } => run_dec(&output, verbose, &input),
    }
}

fn parse_codec_pipeline(s: &str) -> sqsh::Result<Vec<CodecId>> {
    s.split('-')
        .map(CodecId::from_name)
        .collect()
}

/// Parses block sizes of the form `<N><unit>` where unit is one of
/// `B`, `KB`, `MB`, `KiB`, `MiB`.
fn parse_blocksize(s: &str) -> sqsh::Result<usize> {
    const UNITS: &[(&str, usize)] = &[
        ("KiB", 1 << 10),
        ("MiB", 1 << 20),
        ("KB", 1000),
        ("MB", 1_000_000),
        ("B", 1),
    ];
    for &(suffix, magnitude) in UNITS {
        if let Some(prefix) = s.strip_suffix(suffix) {
            let value: usize = prefix
                .parse()
                .map_err(|_| SqshError::Usage(format!("invalid -blocksize value {s:?}")))?;
            return Ok(value * magnitude);
        }
    }
    Err(SqshError::Usage(format!(
        "invalid -blocksize value {s:?}: expected a number followed by B, KB, MB, KiB, or MiB"
    )))
}

fn open_input(path: &str) -> sqsh::Result<Box<dyn Read>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &str) -> sqsh::Result<Box<dyn Write>> {
    if path == "-" {
        Ok(Box::new(BufWriter::new(io::stdout())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

fn run_enc(
    codec: &str,
    blocksize: &str,
    checksum: &str,
    output: &str,
    verbose: bool,
    input: &str,
) -> sqsh::Result<()> {
    let codec_chain = parse_codec_pipeline(codec)?;
    let block_size = parse_blocksize(blocksize)?;
    let checksum_mode = ChecksumMode::from_flag_str(checksum)?;

    let mut src = open_input(input)?;
    let mut sink = open_output(output)?;
    pipeline::encode_verbose(&mut src, &mut sink, &codec_chain, block_size, checksum_mode, verbose)?;
    sink.flush().map_err(SqshError::Io)?;
    Ok(())
}

fn run_dec(output: &str, verbose: bool, input: &str) -> sqsh::Result<()> {
    let mut src = open_input(input)?;
    let mut sink = open_output(output)?;
    pipeline::decode_verbose(&mut src, &mut sink, verbose)?;
    sink.flush().map_err(SqshError::Io)?;
    Ok(())
}
