use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crunch_codecs::{dispatch, DctCodec, DCT_MAGIC, HUFFMAN_MAGIC};
use crunch_core::{path as paths, Algorithm, Outcome};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "crunch",
    about = "Compress and decompress files with the Huffman, LZSS, and DCT codecs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file; the artifact is written next to the input
    Compress {
        /// Source file to compress
        input: PathBuf,
        /// Codec to use: huffman | lzss | dct
        #[arg(short, long, default_value = "huffman")]
        algo: String,
    },
    /// Decompress a previously compressed artifact
    Decompress {
        /// Compressed artifact (.huff, .lzss, or .dct)
        input: PathBuf,
        /// Codec that produced the artifact: huffman | lzss | dct
        #[arg(short, long, default_value = "huffman")]
        algo: String,
    },
    /// Compress a folder recursively (reserved; always fails)
    CompressFolder {
        /// Folder to compress
        folder: PathBuf,
        /// Codec to use: huffman | lzss | dct
        #[arg(short, long, default_value = "huffman")]
        algo: String,
    },
    /// Write a one-way JPEG preview of an image at fixed quality
    ///
    /// The preview has no matching decoder here; use `compress --algo dct`
    /// for the round-trippable coefficient format.
    Preview {
        /// Source image
        input: PathBuf,
    },
    /// Print what a compressed artifact's header says about it
    Inspect {
        /// Artifact to inspect
        file: PathBuf,
    },
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn algo_from_name(name: &str) -> anyhow::Result<Algorithm> {
    match name {
        "huffman" | "huff" | "h" => Ok(Algorithm::Huffman),
        "lzss" | "l" => Ok(Algorithm::Lzss),
        "dct" | "d" => Ok(Algorithm::Dct),
        other => anyhow::bail!("unknown codec '{}'. Valid options: huffman, lzss, dct", other),
    }
}

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn report(operation: &str, algo: Algorithm, outcome: &Outcome, output: &std::path::Path, elapsed_s: f64) -> anyhow::Result<()> {
    if !outcome.is_success() {
        anyhow::bail!("{} failed with code {}", operation, outcome.error);
    }
    eprintln!("  codec       : {}", algo.name());
    eprintln!("  bytes in    : {}", human_bytes(outcome.bytes_in as u64));
    eprintln!("  bytes out   : {}", human_bytes(outcome.bytes_out as u64));
    eprintln!("  ratio       : {:.3}", outcome.ratio());
    eprintln!("  output      : {}", output.display());
    eprintln!("  elapsed     : {:.3}s", elapsed_s);
    Ok(())
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_compress(input: PathBuf, algo_name: &str) -> anyhow::Result<()> {
    let algo = algo_from_name(algo_name)?;
    let t0 = Instant::now();
    let outcome = dispatch::compress_file(algo, &input);
    report(
        "compression",
        algo,
        &outcome,
        &paths::compressed_output(algo, &input),
        t0.elapsed().as_secs_f64(),
    )
}

fn run_decompress(input: PathBuf, algo_name: &str) -> anyhow::Result<()> {
    let algo = algo_from_name(algo_name)?;
    let t0 = Instant::now();
    let outcome = dispatch::decompress_file(algo, &input);
    report(
        "decompression",
        algo,
        &outcome,
        &paths::decompressed_output(algo, &input),
        t0.elapsed().as_secs_f64(),
    )
}

fn run_compress_folder(folder: PathBuf, algo_name: &str) -> anyhow::Result<()> {
    let algo = algo_from_name(algo_name)?;
    let outcome = dispatch::compress_folder(algo, &folder);
    // Reserved in the command surface; report the fixed failure honestly.
    anyhow::bail!("folder compression failed with code {}", outcome.error)
}

fn run_preview(input: PathBuf) -> anyhow::Result<()> {
    let t0 = Instant::now();
    let outcome: Outcome = DctCodec.compress_jpeg_preview(&input).into();
    report(
        "preview",
        Algorithm::Dct,
        &outcome,
        &paths::preview_output(&input),
        t0.elapsed().as_secs_f64(),
    )
}

fn run_inspect(file: PathBuf) -> anyhow::Result<()> {
    let data = std::fs::read(&file)?;
    println!("=== {} ({}) ===", file.display(), human_bytes(data.len() as u64));
    println!();

    if data.len() >= 10 && &data[..4] == HUFFMAN_MAGIC {
        let orig_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let symbol_count = u16::from_le_bytes([data[8], data[9]]);
        let table_bytes = symbol_count as usize * 5;
        println!("  format         : HUF1 (huffman)");
        println!("  original size  : {}", human_bytes(orig_size as u64));
        println!("  symbols        : {}", symbol_count);
        println!(
            "  bitstream      : {}",
            human_bytes(data.len().saturating_sub(10 + table_bytes) as u64)
        );
    } else if data.len() >= 9 && &data[..4] == DCT_MAGIC {
        let width = u16::from_le_bytes([data[4], data[5]]);
        let height = u16::from_le_bytes([data[6], data[7]]);
        let blocks_x = (width as usize).div_ceil(8);
        let blocks_y = (height as usize).div_ceil(8);
        println!("  format         : DCT1 (block-transform image)");
        println!("  dimensions     : {}x{}", width, height);
        println!("  channels       : {}", data[8]);
        println!("  blocks         : {} ({}x{})", blocks_x * blocks_y, blocks_x, blocks_y);
        println!(
            "  coefficients   : {} expected, {} present",
            human_bytes((blocks_x * blocks_y * 128) as u64),
            human_bytes(data.len().saturating_sub(9) as u64)
        );
    } else if data.starts_with(&[0xFF, 0xD8]) {
        println!("  format         : JPEG (one-way preview output, no decoder)");
    } else {
        println!("  format         : no recognizable header");
        println!("  note           : raw LZSS token streams carry no header");
    }
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress { input, algo } => run_compress(input, &algo),
        Commands::Decompress { input, algo } => run_decompress(input, &algo),
        Commands::CompressFolder { folder, algo } => run_compress_folder(folder, &algo),
        Commands::Preview { input } => run_preview(input),
        Commands::Inspect { file } => run_inspect(file),
    }
}
