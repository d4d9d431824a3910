use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use textpack::{
    CompressionManager, CompressionStats, ComparisonSummary, EngineConfig, FileInfo, Registry,
    VerificationMode,
};
use tracing_subscriber::EnvFilter;

/// Compress and decompress text files.
#[derive(Parser, Debug)]
#[command(author, version, about = "Huffman and run-length text compression", long_about = None)]
struct Cli {
    /// strict aborts on any integrity mismatch, lenient only warns.
    #[arg(long, global = true, default_value_t = VerificationMode::Lenient)]
    verify: VerificationMode,

    /// Write generated files here instead of next to the input.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Print statistics as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a UTF-8 text file.
    Compress {
        input: PathBuf,
        #[arg(short, long, default_value = "huffman")]
        algorithm: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Decompress a .huff or .rle container.
    Decompress {
        input: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compress with several algorithms and compare the results.
    Compare {
        input: PathBuf,
        #[arg(short, long, value_delimiter = ',', default_values = ["huffman", "rle"])]
        algorithms: Vec<String>,
    },
    /// Show the Huffman code of every symbol, most frequent first.
    Codes {
        input: PathBuf,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Show size, character and line counts of a file.
    Info { input: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> textpack::Result<()> {
    let mut config = EngineConfig::new().with_verification(cli.verify);
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }
    let manager = CompressionManager::new(Registry::with_defaults(), config);

    match cli.command {
        Command::Compress {
            input,
            algorithm,
            out,
        } => {
            let outcome = match out {
                Some(out) => manager.compress_to(&input, &algorithm, out)?,
                None => manager.compress(&input, &algorithm)?,
            };
            println!("wrote {}", outcome.output_path.display());
            print_stats(outcome.stats(), cli.json)?;
        }
        Command::Decompress { input, out } => {
            let outcome = match out {
                Some(out) => manager.decompress_to(&input, out)?,
                None => manager.decompress(&input)?,
            };
            println!("wrote {}", outcome.output_path.display());
            print_stats(&outcome.stats, cli.json)?;
            if outcome.verified() {
                println!("integrity: verified");
            } else {
                for failure in outcome.verification.failures() {
                    println!("integrity: FAILED ({})", failure);
                }
            }
        }
        Command::Compare { input, algorithms } => {
            let results = manager.compare(&input, &algorithms)?;
            for comparison in &results {
                match &comparison.result {
                    Ok(stats) => print_stats(stats, cli.json)?,
                    Err(err) => println!("{}: failed: {}", comparison.algorithm, err),
                }
            }
            let summary = ComparisonSummary::from_results(&results);
            if let Some((name, ratio)) = &summary.best_ratio {
                println!("best ratio: {} ({:.2}%)", name, ratio);
            }
            if let Some((name, elapsed)) = &summary.fastest {
                println!("fastest: {} ({:.3}s)", name, elapsed.as_secs_f64());
            }
        }
        Command::Codes { input, limit } => {
            for row in manager.code_rows(&input)?.into_iter().take(limit) {
                println!(
                    "{:<8} U+{:04X}\t{}\t{}",
                    format!("{:?}", row.symbol),
                    row.code_point,
                    row.frequency,
                    row.code
                );
            }
        }
        Command::Info { input } => {
            let info = FileInfo::inspect(&input)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("file: {}", info.path.display());
                println!("size: {} bytes", info.size);
                if let (Some(chars), Some(lines)) = (info.characters, info.lines) {
                    println!("characters: {}", chars);
                    println!("lines: {}", lines);
                }
            }
        }
    }
    Ok(())
}

fn print_stats(stats: &CompressionStats, json: bool) -> textpack::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }
    println!("algorithm: {}", stats.algorithm);
    println!("  original size:   {} bytes", stats.original_size);
    println!("  compressed size: {} bytes", stats.compressed_size);
    println!("  ratio:           {:.2}%", stats.ratio);
    println!("  space saved:     {} bytes", stats.space_saved());
    println!("  time:            {:.3}s", stats.elapsed.as_secs_f64());
    println!("  checksum:        {:#04x}", stats.checksum);
    println!("  fingerprint:     {}", stats.fingerprint);
    Ok(())
}
