use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;

use ntuple_td::serialization::{
    read_legacy_weights_from_path, read_weights_from_path, write_weights_to_path, WeightFileError,
};

#[derive(Parser, Debug)]
#[command(name = "weights", version, about = "Inspect and convert n-tuple weight files")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a weight file and print a brief summary
    Validate {
        /// Weight file path
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// File uses the legacy unversioned layout
        #[arg(long)]
        legacy: bool,
    },
    /// Print per-table stats (entries, non-zero, min/max/mean)
    Stats {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        legacy: bool,
    },
    /// Rewrite a legacy weight file in the versioned, checksummed layout
    Convert {
        /// Legacy input
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Versioned output
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

fn read(path: &Path, legacy: bool) -> Result<Vec<Vec<f32>>, WeightFileError> {
    if legacy {
        read_legacy_weights_from_path(path)
    } else {
        read_weights_from_path(path)
    }
}

#[derive(Debug, Default)]
struct TableStats {
    entries: usize,
    non_zero: usize,
    min: f32,
    max: f32,
    mean: f64,
}

fn table_stats(values: &[f32]) -> TableStats {
    if values.is_empty() {
        return TableStats::default();
    }
    let mut s = TableStats { entries: values.len(), min: f32::INFINITY, max: f32::NEG_INFINITY, ..Default::default() };
    let mut sum = 0f64;
    for &v in values {
        if v != 0.0 {
            s.non_zero += 1;
        }
        s.min = s.min.min(v);
        s.max = s.max.max(v);
        sum += v as f64;
    }
    s.mean = sum / values.len() as f64;
    s
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    match cli.cmd {
        Command::Validate { file, legacy } => match read(&file, legacy) {
            Ok(tables) => {
                let entries: usize = tables.iter().map(Vec::len).sum();
                eprintln!("OK: {} ({} tables, {} entries)", file.display(), tables.len(), entries);
            }
            Err(e) => {
                eprintln!("INVALID: {} ({})", file.display(), e);
                std::process::exit(2);
            }
        },
        Command::Stats { file, legacy } => {
            let tables = read(&file, legacy)?;
            println!("file: {}", file.display());
            println!("tables: {}", tables.len());
            for (i, t) in tables.iter().enumerate() {
                let s = table_stats(t);
                println!(
                    "table {}: entries {} | non_zero {} | min {:.6} | max {:.6} | mean {:.6}",
                    i, s.entries, s.non_zero, s.min, s.max, s.mean
                );
            }
        }
        Command::Convert { input, output } => {
            let tables = read_legacy_weights_from_path(&input)?;
            let views: Vec<&[f32]> = tables.iter().map(Vec::as_slice).collect();
            write_weights_to_path(&output, &views)?;
            info!("converted {} -> {} ({} tables)", input.display(), output.display(), tables.len());
        }
    }
    Ok(())
}
