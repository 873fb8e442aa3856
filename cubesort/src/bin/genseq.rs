//! Generates a random input file for the sorter: an element count on the
//! first line followed by that many integers, one per line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use rand::{thread_rng, Rng};

/// Struct for parsing command-line arguments
#[derive(Parser)]
struct Args {
    /// Number of values to generate
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Where to write the generated sequence
    #[arg(long, default_value = "numbers.txt")]
    output: PathBuf,

    /// Generated values are drawn uniformly from 0..max
    #[arg(long, default_value_t = i32::MAX)]
    max: i32,
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let mut rng = thread_rng();

    let file = File::create(&args.output)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", args.count)?;
    for _ in 0..args.count {
        writeln!(writer, "{}", rng.gen_range(0..args.max))?;
    }
    writer.flush()
}
