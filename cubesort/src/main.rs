//! Command-line driver for the distributed bitonic sort.
//!
//! Run under an MPI launcher with a power-of-two process count, e.g.
//! `mpirun -n 4 cubesort numbers.txt`.

use std::time::Instant;

use clap::Parser;
use itertools::Itertools;
use mpi::{
    topology::SimpleCommunicator,
    traits::{Communicator, CommunicatorCollectives},
};

use cubesort::{coordinator::read_sequence, Coordinator, SortError};

/// Struct for parsing command-line arguments
#[derive(Parser)]
struct Args {
    /// Input file: an element count on the first line, then that many
    /// integers
    input: std::path::PathBuf,

    /// Where to write the sorted sequence, one value per line
    #[arg(long, default_value = "output.txt")]
    output: std::path::PathBuf,

    /// Print the sorted sequence next to a serial reference sort
    #[arg(long, default_value_t = false)]
    verbose: bool,

    /// Check the collected sequence for inversions before writing it
    #[arg(long, default_value_t = false)]
    verify: bool,
}

fn main() {
    let args = Args::parse();
    let universe = mpi::initialize().unwrap();
    let world = universe.world();

    if let Err(error) = run(&args, &world) {
        eprintln!("[rank {}] {error}", world.rank());
        std::process::exit(1);
    }
}

fn run(args: &Args, world: &SimpleCommunicator) -> Result<(), SortError> {
    let mut coordinator: Coordinator<'_, i64> = Coordinator::new(world)?;

    if coordinator.is_root() {
        coordinator.load_and_pad(&args.input)?;
        println!("Number of processes: {}", world.size());
        println!("Input length: {}", coordinator.input_len());
        println!("Padded length: {}", coordinator.sequence().len());
    }

    let mut partition = coordinator.distribute();

    let start = Instant::now();
    coordinator.run_stages(&mut partition)?;
    world.barrier();
    if coordinator.is_root() {
        println!("Sort time: {:.6}s", start.elapsed().as_secs_f64());
    }

    coordinator.collect(&partition);

    if coordinator.is_root() {
        if args.verify {
            coordinator.verify()?;
        }
        if args.verbose {
            let mut expected: Vec<i64> = read_sequence(&args.input)?;
            expected.sort_unstable();
            println!("Reference sort: {}", expected.iter().join(" "));
            println!("Bitonic sort:   {}", coordinator.sequence().iter().join(" "));
        }
        coordinator.persist(&args.output)?;
    }

    Ok(())
}
