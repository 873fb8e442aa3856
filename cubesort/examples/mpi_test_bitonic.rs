//? mpirun -n {{NPROCESSES}}

use cubesort::{bitonic_sort, Coordinator};
use mpi::{
    topology::SimpleCommunicator,
    traits::{Communicator, Destination, Root, Source},
};
use rand::{thread_rng, Rng};

/// Check if `n` is a power of two
fn power_of_two(n: i32) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

/// Tests that each process's block is locally sorted and that consecutive
/// ranks hold non-overlapping value ranges, i.e. the distributed whole is
/// globally sorted.
fn test_sorted(sorted_arr: &[i64], comm: &SimpleCommunicator, label: &str) {
    let rank = comm.rank();
    let size = comm.size();

    for pair in sorted_arr.windows(2) {
        assert!(pair[0] <= pair[1]);
    }

    let min = *sorted_arr.first().unwrap();
    let max = *sorted_arr.last().unwrap();

    let next_rank = if rank + 1 < size { rank + 1 } else { 0 };
    let previous_rank = if rank > 0 { rank - 1 } else { size - 1 };

    let previous_process = comm.process_at_rank(previous_rank);
    let next_process = comm.process_at_rank(next_rank);

    // Send min to partner
    if rank > 0 {
        previous_process.send(&min);
    }

    let mut next_min = i64::MAX;
    if rank < size - 1 {
        next_process.receive_into(&mut next_min);
        assert!(max <= next_min);
    }

    if rank == 0 {
        println!("...test_{label} passed");
    }
}

fn main() {
    // Setup MPI
    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    if !power_of_two(size) || size < 2 {
        if rank == 0 {
            println!("skipped: run with a power-of-two number of processes, at least 2");
        }
        return;
    }

    // Test the merge network on pre-distributed blocks
    {
        // Select random integers, with duplicates
        let mut rng = thread_rng();
        let n = 1000usize;
        let mut partition: Vec<i64> = (0..n).map(|_| rng.gen_range(0..=10000)).collect();
        let original = partition.clone();

        bitonic_sort(&mut partition, &world).unwrap();
        test_sorted(&partition, &world, "bitonic");

        // The sorted whole must be a permutation of the input
        let root = world.process_at_rank(0);
        if rank == 0 {
            let mut before = vec![0i64; n * size as usize];
            let mut after = vec![0i64; n * size as usize];
            root.gather_into_root(&original[..], &mut before[..]);
            root.gather_into_root(&partition[..], &mut after[..]);
            before.sort_unstable();
            assert_eq!(before, after);
            println!("...test_permutation passed");
        } else {
            root.gather_into(&original[..]);
            root.gather_into(&partition[..]);
        }
    }

    // Distribute immediately followed by collect, with zero stages run,
    // returns the loaded sequence unchanged
    {
        let path = std::env::temp_dir().join(format!("cubesort_roundtrip_{}", std::process::id()));
        let values: Vec<i32> = (0..37).map(|i| (37 - i) * 3 % 17).collect();
        if rank == 0 {
            let mut contents = format!("{}\n", values.len());
            for value in &values {
                contents.push_str(&format!("{value}\n"));
            }
            std::fs::write(&path, contents).unwrap();
        }

        let mut coordinator: Coordinator<'_, i64> = Coordinator::new(&world).unwrap();
        if coordinator.is_root() {
            coordinator.load_and_pad(&path).unwrap();
        }
        let partition = coordinator.distribute();
        coordinator.collect(&partition);

        if coordinator.is_root() {
            let expected: Vec<i64> = values.iter().map(|&value| i64::from(value)).collect();
            assert_eq!(coordinator.sequence(), &expected[..]);
            std::fs::remove_file(&path).unwrap();
            println!("...test_round_trip passed");
        }
    }

    // End to end through the coordinator, against a serial reference sort
    {
        let path = std::env::temp_dir().join(format!("cubesort_e2e_{}", std::process::id()));
        let mut rng = thread_rng();
        let n = 10000;
        let values: Vec<i32> = (0..n).map(|_| rng.gen_range(-10000..=10000)).collect();
        if rank == 0 {
            let mut contents = format!("{n}\n");
            for value in &values {
                contents.push_str(&format!("{value}\n"));
            }
            std::fs::write(&path, contents).unwrap();
        }

        let mut coordinator: Coordinator<'_, i64> = Coordinator::new(&world).unwrap();
        if coordinator.is_root() {
            coordinator.load_and_pad(&path).unwrap();
        }
        let mut partition = coordinator.distribute();
        coordinator.run_stages(&mut partition).unwrap();
        coordinator.collect(&partition);

        if coordinator.is_root() {
            coordinator.verify().unwrap();
            let mut expected: Vec<i64> = values.iter().map(|&value| i64::from(value)).collect();
            expected.sort_unstable();
            assert_eq!(coordinator.sequence(), &expected[..]);
            std::fs::remove_file(&path).unwrap();
            println!("...test_end_to_end passed");
        }
    }
}
