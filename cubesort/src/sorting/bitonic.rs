//! Bitonic sort over block-distributed data.
//!
//! Batcher's network for P = 2^d elements runs d stages, stage i performing
//! i + 1 compare-exchange sub-steps between hypercube neighbours. Here every
//! "element" is a whole block of length L: a compare-exchange becomes a
//! blocking buffer swap with the partner followed by an element-wise min/max
//! reduction, and each stage ends with a local re-sort so that the next
//! stage again merges two sorted blocks of opposite orientation.

use std::fmt::Debug;

use mpi::{
    topology::SimpleCommunicator,
    traits::{Communicator, Destination, Equivalence, Source},
};

use crate::{
    error::SortError,
    sorting::local::sort_direction,
    topology::{Direction, Hypercube, Rank, Role},
};

/// Keeps the element-wise minima of `partition` and `received`.
pub(crate) fn keep_low<T: Ord + Copy>(partition: &mut [T], received: &[T]) {
    for (own, other) in partition.iter_mut().zip(received.iter()) {
        if *other < *own {
            *own = *other;
        }
    }
}

/// Keeps the element-wise maxima of `partition` and `received`.
pub(crate) fn keep_high<T: Ord + Copy>(partition: &mut [T], received: &[T]) {
    for (own, other) in partition.iter_mut().zip(received.iter()) {
        if *other > *own {
            *own = *other;
        }
    }
}

impl Role {
    /// One blocking compare-exchange with the partner process.
    ///
    /// `KeepLow` sends its partition before receiving the partner's block
    /// into `buffer`; `KeepHigh` receives first. The partner holds the
    /// opposite role, so the orderings interlock and neither side blocks on
    /// a mutual send. The partition is reduced in place; `buffer` is scratch
    /// and holds the partner's block afterwards.
    fn exchange<T>(
        self,
        communicator: &SimpleCommunicator,
        partner: Rank,
        partition: &mut [T],
        buffer: &mut [T],
    ) -> Result<(), SortError>
    where
        T: Equivalence + Ord + Copy,
    {
        let process = communicator.process_at_rank(partner.value());

        let status = match self {
            Role::KeepLow => {
                process.send(&partition[..]);
                process.receive_into(&mut buffer[..])
            }
            Role::KeepHigh => {
                let status = process.receive_into(&mut buffer[..]);
                process.send(&partition[..]);
                status
            }
        };

        let received = status.count(T::equivalent_datatype()) as usize;
        if received != partition.len() {
            return Err(SortError::Transport(format!(
                "partner {} sent a block of {} elements, expected {}",
                partner.value(),
                received,
                partition.len()
            )));
        }

        match self {
            Role::KeepLow => keep_low(partition, buffer),
            Role::KeepHigh => keep_high(partition, buffer),
        }

        Ok(())
    }
}

/// Sorts a block-distributed array in place with the bitonic merge network.
///
/// Every process in the communicator must call this collectively, each
/// holding an equal-length contiguous block of the global sequence in rank
/// order. After log2(P) merge stages the concatenation of all partitions in
/// rank order is globally ascending. The communicator size must be a power
/// of two and at least 2.
///
/// Any transport failure is fatal to the whole computation; a partner block
/// of unexpected length surfaces as [`SortError::Transport`], and there is
/// no partial-failure recovery.
///
/// # Arguments
/// * `partition` - Local block of the distributed array, mutated in place
/// * `communicator` - Reference to underlying MPI communicator
pub fn bitonic_sort<T>(
    partition: &mut [T],
    communicator: &SimpleCommunicator,
) -> Result<(), SortError>
where
    T: Equivalence + Ord + Default + Copy + Debug,
{
    let cube = Hypercube::new(communicator.size())?;
    let rank = Rank::new(communicator.rank());

    // Scratch for the partner's block, overwritten every sub-step
    let mut buffer = vec![T::default(); partition.len()];

    sort_direction(partition, Direction::of_bit(rank.bit(0)));

    for stage in 0..cube.dimensions() {
        for substep in (0..=stage).rev() {
            let role = Role::assign(rank, stage, substep);
            role.exchange(communicator, rank.partner(substep), partition, &mut buffer)?;
        }

        // The reductions above leave the block unordered; restore monotonic
        // order in the direction of this rank's sub-cube so the next stage
        // again merges two sorted blocks of opposite orientation.
        sort_direction(partition, Direction::of_bit(rank.bit(stage + 1)));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{thread_rng, Rng};

    /// Plays every rank of the merge network sequentially in one process,
    /// replacing the blocking exchange with direct block copies. The
    /// partner/role/reduction logic is identical to the MPI path.
    fn sort_in_process(blocks: &mut [Vec<i64>]) {
        let size = blocks.len() as i32;
        let cube = Hypercube::new(size).unwrap();

        for (r, block) in blocks.iter_mut().enumerate() {
            let rank = Rank::new(r as i32);
            sort_direction(block, Direction::of_bit(rank.bit(0)));
        }

        for stage in 0..cube.dimensions() {
            for substep in (0..=stage).rev() {
                for r in 0..size {
                    let rank = Rank::new(r);
                    let partner = rank.partner(substep);
                    if partner.value() < r {
                        continue;
                    }

                    let (low, high) = match Role::assign(rank, stage, substep) {
                        Role::KeepLow => (r as usize, partner.value() as usize),
                        Role::KeepHigh => (partner.value() as usize, r as usize),
                    };

                    let low_before = blocks[low].clone();
                    let high_before = blocks[high].clone();
                    keep_low(&mut blocks[low], &high_before);
                    keep_high(&mut blocks[high], &low_before);
                }
            }

            for (r, block) in blocks.iter_mut().enumerate() {
                let rank = Rank::new(r as i32);
                sort_direction(block, Direction::of_bit(rank.bit(stage + 1)));
            }
        }
    }

    fn split_into_blocks(sequence: &[i64], size: usize) -> Vec<Vec<i64>> {
        assert_eq!(sequence.len() % size, 0);
        let block_len = sequence.len() / size;
        sequence
            .chunks(block_len)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    #[test]
    fn test_reductions() {
        let mut low = vec![3, 1, 4, 1];
        let mut high = vec![3, 1, 4, 1];
        let received = vec![2, 7, 1, 1];

        keep_low(&mut low, &received);
        keep_high(&mut high, &received);

        assert_eq!(low, vec![2, 1, 1, 1]);
        assert_eq!(high, vec![3, 7, 4, 1]);
    }

    #[test]
    fn test_network_converges_for_all_cube_sizes() {
        let mut rng = thread_rng();
        for size in [2, 4, 8, 16, 32] {
            let n = size * 16;
            let sequence: Vec<i64> = (0..n).map(|_| rng.gen_range(-1000..=1000)).collect();

            let mut expected = sequence.clone();
            expected.sort_unstable();

            let mut blocks = split_into_blocks(&sequence, size);
            sort_in_process(&mut blocks);

            assert_eq!(blocks.concat(), expected);
        }
    }

    #[test]
    fn test_network_with_single_element_blocks() {
        let mut blocks = split_into_blocks(&[5, 3, 7, 1, 8, 2, 6, 4], 8);
        sort_in_process(&mut blocks);
        assert_eq!(blocks.concat(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_scenario_two_processes() {
        // Input "4\n3 1 4 2" sorted over P = 2, L = 2
        let mut blocks = split_into_blocks(&[3, 1, 4, 2], 2);
        sort_in_process(&mut blocks);
        assert_eq!(blocks.concat(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_scenario_with_sentinel_padding() {
        // Input "5\n5 4 3 2 1" over P = 4: padded to 8 with three sentinels
        let sequence = vec![5, 4, 3, 2, 1, i64::MAX, i64::MAX, i64::MAX];
        let mut blocks = split_into_blocks(&sequence, 4);
        sort_in_process(&mut blocks);

        let collected = blocks.concat();
        assert_eq!(&collected[..5], &[1, 2, 3, 4, 5]);
        assert!(collected[5..].iter().all(|&value| value == i64::MAX));
    }

    /// Appending sentinel slots and trimming them afterwards yields the same
    /// result as sorting the genuine values alone.
    #[test]
    fn test_padding_is_transparent() {
        let mut rng = thread_rng();
        let size = 8;
        for n in [1, 9, 13, 31] {
            let mut sequence: Vec<i64> = (0..n).map(|_| rng.gen_range(-100..=100)).collect();
            let mut expected = sequence.clone();
            expected.sort_unstable();

            let padded_len = (n as usize).div_ceil(size) * size;
            sequence.resize(padded_len, i64::MAX);

            let mut blocks = split_into_blocks(&sequence, size);
            sort_in_process(&mut blocks);

            let mut collected = blocks.concat();
            collected.truncate(n as usize);
            assert_eq!(collected, expected);
        }
    }

    #[test]
    fn test_duplicates_and_extremes() {
        let sequence = vec![0, i64::MIN, 7, 7, 7, i64::MAX, -1, 0];
        let mut expected = sequence.clone();
        expected.sort_unstable();

        let mut blocks = split_into_blocks(&sequence, 4);
        sort_in_process(&mut blocks);
        assert_eq!(blocks.concat(), expected);
    }
}
