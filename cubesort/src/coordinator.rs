//! Coordinator for a distributed sort.
//!
//! The coordinator is the explicit per-process context of the computation:
//! it owns the global sequence (materially present only at the root, before
//! distribution and after collection), the padding bookkeeping, and the
//! lifecycle `Init -> Loaded -> Distributed -> Sorted -> Collected ->
//! Persisted`. Validation failures abort before any data movement.
//!
//! Padding reuses the maximum representable value of the element type as a
//! sentinel so padded slots sort to the tail. To keep a genuine input value
//! from colliding with the sentinel, input files are parsed as `i32` while
//! the element type is chosen strictly wider by the caller (the bundled CLI
//! sorts `i64`), putting the sentinel outside the input domain altogether.

use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mpi::{
    topology::SimpleCommunicator,
    traits::{Communicator, CommunicatorCollectives, Equivalence, Root},
};
use num::Bounded;

use crate::{error::SortError, sorting::bitonic_sort, topology::Hypercube};

/// Rank that owns the global sequence before distribution and after
/// collection.
pub const ROOT_RANK: i32 = 0;

/// Coordinator lifecycle marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Init,
    Loaded,
    Distributed,
    Sorted,
    Collected,
    Persisted,
}

/// Reads a sequence file: an element count on the first line followed by
/// that many whitespace/newline-separated integers.
///
/// Values are parsed as `i32` (the input domain) and widened into `T`.
pub fn read_sequence<T, P>(path: P) -> Result<Vec<T>, SortError>
where
    T: From<i32>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|error| SortError::Input(format!("cannot read {}: {error}", path.display())))?;
    let mut tokens = contents.split_whitespace();

    let header = tokens
        .next()
        .ok_or_else(|| SortError::Input("missing element count header".to_string()))?;
    let n: usize = header
        .parse()
        .map_err(|error| SortError::Input(format!("invalid element count {header:?}: {error}")))?;

    let mut sequence = Vec::with_capacity(n);
    for i in 0..n {
        let token = tokens.next().ok_or_else(|| {
            SortError::Input(format!("expected {n} values, the file holds only {i}"))
        })?;
        let value: i32 = token
            .parse()
            .map_err(|error| SortError::Input(format!("invalid value {token:?}: {error}")))?;
        sequence.push(T::from(value));
    }

    Ok(sequence)
}

/// Extends `sequence` to the smallest multiple of `size` with the sentinel
/// value, which never compares less than any genuine value.
pub fn pad_sequence<T: Bounded + Ord>(sequence: &mut Vec<T>, size: usize) {
    let padded_len = sequence.len().div_ceil(size) * size;
    sequence.resize_with(padded_len, T::max_value);
}

/// The per-process context of one distributed sort.
///
/// Every process in the communicator constructs a coordinator; only the root
/// loads, persists, and materially holds the global sequence. All other
/// operations are collective and must be called by every process in
/// lock-step.
pub struct Coordinator<'c, T> {
    communicator: &'c SimpleCommunicator,
    cube: Hypercube,
    /// Number of genuine (unpadded) input values, meaningful at the root.
    input_len: usize,
    /// Global sequence, padded after load, truncated after collection.
    sequence: Vec<T>,
    phase: Phase,
}

impl<'c, T> Coordinator<'c, T>
where
    T: Equivalence + Ord + Default + Copy + Bounded + From<i32> + Debug,
{
    /// Validates the process set and builds an idle coordinator.
    pub fn new(communicator: &'c SimpleCommunicator) -> Result<Self, SortError> {
        let cube = Hypercube::new(communicator.size())?;
        Ok(Coordinator {
            communicator,
            cube,
            input_len: 0,
            sequence: Vec::new(),
            phase: Phase::Init,
        })
    }

    /// Whether this process owns the global sequence.
    pub fn is_root(&self) -> bool {
        self.communicator.rank() == ROOT_RANK
    }

    /// The hypercube the process set forms.
    pub fn hypercube(&self) -> &Hypercube {
        &self.cube
    }

    /// Number of genuine input values, excluding padding. Zero until
    /// [`Coordinator::load_and_pad`] ran at the root.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// The global sequence held by this process. Padded after loading,
    /// trimmed back to the input length after collection, empty on non-root
    /// ranks.
    pub fn sequence(&self) -> &[T] {
        &self.sequence
    }

    /// Reads and pads the input sequence. Root only.
    pub fn load_and_pad<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SortError> {
        debug_assert!(self.is_root());
        debug_assert_eq!(self.phase, Phase::Init);

        let mut sequence = read_sequence(path)?;
        self.input_len = sequence.len();
        pad_sequence(&mut sequence, self.cube.size() as usize);
        self.sequence = sequence;
        self.phase = Phase::Loaded;
        Ok(())
    }

    /// Broadcasts the partition length and scatters the padded sequence in
    /// rank order: rank r receives the slice `[r * L, (r + 1) * L)`.
    /// Collective; returns this process's partition.
    pub fn distribute(&mut self) -> Vec<T> {
        debug_assert_eq!(
            self.phase,
            if self.is_root() { Phase::Loaded } else { Phase::Init }
        );

        let root = self.communicator.process_at_rank(ROOT_RANK);

        let mut block_len: u64 = if self.is_root() {
            (self.sequence.len() / self.cube.size() as usize) as u64
        } else {
            0
        };
        root.broadcast_into(&mut block_len);

        let mut partition = vec![T::default(); block_len as usize];
        if self.is_root() {
            root.scatter_into_root(&self.sequence[..], &mut partition[..]);
        } else {
            root.scatter_into(&mut partition[..]);
        }

        self.phase = Phase::Distributed;
        partition
    }

    /// Runs the log2(P) merge stages of the bitonic network on this
    /// process's partition. Collective.
    pub fn run_stages(&mut self, partition: &mut [T]) -> Result<(), SortError> {
        debug_assert_eq!(self.phase, Phase::Distributed);

        // Lock-step start, so timing taken around this call at the root
        // measures the network alone.
        self.communicator.barrier();
        bitonic_sort(partition, self.communicator)?;

        self.phase = Phase::Sorted;
        Ok(())
    }

    /// Gathers all partitions back in rank order and trims the sentinel
    /// padding at the root. Collective.
    pub fn collect(&mut self, partition: &[T]) {
        debug_assert!(matches!(self.phase, Phase::Distributed | Phase::Sorted));

        let root = self.communicator.process_at_rank(ROOT_RANK);
        if self.is_root() {
            root.gather_into_root(partition, &mut self.sequence[..]);
            self.sequence.truncate(self.input_len);
        } else {
            root.gather_into(partition);
        }

        self.phase = Phase::Collected;
    }

    /// Adjacency check of the collected sequence. An inversion means the
    /// network is defective; this must never fire under correct operation.
    /// Root only.
    pub fn verify(&self) -> Result<(), SortError> {
        debug_assert!(self.is_root());
        debug_assert_eq!(self.phase, Phase::Collected);

        for (index, pair) in self.sequence.windows(2).enumerate() {
            if pair[0] > pair[1] {
                return Err(SortError::Verification { index });
            }
        }
        Ok(())
    }

    /// Writes the collected sequence, one value per line. Root only.
    pub fn persist<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SortError>
    where
        T: Display,
    {
        debug_assert!(self.is_root());
        debug_assert_eq!(self.phase, Phase::Collected);

        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|error| SortError::Input(format!("cannot write {}: {error}", path.display())))?;
        let mut writer = BufWriter::new(file);
        for value in &self.sequence {
            writeln!(writer, "{value}")?;
        }
        writer.flush()?;

        self.phase = Phase::Persisted;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn temp_input(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cubesort_{name}_{}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_read_sequence() {
        let path = temp_input("read", "4\n3 1\n4 2\n");
        let sequence: Vec<i64> = read_sequence(&path).unwrap();
        assert_eq!(sequence, vec![3, 1, 4, 2]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_empty_input() {
        let path = temp_input("empty", "0\n");
        let sequence: Vec<i64> = read_sequence(&path).unwrap();
        assert!(sequence.is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_ignores_values_past_count() {
        let path = temp_input("extra", "2\n10 20 30 40\n");
        let sequence: Vec<i64> = read_sequence(&path).unwrap();
        assert_eq!(sequence, vec![10, 20]);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_missing_file() {
        let result: Result<Vec<i64>, _> = read_sequence("/nonexistent/numbers.txt");
        assert!(matches!(result, Err(SortError::Input(_))));
    }

    #[test]
    fn test_read_sequence_missing_header() {
        let path = temp_input("no_header", "");
        let result: Result<Vec<i64>, _> = read_sequence(&path);
        assert!(matches!(result, Err(SortError::Input(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_bad_header() {
        let path = temp_input("bad_header", "five\n1 2 3 4 5\n");
        let result: Result<Vec<i64>, _> = read_sequence(&path);
        assert!(matches!(result, Err(SortError::Input(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_too_few_values() {
        let path = temp_input("short", "5\n1 2 3\n");
        let result: Result<Vec<i64>, _> = read_sequence(&path);
        assert!(matches!(result, Err(SortError::Input(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_read_sequence_bad_value() {
        let path = temp_input("bad_value", "3\n1 x 3\n");
        let result: Result<Vec<i64>, _> = read_sequence(&path);
        assert!(matches!(result, Err(SortError::Input(_))));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_pad_sequence() {
        let mut sequence: Vec<i64> = vec![5, 4, 3, 2, 1];
        pad_sequence(&mut sequence, 4);
        assert_eq!(sequence.len(), 8);
        assert_eq!(&sequence[..5], &[5, 4, 3, 2, 1]);
        assert!(sequence[5..].iter().all(|&value| value == i64::MAX));
    }

    #[test]
    fn test_pad_sequence_exact_multiple() {
        let mut sequence: Vec<i64> = vec![1, 2, 3, 4];
        pad_sequence(&mut sequence, 4);
        assert_eq!(sequence, vec![1, 2, 3, 4]);

        let mut empty: Vec<i64> = Vec::new();
        pad_sequence(&mut empty, 8);
        assert!(empty.is_empty());
    }

    /// The sentinel cannot collide with genuine values: input is parsed as
    /// i32 while the element type is strictly wider.
    #[test]
    fn test_sentinel_outside_input_domain() {
        let path = temp_input("extremes", &format!("2\n{} {}\n", i32::MAX, i32::MIN));
        let mut sequence: Vec<i64> = read_sequence(&path).unwrap();
        pad_sequence(&mut sequence, 4);

        assert_eq!(sequence.len(), 4);
        assert!(i64::from(i32::MAX) < i64::MAX);
        assert_eq!(sequence[2..], [i64::MAX, i64::MAX]);
        assert_eq!(sequence[..2], [i64::from(i32::MAX), i64::from(i32::MIN)]);
        std::fs::remove_file(path).unwrap();
    }
}
