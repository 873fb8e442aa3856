//! Hypercube addressing for the bitonic merge network.
//!
//! The MPI rank of a process doubles as its hypercube address: with P = 2^d
//! processes, the d-bit pattern of a rank locates its node, and two nodes are
//! neighbours iff their addresses differ in exactly one bit. Every partner,
//! direction, and role decision in the network is a bit test on this address,
//! collected here behind the [`Rank`] type so the bit arithmetic appears in
//! one place.

use crate::error::SortError;

/// An MPI rank interpreted as a d-bit hypercube address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rank(i32);

impl Rank {
    /// Wraps a raw MPI rank.
    pub fn new(rank: i32) -> Self {
        Rank(rank)
    }

    /// The raw MPI rank.
    pub fn value(self) -> i32 {
        self.0
    }

    /// Bit `j` of the hypercube address, 0 or 1.
    pub fn bit(self, j: u32) -> u32 {
        ((self.0 >> j) & 1) as u32
    }

    /// The neighbour whose address differs in exactly bit `j`.
    pub fn partner(self, j: u32) -> Rank {
        Rank(self.0 ^ (1 << j))
    }
}

/// A fixed set of processes arranged as a binary hypercube.
#[derive(Clone, Copy, Debug)]
pub struct Hypercube {
    size: i32,
    dimensions: u32,
}

impl Hypercube {
    /// Validates the process count and derives the cube dimensions.
    ///
    /// The power-of-two requirement is intrinsic to the hypercube network,
    /// so it is a hard precondition checked before any data movement.
    pub fn new(size: i32) -> Result<Self, SortError> {
        if size < 2 {
            return Err(SortError::Configuration(format!(
                "at least 2 processes are required, got {size}"
            )));
        }
        if !(size as u32).is_power_of_two() {
            return Err(SortError::Configuration(format!(
                "the number of processes must be a power of 2, got {size}"
            )));
        }
        Ok(Hypercube {
            size,
            dimensions: (size as u32).trailing_zeros(),
        })
    }

    /// Number of processes in the cube.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Number of hypercube dimensions, log2 of the process count. One merge
    /// stage runs per dimension.
    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }
}

/// Ordering applied to a local block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

impl Direction {
    /// Maps an address bit to a block direction: 0 sorts ascending, 1
    /// descending. A rank's initial direction is its bit 0; after stage `i`
    /// it is bit `i + 1`.
    pub fn of_bit(bit: u32) -> Self {
        if bit == 0 {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }
}

/// The side of a block compare-exchange a process takes in one sub-step.
///
/// The role also fixes the exchange ordering: `KeepLow` sends before
/// receiving, `KeepHigh` receives before sending. Since any partnered pair
/// splits into exactly one of each, partners never both enter a blocking send
/// against each other, which is what keeps the protocol deadlock-free.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Keep the element-wise minima of the two blocks.
    KeepLow,
    /// Keep the element-wise maxima of the two blocks.
    KeepHigh,
}

impl Role {
    /// Role of `rank` in sub-step `substep` of merge stage `stage`.
    ///
    /// A process keeps the low half iff bit `stage + 1` of its address
    /// equals bit `substep`. Its partner differs in exactly bit `substep`,
    /// so the partner always lands on the opposite role.
    pub fn assign(rank: Rank, stage: u32, substep: u32) -> Self {
        if rank.bit(stage + 1) == rank.bit(substep) {
            Role::KeepLow
        } else {
            Role::KeepHigh
        }
    }
}
