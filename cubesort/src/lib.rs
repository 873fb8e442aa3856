//! # Cubesort
//!
//! A distributed sort of large integer sequences across a hypercube of MPI
//! processes, based on Batcher's bitonic sorting network adapted to
//! block-distributed data: each process owns a contiguous block rather than a
//! single element, and every compare-exchange of the network becomes an
//! element-wise min/max reduction between two partner blocks.
//!
//! Notable features of this library are:
//! * Convergence to global sorted order in exactly log2(P) merge stages for
//!   any power-of-two process count P.
//! * A deadlock-free blocking exchange protocol, with the send/receive
//!   ordering carried by a typed compare-exchange role.
//! * A coordinator that owns padding, distribution over MPI, collection, and
//!   file persistence of the global sequence.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod sorting;
pub mod topology;

// Public API
#[doc(inline)]
pub use coordinator::Coordinator;
#[doc(inline)]
pub use error::SortError;
#[doc(inline)]
pub use sorting::bitonic_sort;
