//! Error types shared by the coordinator and the merge network.

use std::error::Error;
use std::fmt;

/// Failure modes of a distributed sort.
///
/// Every variant is fatal to the computation: correctness depends on all
/// processes completing all merge stages, so there is no retry or degraded
/// mode. `Verification` is the one diagnostic variant, raised only by the
/// optional post-sort adjacency check, and indicates an implementation defect
/// rather than a runtime condition.
#[derive(Debug)]
pub enum SortError {
    /// The process set cannot form a binary hypercube, detected before any
    /// data movement.
    Configuration(String),
    /// The input file is missing, unreadable, or malformed, or the output
    /// file cannot be written.
    Input(String),
    /// A point-to-point exchange completed with an unexpected buffer shape.
    Transport(String),
    /// The collected sequence contains an inversion at `index`.
    Verification {
        /// Index of the left element of the inverted pair.
        index: usize,
    },
}

impl fmt::Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            SortError::Input(msg) => write!(f, "input error: {msg}"),
            SortError::Transport(msg) => write!(f, "transport error: {msg}"),
            SortError::Verification { index } => {
                write!(f, "verification error: inversion at index {index}")
            }
        }
    }
}

impl Error for SortError {}

impl From<std::io::Error> for SortError {
    fn from(error: std::io::Error) -> Self {
        SortError::Input(error.to_string())
    }
}
