//! Sorting routines for block-distributed sequences
pub mod bitonic;
pub mod local;

pub use bitonic::bitonic_sort;
pub use local::sort_direction;
