//! Analysis modules.
//!
//! Filtering, grouping and statistics over normalized tables.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
pub use stats::*;
