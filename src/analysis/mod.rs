//! Aggregation stages of the report pipeline.

pub mod aggregator;

pub use aggregator::*;
