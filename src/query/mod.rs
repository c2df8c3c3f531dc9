//! Query layer

mod dedup;

pub use dedup::{DedupOutcome, DedupSearcher, Termination};
