//! Containers backing the dataflow facts.

mod hybrid_map;
mod hybrid_set;

pub use hybrid_map::HybridMap;
pub use hybrid_set::HybridSet;
