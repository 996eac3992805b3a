//! APIs for dataflow analysis.
//!
//! The [`fixed_point`] module holds the analysis-agnostic solver. Concrete analyses plug into
//! it by implementing [`fixed_point::DataflowAnalysis`] over facts from [`fact`], whose values
//! are drawn from a lattice in [`lattice`].

pub mod constant_propagation;
pub mod fact;
pub mod fixed_point;
pub mod lattice;
pub mod live_variables;
