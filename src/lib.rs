#![warn(
    clippy::pedantic,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms
)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

//! Welcome to `tapas`, a library for iterative dataflow analysis.
//!
//! A [`ControlFlowGraph`](ir::control_flow::ControlFlowGraph) is built over the statements of a
//! [`Method`](ir::Method) and handed to the [`Solver`](analysis::fixed_point::Solver) together
//! with an analysis such as
//! [`ConstantPropagation`](analysis::constant_propagation::ConstantPropagation).
//!
//! ## Features
#![doc = document_features::document_features!()]

pub mod analysis;
pub mod collections;
pub mod ir;
