//! Control flow graphs of [`Method`]s.

use std::collections::{BTreeMap, BTreeSet};

use crate::analysis::fixed_point::Graph;

use super::{Method, Stmt, StmtIndex};

#[cfg(feature = "petgraph")]
pub mod petgraph;

/// The kind of a control transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ControlTransfer {
    /// Execution falls through to the next statement or jumps unconditionally.
    #[display("")]
    Unconditional,
    /// A branch that is taken only if its condition holds.
    #[display("<conditional>")]
    Conditional,
}

/// An error occurring when building a [`ControlFlowGraph`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CfgError {
    /// The method has no statements.
    #[error("The method has no statements")]
    EmptyMethod,
    /// The method has more statements than a [`StmtIndex`] can address.
    #[error("The method has {0} statements, which exceeds the limit")]
    TooManyStatements(usize),
    /// A jump leads outside the body of the method.
    #[error("Invalid jump target {target} at {at}")]
    InvalidJumpTarget {
        /// The jump statement.
        at: StmtIndex,
        /// The target of the jump.
        target: StmtIndex,
    },
}

/// The control flow graph of a [`Method`], with one node per statement.
///
/// The first statement is the entry. A `return`, or a last statement that does not jump
/// elsewhere, is an exit.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph<'m> {
    method: &'m Method,
    edges: BTreeMap<(StmtIndex, StmtIndex), ControlTransfer>,
    successors: BTreeMap<StmtIndex, BTreeSet<StmtIndex>>,
    predecessors: BTreeMap<StmtIndex, BTreeSet<StmtIndex>>,
    exits: BTreeSet<StmtIndex>,
}

impl<'m> ControlFlowGraph<'m> {
    /// Builds the control flow graph of `method`.
    ///
    /// # Errors
    /// See [`CfgError`].
    pub fn new(method: &'m Method) -> Result<Self, CfgError> {
        if method.body.is_empty() {
            return Err(CfgError::EmptyMethod);
        }
        let len = u16::try_from(method.body.len())
            .map_err(|_| CfgError::TooManyStatements(method.body.len()))?;
        let in_body = |it: StmtIndex| u16::from(it) < len;

        let mut cfg = Self {
            method,
            edges: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            exits: BTreeSet::new(),
        };
        for (at, stmt) in (0..len).map(StmtIndex::from).zip(&method.body) {
            cfg.successors.entry(at).or_default();
            cfg.predecessors.entry(at).or_default();
            let fall_through = at.next().filter(|it| in_body(*it));
            match stmt {
                Stmt::Return(_) => {
                    cfg.exits.insert(at);
                }
                Stmt::Goto(target) | Stmt::If { target, .. } if !in_body(*target) => {
                    return Err(CfgError::InvalidJumpTarget {
                        at,
                        target: *target,
                    });
                }
                Stmt::Goto(target) => cfg.add_edge(at, *target, ControlTransfer::Unconditional),
                Stmt::If { target, .. } => {
                    cfg.add_edge(at, *target, ControlTransfer::Conditional);
                    match fall_through {
                        Some(next) => cfg.add_edge(at, next, ControlTransfer::Unconditional),
                        None => {
                            cfg.exits.insert(at);
                        }
                    }
                }
                Stmt::Nop | Stmt::Assign { .. } | Stmt::Invoke(_) => match fall_through {
                    Some(next) => cfg.add_edge(at, next, ControlTransfer::Unconditional),
                    None => {
                        cfg.exits.insert(at);
                    }
                },
            }
        }
        Ok(cfg)
    }

    fn add_edge(&mut self, src: StmtIndex, dst: StmtIndex, kind: ControlTransfer) {
        // A conditional jump to the next statement is still a single edge.
        self.edges.entry((src, dst)).or_insert(kind);
        self.successors.entry(src).or_default().insert(dst);
        self.predecessors.entry(dst).or_default().insert(src);
    }

    /// Returns the method this graph was built from.
    #[must_use]
    pub const fn method(&self) -> &'m Method {
        self.method
    }

    /// Returns the statement at `node`.
    ///
    /// # Panics
    /// Panics if `node` is not a node of this graph.
    #[must_use]
    pub fn stmt(&self, node: StmtIndex) -> &'m Stmt {
        &self.method.body[usize::from(node)]
    }

    /// Iterates over the edges with their kinds.
    pub fn edges(&self) -> impl Iterator<Item = (StmtIndex, StmtIndex, &ControlTransfer)> + '_ {
        self.edges.iter().map(|((src, dst), kind)| (*src, *dst, kind))
    }

    /// Returns the kind of the edge from `src` to `dst`, if there is one.
    #[must_use]
    pub fn edge(&self, src: StmtIndex, dst: StmtIndex) -> Option<ControlTransfer> {
        self.edges.get(&(src, dst)).copied()
    }
}

impl Graph for ControlFlowGraph<'_> {
    type Node = StmtIndex;

    fn entry(&self) -> StmtIndex {
        StmtIndex::ZERO
    }

    fn exits(&self) -> impl Iterator<Item = StmtIndex> + '_ {
        self.exits.iter().copied()
    }

    fn nodes(&self) -> impl Iterator<Item = StmtIndex> + '_ {
        self.successors.keys().copied()
    }

    fn predecessors(&self, node: StmtIndex) -> impl Iterator<Item = StmtIndex> + '_ {
        self.predecessors[&node].iter().copied()
    }

    fn successors(&self, node: StmtIndex) -> impl Iterator<Item = StmtIndex> + '_ {
        self.successors[&node].iter().copied()
    }
}
