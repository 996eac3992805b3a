//! Implementations for the traits in the `petgraph` crate.

use std::collections::{BTreeSet, HashSet};

use petgraph::{
    Directed, Direction,
    visit::{
        Data, GraphBase, GraphProp, IntoEdgeReferences, IntoNeighbors, IntoNeighborsDirected,
        IntoNodeIdentifiers, IntoNodeReferences, NodeCount, NodeIndexable, Visitable,
    },
};

use super::{ControlFlowGraph, ControlTransfer};
use crate::ir::{Stmt, StmtIndex};

impl Data for ControlFlowGraph<'_> {
    type NodeWeight = Stmt;
    type EdgeWeight = ControlTransfer;
}

impl GraphBase for ControlFlowGraph<'_> {
    type NodeId = StmtIndex;
    type EdgeId = (StmtIndex, StmtIndex);
}

impl<'a> IntoNodeReferences for &'a ControlFlowGraph<'_> {
    type NodeRef = (StmtIndex, &'a Stmt);

    type NodeReferences = <Vec<Self::NodeRef> as IntoIterator>::IntoIter;

    fn node_references(self) -> Self::NodeReferences {
        self.successors
            .keys()
            .map(|it| (*it, self.stmt(*it)))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<'a> IntoEdgeReferences for &'a ControlFlowGraph<'_> {
    type EdgeRef = (StmtIndex, StmtIndex, &'a ControlTransfer);

    type EdgeReferences = <Vec<Self::EdgeRef> as IntoIterator>::IntoIter;

    fn edge_references(self) -> Self::EdgeReferences {
        self.edges().collect::<Vec<_>>().into_iter()
    }
}

impl Visitable for ControlFlowGraph<'_> {
    type Map = HashSet<StmtIndex>;

    fn visit_map(&self) -> Self::Map {
        HashSet::with_capacity(self.successors.len())
    }

    fn reset_map(&self, map: &mut Self::Map) {
        map.clear();
    }
}

impl IntoNodeIdentifiers for &ControlFlowGraph<'_> {
    type NodeIdentifiers = <BTreeSet<StmtIndex> as IntoIterator>::IntoIter;

    fn node_identifiers(self) -> Self::NodeIdentifiers {
        self.successors
            .keys()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
    }
}

impl IntoNeighbors for &ControlFlowGraph<'_> {
    type Neighbors = <BTreeSet<StmtIndex> as IntoIterator>::IntoIter;

    fn neighbors(self, a: StmtIndex) -> Self::Neighbors {
        self.neighbors_directed(a, Direction::Outgoing)
    }
}

impl IntoNeighborsDirected for &ControlFlowGraph<'_> {
    type NeighborsDirected = <BTreeSet<StmtIndex> as IntoIterator>::IntoIter;

    fn neighbors_directed(self, n: StmtIndex, d: Direction) -> Self::NeighborsDirected {
        let adjacency = match d {
            Direction::Outgoing => &self.successors,
            Direction::Incoming => &self.predecessors,
        };
        adjacency.get(&n).cloned().unwrap_or_default().into_iter()
    }
}

impl NodeIndexable for ControlFlowGraph<'_> {
    fn node_bound(&self) -> usize {
        self.successors.len()
    }

    fn to_index(&self, ix: StmtIndex) -> usize {
        usize::from(ix)
    }

    fn from_index(&self, ix: usize) -> StmtIndex {
        u16::try_from(ix).expect("Index is out of u16").into()
    }
}

impl NodeCount for ControlFlowGraph<'_> {
    fn node_count(&self) -> usize {
        self.successors.len()
    }
}

impl GraphProp for ControlFlowGraph<'_> {
    type EdgeType = Directed;
}

#[cfg(test)]
mod tests {
    use petgraph::{algo::has_path_connecting, dot::Dot, visit::Dfs};

    use super::*;
    use crate::ir::{Method, Var};

    fn method() -> Method {
        let x = Var::int("x");
        Method::new(
            "f",
            vec![x.clone()],
            vec![
                Stmt::If {
                    condition: x.clone().into(),
                    target: StmtIndex::from(2),
                },
                Stmt::assign(x.clone(), 1),
                Stmt::Return(Some(x)),
            ],
        )
    }

    #[test]
    fn traversal() {
        let method = method();
        let cfg = ControlFlowGraph::new(&method).unwrap();
        let mut dfs = Dfs::new(&cfg, StmtIndex::ZERO);
        let mut visited = BTreeSet::new();
        while let Some(node) = dfs.next(&cfg) {
            visited.insert(node);
        }
        assert_eq!(visited.len(), 3);
        assert!(has_path_connecting(
            &cfg,
            StmtIndex::ZERO,
            StmtIndex::from(2),
            None
        ));
        assert!(!has_path_connecting(
            &cfg,
            StmtIndex::from(2),
            StmtIndex::ZERO,
            None
        ));
    }

    #[test]
    fn to_dot() {
        let method = method();
        let cfg = ControlFlowGraph::new(&method).unwrap();
        let dot = format!("{}", Dot::new(&cfg));
        assert!(dot.contains("if x goto #00002"));
        assert!(dot.contains("<conditional>"));
    }
}
